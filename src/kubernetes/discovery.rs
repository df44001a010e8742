// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Resource discovery for Kubernetes clusters.
//!
//! Lists the server's preferred resources (including CRDs) at runtime using
//! the raw `/api` and `/apis` discovery endpoints. These are used instead of
//! `kube::discovery::Discovery` because only the raw listings carry the
//! `shortNames` aliases ("po", "deploy", "hr") that kind resolution needs.

use futures::future::join_all;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{APIResource, APIResourceList};
use kube::Client;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// One API resource kind advertised by a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceDescriptor {
    /// API group (empty string for core v1)
    pub group: String,
    pub version: String,
    /// Plural resource name, used as the URL path segment
    pub plural: String,
    /// PascalCase type name
    pub kind: String,
    pub short_names: Vec<String>,
    pub namespaced: bool,
}

impl ResourceDescriptor {
    /// Build a descriptor from a raw discovery entry and its list's group/version
    pub fn from_api_resource(group_version: &str, resource: &APIResource) -> Self {
        let (group, version) = split_group_version(group_version);
        Self {
            group: group.to_string(),
            version: version.to_string(),
            plural: resource.name.clone(),
            kind: resource.kind.clone(),
            short_names: resource.short_names.clone().unwrap_or_default(),
            namespaced: resource.namespaced,
        }
    }

    /// Case-insensitive match against plural name, kind or any short name
    pub fn matches(&self, token: &str) -> bool {
        self.plural.eq_ignore_ascii_case(token)
            || self.kind.eq_ignore_ascii_case(token)
            || self.short_names.iter().any(|s| s.eq_ignore_ascii_case(token))
    }
}

/// Descriptors the server advertises for one group/version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceList {
    /// "v1" for the core group, "group/version" otherwise
    pub group_version: String,
    pub resources: Vec<ResourceDescriptor>,
}

impl ResourceList {
    pub fn new(group_version: impl Into<String>, resources: Vec<ResourceDescriptor>) -> Self {
        Self {
            group_version: group_version.into(),
            resources,
        }
    }

    /// Convert a raw discovery list, dropping subresources such as `pods/log`
    pub fn from_api_resource_list(list: &APIResourceList) -> Self {
        let resources = list
            .resources
            .iter()
            .filter(|r| !r.name.contains('/'))
            .map(|r| ResourceDescriptor::from_api_resource(&list.group_version, r))
            .collect();
        Self::new(list.group_version.clone(), resources)
    }
}

/// Fully qualified address of a resource type: (group, version, plural)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceLocator {
    pub group: String,
    pub version: String,
    pub plural: String,
}

impl ResourceLocator {
    /// A locator without version or plural must not be used to build a handle
    pub fn is_valid(&self) -> bool {
        !self.version.is_empty() && !self.plural.is_empty()
    }

    /// The apiVersion string (e.g., "v1", "apps/v1", "cert-manager.io/v1")
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

/// A descriptor selected by the resolver, with the group/version it came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMatch {
    pub descriptor: ResourceDescriptor,
    pub group_version: String,
    pub namespaced: bool,
}

impl ResolvedMatch {
    pub fn new(descriptor: &ResourceDescriptor, group_version: &str) -> Self {
        Self {
            namespaced: descriptor.namespaced,
            descriptor: descriptor.clone(),
            group_version: group_version.to_string(),
        }
    }

    /// Locator for this match, or None when it cannot address a resource
    pub fn locator(&self) -> Option<ResourceLocator> {
        if self.group_version.is_empty() {
            return None;
        }
        let (group, version) = split_group_version(&self.group_version);
        let locator = ResourceLocator {
            group: group.to_string(),
            version: version.to_string(),
            plural: self.descriptor.plural.clone(),
        };
        locator.is_valid().then_some(locator)
    }
}

/// Split "group/version" into its parts; a bare string is a core-group version
pub fn split_group_version(group_version: &str) -> (&str, &str) {
    match group_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", group_version),
    }
}

/// List the server's preferred resources, core group first, then API groups
/// in the order the server returns them.
///
/// Failing to list the groups is a `Discovery` error. A single group version
/// that fails to list (typically an unavailable aggregated API) is skipped.
pub async fn discover_preferred_resources(
    client: &Client,
    context: &str,
) -> Result<Vec<ResourceList>> {
    let discovery_error = |e: kube::Error| Error::Discovery {
        context: context.to_string(),
        message: e.to_string(),
    };

    let mut lists = Vec::new();

    let core_versions = client
        .list_core_api_versions()
        .await
        .map_err(discovery_error)?;
    if let Some(version) = core_versions.versions.first() {
        let core = client
            .list_core_api_resources(version)
            .await
            .map_err(discovery_error)?;
        lists.push(ResourceList::from_api_resource_list(&core));
    }

    let groups = client.list_api_groups().await.map_err(discovery_error)?;
    let preferred: Vec<String> = groups
        .groups
        .iter()
        .filter_map(|g| {
            g.preferred_version
                .as_ref()
                .or_else(|| g.versions.first())
                .map(|v| v.group_version.clone())
        })
        .collect();

    // Fetch groups in parallel; join_all keeps the server's order
    let results = join_all(
        preferred
            .iter()
            .map(|gv| async move { (gv, client.list_api_group_resources(gv).await) }),
    )
    .await;

    for (group_version, result) in results {
        match result {
            Ok(list) => lists.push(ResourceList::from_api_resource_list(&list)),
            Err(e) => {
                warn!(
                    context = %context,
                    group_version = %group_version,
                    error = %e,
                    "Skipping API group that failed discovery"
                );
            }
        }
    }

    debug!(
        context = %context,
        lists = lists.len(),
        resources = lists.iter().map(|l| l.resources.len()).sum::<usize>(),
        "Discovered preferred resources"
    );

    Ok(lists)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api_resource(name: &str, kind: &str, namespaced: bool, short: &[&str]) -> APIResource {
        APIResource {
            name: name.to_string(),
            kind: kind.to_string(),
            namespaced,
            short_names: if short.is_empty() {
                None
            } else {
                Some(short.iter().map(|s| s.to_string()).collect())
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_split_group_version() {
        assert_eq!(split_group_version("v1"), ("", "v1"));
        assert_eq!(split_group_version("apps/v1"), ("apps", "v1"));
        assert_eq!(
            split_group_version("helm.toolkit.fluxcd.io/v2"),
            ("helm.toolkit.fluxcd.io", "v2")
        );
    }

    #[test]
    fn test_descriptor_from_api_resource() {
        let ar = api_resource("deployments", "Deployment", true, &["deploy"]);
        let d = ResourceDescriptor::from_api_resource("apps/v1", &ar);
        assert_eq!(d.group, "apps");
        assert_eq!(d.version, "v1");
        assert_eq!(d.plural, "deployments");
        assert_eq!(d.short_names, vec!["deploy"]);
        assert!(d.namespaced);
    }

    #[test]
    fn test_descriptor_matches_case_insensitive() {
        let ar = api_resource("pods", "Pod", true, &["po"]);
        let d = ResourceDescriptor::from_api_resource("v1", &ar);
        assert!(d.matches("pods"));
        assert!(d.matches("POD"));
        assert!(d.matches("Po"));
        assert!(!d.matches("p"));
    }

    #[test]
    fn test_list_drops_subresources() {
        let list = APIResourceList {
            group_version: "v1".to_string(),
            resources: vec![
                api_resource("pods", "Pod", true, &["po"]),
                api_resource("pods/log", "Pod", true, &[]),
                api_resource("pods/exec", "PodExecOptions", true, &[]),
                api_resource("nodes", "Node", false, &["no"]),
            ],
        };
        let converted = ResourceList::from_api_resource_list(&list);
        let names: Vec<_> = converted
            .resources
            .iter()
            .map(|r| r.plural.as_str())
            .collect();
        assert_eq!(names, vec!["pods", "nodes"]);
    }

    #[test]
    fn test_match_locator_core_and_group() {
        let pods =
            ResourceDescriptor::from_api_resource("v1", &api_resource("pods", "Pod", true, &[]));
        let locator = ResolvedMatch::new(&pods, "v1").locator().unwrap();
        assert_eq!(locator.group, "");
        assert_eq!(locator.version, "v1");
        assert_eq!(locator.plural, "pods");
        assert_eq!(locator.api_version(), "v1");

        let deploy = ResourceDescriptor::from_api_resource(
            "apps/v1",
            &api_resource("deployments", "Deployment", true, &[]),
        );
        let locator = ResolvedMatch::new(&deploy, "apps/v1").locator().unwrap();
        assert_eq!(locator.api_version(), "apps/v1");
    }

    #[test]
    fn test_match_locator_invalid() {
        let pods =
            ResourceDescriptor::from_api_resource("v1", &api_resource("pods", "Pod", true, &[]));
        assert!(ResolvedMatch::new(&pods, "").locator().is_none());

        let nameless =
            ResourceDescriptor::from_api_resource("v1", &api_resource("", "Ghost", true, &[]));
        assert!(ResolvedMatch::new(&nameless, "v1").locator().is_none());

        // "group/" has a group but no version
        assert!(ResolvedMatch::new(&pods, "apps/").locator().is_none());
    }
}
