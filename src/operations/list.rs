// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! List resources by kind, or discover the resource types of an API group.

use anyhow::{Context, Result, bail};
use kube::api::DynamicObject;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use super::{DEFAULT_TIMEOUT_SECS, handle_for, non_empty};
use crate::kubernetes::resolver::{
    is_all_kinds, resolve_by_group_substring, resolve_by_kind, resolve_kind_in_group,
};
use crate::kubernetes::{ClusterRegistry, ListQuery, ResolvedMatch};
use crate::validation;

#[derive(Debug, Clone, Default)]
pub struct ListRequest {
    /// Context name; empty or None for the default context
    pub context: Option<String>,
    /// Kind, plural or short name; "all" with a group filter lists types
    pub kind: Option<String>,
    /// API group substring (e.g., "fluxcd", "argoproj", "istio")
    pub group_filter: Option<String>,
    /// Namespace; empty for all namespaces
    pub namespace: Option<String>,
    pub label_selector: Option<String>,
    pub field_selector: Option<String>,
    pub limit: Option<u32>,
    pub timeout_secs: Option<u32>,
    /// Return complete objects instead of name/status summaries
    pub show_details: bool,
}

impl ListRequest {
    pub fn validate(&self) -> Result<()> {
        match non_empty(&self.kind) {
            Some(kind) => validation::validate_kind(kind).context("invalid kind")?,
            None if non_empty(&self.group_filter).is_none() => {
                bail!("kind must be provided when groupFilter is not specified")
            }
            None => {}
        }
        if let Some(ns) = non_empty(&self.namespace) {
            validation::validate_namespace(ns).context("invalid namespace")?;
        }
        if let Some(selector) = non_empty(&self.label_selector) {
            validation::validate_label_selector(selector).context("invalid labelSelector")?;
        }
        Ok(())
    }

    fn query(&self) -> ListQuery {
        ListQuery {
            label_selector: non_empty(&self.label_selector).map(String::from),
            field_selector: non_empty(&self.field_selector).map(String::from),
            limit: self.limit,
            timeout_secs: Some(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
        }
    }
}

/// A resource with only its status section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSummary {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
}

/// One resource type found by a group filter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredType {
    pub kind: String,
    /// The group/version string the type was advertised under
    pub group: String,
    pub resource: String,
    pub namespaced: bool,
    pub short_names: Vec<String>,
}

impl From<&ResolvedMatch> for DiscoveredType {
    fn from(m: &ResolvedMatch) -> Self {
        Self {
            kind: m.descriptor.kind.clone(),
            group: m.group_version.clone(),
            resource: m.descriptor.plural.clone(),
            namespaced: m.namespaced,
            short_names: m.descriptor.short_names.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupDiscovery {
    pub group_filter: String,
    pub discovered_types: Vec<DiscoveredType>,
    pub total_found: usize,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ListOutcome {
    Types(GroupDiscovery),
    Summaries(Vec<ResourceSummary>),
    Details(Vec<DynamicObject>),
}

/// List resources of a kind, optionally scoped to API groups matching a filter.
///
/// With a group filter and no kind (or "all"), returns the resource types in
/// the matching groups instead of objects.
pub async fn list_resources(
    registry: &ClusterRegistry,
    request: &ListRequest,
) -> Result<ListOutcome> {
    request.validate()?;

    let context = non_empty(&request.context).unwrap_or_default();
    let connection = registry.connection(context).await?;
    let lists = connection.preferred_resources().await?;
    let kind = non_empty(&request.kind).unwrap_or_default();

    let resolved = match non_empty(&request.group_filter) {
        Some(filter) if is_all_kinds(kind) => {
            let matches = resolve_by_group_substring(&lists, filter);
            return Ok(ListOutcome::Types(group_discovery(filter, &matches)));
        }
        Some(filter) => resolve_kind_in_group(&lists, filter, kind)?,
        None => resolve_by_kind(&lists, kind)?,
    };

    debug!(
        context = %connection.context(),
        kind = %kind,
        group_version = %resolved.group_version,
        resource = %resolved.descriptor.plural,
        "Resolved kind"
    );

    let namespace = non_empty(&request.namespace).unwrap_or_default();
    let handle = handle_for(connection.as_ref(), &resolved, namespace)?;
    let items = handle.list(&request.query()).await?;

    if request.show_details {
        return Ok(ListOutcome::Details(items));
    }

    Ok(ListOutcome::Summaries(
        items
            .iter()
            .map(|item| summarize(item, &resolved.descriptor.kind))
            .collect(),
    ))
}

fn group_discovery(filter: &str, matches: &[ResolvedMatch]) -> GroupDiscovery {
    let message = if matches.is_empty() {
        format!("No resources found for group filter '{}'", filter)
    } else {
        format!(
            "Found {} resource types matching group filter '{}'",
            matches.len(),
            filter
        )
    };
    GroupDiscovery {
        group_filter: filter.to_string(),
        discovered_types: matches.iter().map(DiscoveredType::from).collect(),
        total_found: matches.len(),
        message,
    }
}

/// List items usually lack `kind`; fall back to the resolved kind
fn summarize(item: &DynamicObject, fallback_kind: &str) -> ResourceSummary {
    let kind = item
        .types
        .as_ref()
        .map(|t| t.kind.clone())
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| fallback_kind.to_string());

    ResourceSummary {
        name: item.metadata.name.clone().unwrap_or_default(),
        namespace: item.metadata.namespace.clone().unwrap_or_default(),
        kind,
        status: item.data.get("status").filter(|s| s.is_object()).cloned(),
    }
}
