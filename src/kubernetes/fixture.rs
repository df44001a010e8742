// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! In-memory cluster doubles for tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Event, Pod};
use kube::api::{DynamicObject, LogParams};
use kube::config::Kubeconfig;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::connection::{ClusterConnection, ConnectionFactory, ListQuery, ResourceHandle};
use super::discovery::{ResourceDescriptor, ResourceList, ResourceLocator, split_group_version};
use super::kubeconfig::KubeconfigSource;
use crate::error::Error;

/// Kubeconfig held in memory; contexts can be changed between loads
pub struct MemoryKubeconfig {
    kubeconfig: Mutex<Kubeconfig>,
}

impl MemoryKubeconfig {
    pub fn new(contexts: &[&str], current: Option<&str>) -> Self {
        Self {
            kubeconfig: Mutex::new(kubeconfig(contexts, current)),
        }
    }

    pub fn set_contexts(&self, contexts: &[&str]) {
        let mut guard = self.kubeconfig.lock().unwrap();
        let current = guard.current_context.clone();
        *guard = kubeconfig(contexts, current.as_deref());
    }
}

impl KubeconfigSource for MemoryKubeconfig {
    fn load(&self) -> Result<Kubeconfig> {
        Ok(self.kubeconfig.lock().unwrap().clone())
    }
}

fn kubeconfig(contexts: &[&str], current: Option<&str>) -> Kubeconfig {
    let mut yaml = String::from("apiVersion: v1\nkind: Config\n");
    if let Some(current) = current {
        yaml.push_str(&format!("current-context: {}\n", current));
    }
    if contexts.is_empty() {
        yaml.push_str("contexts: []\n");
    } else {
        yaml.push_str("contexts:\n");
    }
    for name in contexts {
        yaml.push_str(&format!(
            "- name: {name}\n  context:\n    cluster: {name}\n    user: admin\n"
        ));
    }
    Kubeconfig::from_yaml(&yaml).unwrap()
}

/// Build a descriptor for a "group/version" or bare core version
pub fn descriptor(
    group_version: &str,
    plural: &str,
    kind: &str,
    short_names: &[&str],
    namespaced: bool,
) -> ResourceDescriptor {
    let (group, version) = split_group_version(group_version);
    ResourceDescriptor {
        group: group.to_string(),
        version: version.to_string(),
        plural: plural.to_string(),
        kind: kind.to_string(),
        short_names: short_names.iter().map(|s| s.to_string()).collect(),
        namespaced,
    }
}

/// Build a dynamic object from JSON
pub fn object(value: serde_json::Value) -> DynamicObject {
    serde_json::from_value(value).unwrap()
}

/// A cluster that lives in memory
#[derive(Default, Clone)]
pub struct FixtureConnection {
    pub context: String,
    pub resources: Vec<ResourceList>,
    /// Objects keyed by plural resource name
    pub objects: HashMap<String, Vec<DynamicObject>>,
    pub pods: Vec<Pod>,
    /// Logs keyed by (pod name, previous)
    pub logs: HashMap<(String, bool), String>,
    pub events: Vec<Event>,
    pub fail_discovery: bool,
}

impl FixtureConnection {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
            ..Default::default()
        }
    }

    /// Core pods/services plus apps deployments
    pub fn with_builtin_resources(mut self) -> Self {
        self.resources = vec![
            ResourceList::new(
                "v1",
                vec![
                    descriptor("v1", "pods", "Pod", &["po"], true),
                    descriptor("v1", "services", "Service", &["svc"], true),
                    descriptor("v1", "namespaces", "Namespace", &["ns"], false),
                ],
            ),
            ResourceList::new(
                "apps/v1",
                vec![descriptor(
                    "apps/v1",
                    "deployments",
                    "Deployment",
                    &["deploy"],
                    true,
                )],
            ),
        ];
        self
    }

    pub fn with_list(mut self, list: ResourceList) -> Self {
        self.resources.push(list);
        self
    }

    pub fn with_objects(mut self, plural: &str, objects: Vec<DynamicObject>) -> Self {
        self.objects.insert(plural.to_string(), objects);
        self
    }
}

#[async_trait]
impl ClusterConnection for FixtureConnection {
    fn context(&self) -> &str {
        &self.context
    }

    async fn preferred_resources(&self) -> crate::Result<Vec<ResourceList>> {
        if self.fail_discovery {
            return Err(Error::Discovery {
                context: self.context.clone(),
                message: "the server is currently unable to handle the request".to_string(),
            });
        }
        Ok(self.resources.clone())
    }

    fn resource(
        &self,
        locator: &ResourceLocator,
        namespaced: bool,
        namespace: &str,
    ) -> crate::Result<Box<dyn ResourceHandle>> {
        if !locator.is_valid() {
            return Err(Error::InvalidLocator {
                kind: locator.plural.clone(),
            });
        }
        let objects = self
            .objects
            .get(&locator.plural)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|o| {
                !namespaced
                    || namespace.is_empty()
                    || o.metadata.namespace.as_deref() == Some(namespace)
            })
            .collect();
        Ok(Box::new(FixtureHandle { objects }))
    }

    async fn pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        self.pods
            .iter()
            .find(|p| {
                p.metadata.name.as_deref() == Some(name)
                    && p.metadata.namespace.as_deref() == Some(namespace)
            })
            .cloned()
            .ok_or_else(|| anyhow!("pods \"{}\" not found", name))
    }

    async fn pod_logs(&self, _namespace: &str, name: &str, params: &LogParams) -> Result<String> {
        let logs = self
            .logs
            .get(&(name.to_string(), params.previous))
            .ok_or_else(|| anyhow!("container is waiting to start"))?;
        Ok(match params.tail_lines {
            Some(tail) => {
                let lines: Vec<&str> = logs.lines().collect();
                let skip = lines.len().saturating_sub(tail as usize);
                lines[skip..].join("\n")
            }
            None => logs.clone(),
        })
    }

    async fn events(&self, namespace: Option<&str>, query: &ListQuery) -> Result<Vec<Event>> {
        let object = query
            .field_selector
            .as_deref()
            .and_then(|s| s.strip_prefix("involvedObject.name="));
        let mut events: Vec<Event> = self
            .events
            .iter()
            .filter(|e| namespace.is_none() || e.metadata.namespace.as_deref() == namespace)
            .filter(|e| object.is_none() || e.involved_object.name.as_deref() == object)
            .cloned()
            .collect();
        if let Some(limit) = query.limit.filter(|l| *l > 0) {
            events.truncate(limit as usize);
        }
        Ok(events)
    }
}

struct FixtureHandle {
    objects: Vec<DynamicObject>,
}

#[async_trait]
impl ResourceHandle for FixtureHandle {
    async fn list(&self, query: &ListQuery) -> Result<Vec<DynamicObject>> {
        let name = query
            .field_selector
            .as_deref()
            .and_then(|s| s.strip_prefix("metadata.name="));
        let mut items: Vec<DynamicObject> = self
            .objects
            .iter()
            .filter(|o| name.is_none() || o.metadata.name.as_deref() == name)
            .cloned()
            .collect();
        if let Some(limit) = query.limit.filter(|l| *l > 0) {
            items.truncate(limit as usize);
        }
        Ok(items)
    }

    async fn get(&self, name: &str) -> Result<DynamicObject> {
        self.objects
            .iter()
            .find(|o| o.metadata.name.as_deref() == Some(name))
            .cloned()
            .ok_or_else(|| anyhow!("\"{}\" not found", name))
    }
}

/// Factory handing out prepared fixture connections and counting builds
#[derive(Default)]
pub struct FixtureFactory {
    connections: Mutex<HashMap<String, FixtureConnection>>,
    builds: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
}

impl FixtureFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep during construction to widen race windows
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail the next `n` constructions
    pub fn failing(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    pub fn with_connection(self, connection: FixtureConnection) -> Self {
        self.connections
            .lock()
            .unwrap()
            .insert(connection.context.clone(), connection);
        self
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ConnectionFactory for FixtureFactory {
    async fn connect(&self, context: &str) -> Result<Arc<dyn ClusterConnection>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(anyhow!("dial tcp 10.0.0.1:6443: connection refused"));
        }
        // Every build returns a fresh object, so identity shows caching
        let prepared = self.connections.lock().unwrap().get(context).cloned();
        let connection = prepared
            .unwrap_or_else(|| FixtureConnection::new(context).with_builtin_resources());
        Ok(Arc::new(connection))
    }
}
