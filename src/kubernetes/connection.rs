// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Per-cluster connections.
//!
//! A [`ClusterConnection`] is everything an operation needs from one cluster:
//! discovery, generic access to any resource type by locator, and typed access
//! to pods and events. [`KubeConnection`] is the live implementation backed by
//! a `kube::Client`; tests use the in-memory fixture instead.

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Event, Pod};
use kube::api::{ApiResource, DynamicObject, ListParams, LogParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Api, Client, Config};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, trace};

use super::discovery::{ResourceList, ResourceLocator, discover_preferred_resources};
use super::kubeconfig::KubeconfigSource;
use crate::error::Error;

/// Timeout for connecting to K8s API
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for reading K8s API responses
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters pushed down to list calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    /// Label selector string (e.g., "app=nginx,version=v1")
    pub label_selector: Option<String>,
    /// Field selector string (e.g., "status.phase=Running")
    pub field_selector: Option<String>,
    pub limit: Option<u32>,
    /// Server-side timeout for the list call
    pub timeout_secs: Option<u32>,
}

impl ListQuery {
    pub fn to_list_params(&self) -> ListParams {
        let mut params = ListParams::default();

        if let Some(ref label_sel) = self.label_selector {
            params = params.labels(label_sel);
        }
        if let Some(ref field_sel) = self.field_selector {
            params = params.fields(field_sel);
        }
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            params = params.limit(limit);
        }
        if let Some(timeout) = self.timeout_secs.filter(|t| *t > 0) {
            params = params.timeout(timeout);
        }

        trace!(
            label_selector = ?self.label_selector,
            field_selector = ?self.field_selector,
            limit = ?self.limit,
            "Built ListParams"
        );

        params
    }
}

/// Read access to one resource type on one cluster
#[async_trait]
pub trait ResourceHandle: Send + Sync {
    async fn list(&self, query: &ListQuery) -> Result<Vec<DynamicObject>>;
    async fn get(&self, name: &str) -> Result<DynamicObject>;
}

/// Capabilities of a connection to a single cluster
#[async_trait]
pub trait ClusterConnection: Send + Sync {
    /// Context name this connection was built for
    fn context(&self) -> &str;

    /// The server's preferred resources grouped by group/version
    async fn preferred_resources(&self) -> crate::Result<Vec<ResourceList>>;

    /// Generic handle for a resource type.
    ///
    /// Cluster-scoped resources, and namespaced ones with an empty namespace,
    /// get an all-namespaces handle.
    fn resource(
        &self,
        locator: &ResourceLocator,
        namespaced: bool,
        namespace: &str,
    ) -> crate::Result<Box<dyn ResourceHandle>>;

    async fn pod(&self, namespace: &str, name: &str) -> Result<Pod>;

    async fn pod_logs(&self, namespace: &str, name: &str, params: &LogParams) -> Result<String>;

    /// Events in a namespace, or in all namespaces for `None`
    async fn events(&self, namespace: Option<&str>, query: &ListQuery) -> Result<Vec<Event>>;
}

/// Builds connections for context names
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(&self, context: &str) -> Result<Arc<dyn ClusterConnection>>;
}

/// Tunables for live connections
#[derive(Debug, Clone)]
pub struct ConnectionOptions {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// Check the API server is reachable when a connection is built
    pub verify: bool,
    /// Use the pod's service account when running inside a cluster
    pub prefer_in_cluster: bool,
}

impl Default for ConnectionOptions {
    fn default() -> Self {
        Self {
            connect_timeout: CONNECT_TIMEOUT,
            read_timeout: READ_TIMEOUT,
            verify: true,
            prefer_in_cluster: false,
        }
    }
}

/// Connection factory backed by kubeconfig contexts
pub struct KubeConnectionFactory {
    source: Arc<dyn KubeconfigSource>,
    options: ConnectionOptions,
}

impl KubeConnectionFactory {
    pub fn new(source: Arc<dyn KubeconfigSource>, options: ConnectionOptions) -> Self {
        Self { source, options }
    }

    async fn build_config(&self, context: &str) -> Result<Config> {
        if self.options.prefer_in_cluster {
            match Config::incluster() {
                Ok(config) => {
                    debug!(context = %context, "Using in-cluster configuration");
                    return Ok(config);
                }
                Err(e) => {
                    debug!(context = %context, error = %e, "In-cluster configuration unavailable");
                }
            }
        }

        let kubeconfig: Kubeconfig = self.source.load()?;
        if !kubeconfig.contexts.iter().any(|c| c.name == context) {
            return Err(anyhow!("Context '{}' not found in kubeconfig", context));
        }

        Config::from_custom_kubeconfig(
            kubeconfig,
            &KubeConfigOptions {
                context: Some(context.to_string()),
                ..Default::default()
            },
        )
        .await
        .with_context(|| format!("Failed to load kubeconfig for context '{}'", context))
    }
}

#[async_trait]
impl ConnectionFactory for KubeConnectionFactory {
    async fn connect(&self, context: &str) -> Result<Arc<dyn ClusterConnection>> {
        let start = Instant::now();
        let mut config = self.build_config(context).await?;

        config.connect_timeout = Some(self.options.connect_timeout);
        config.read_timeout = Some(self.options.read_timeout);

        let client = Client::try_from(config)
            .with_context(|| format!("Failed to create client for context '{}'", context))?;

        if self.options.verify {
            let version = client
                .apiserver_version()
                .await
                .with_context(|| format!("Cluster for context '{}' is unreachable", context))?;
            debug!(context = %context, version = %version.git_version, "API server reachable");
        }

        info!(
            context = %context,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Connected to cluster"
        );

        Ok(Arc::new(KubeConnection::new(client, context)))
    }
}

/// Live connection to one cluster
#[derive(Clone)]
pub struct KubeConnection {
    client: Client,
    context: String,
}

impl KubeConnection {
    pub fn new(client: Client, context: impl Into<String>) -> Self {
        Self {
            client,
            context: context.into(),
        }
    }
}

#[async_trait]
impl ClusterConnection for KubeConnection {
    fn context(&self) -> &str {
        &self.context
    }

    async fn preferred_resources(&self) -> crate::Result<Vec<ResourceList>> {
        discover_preferred_resources(&self.client, &self.context).await
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

        let ar = ApiResource {
            group: locator.group.clone(),
            version: locator.version.clone(),
            api_version: locator.api_version(),
            kind: String::new(),
            plural: locator.plural.clone(),
        };

        let (api, scope): (Api<DynamicObject>, &str) = if namespaced && !namespace.is_empty() {
            (
                Api::namespaced_with(self.client.clone(), namespace, &ar),
                "namespaced",
            )
        } else if namespaced {
            (Api::all_with(self.client.clone(), &ar), "all-namespaces")
        } else {
            (Api::all_with(self.client.clone(), &ar), "cluster-scoped")
        };

        debug!(
            context = %self.context,
            api_version = %ar.api_version,
            resource = %ar.plural,
            scope = %scope,
            "Created resource handle"
        );

        Ok(Box::new(DynamicHandle { api }))
    }

    async fn pod(&self, namespace: &str, name: &str) -> Result<Pod> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        pods.get(name)
            .await
            .with_context(|| format!("failed to get pod {}/{}", namespace, name))
    }

    async fn pod_logs(&self, namespace: &str, name: &str, params: &LogParams) -> Result<String> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        pods.logs(name, params)
            .await
            .with_context(|| format!("failed to stream logs for pod {}/{}", namespace, name))
    }

    async fn events(&self, namespace: Option<&str>, query: &ListQuery) -> Result<Vec<Event>> {
        let events: Api<Event> = match namespace {
            Some(ns) => Api::namespaced(self.client.clone(), ns),
            None => Api::all(self.client.clone()),
        };
        let list = events
            .list(&query.to_list_params())
            .await
            .context("failed to list events")?;
        Ok(list.items)
    }
}

struct DynamicHandle {
    api: Api<DynamicObject>,
}

#[async_trait]
impl ResourceHandle for DynamicHandle {
    async fn list(&self, query: &ListQuery) -> Result<Vec<DynamicObject>> {
        let list = self
            .api
            .list(&query.to_list_params())
            .await
            .context("failed to list resources")?;
        Ok(list.items)
    }

    async fn get(&self, name: &str) -> Result<DynamicObject> {
        self.api
            .get(name)
            .await
            .with_context(|| format!("failed to get resource '{}'", name))
    }
}
