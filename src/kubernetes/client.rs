// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Registry of connections to multiple Kubernetes clusters.
//!
//! Connections are built lazily, one per context name, and cached for the
//! life of the process. Cache hits only take the read lock. Misses take the
//! write lock, re-check, and build under it, so concurrent first calls for a
//! context produce exactly one connection. This also serializes first-time
//! connections to different contexts, which is acceptable because there are
//! only as many builds as configured contexts.
//!
//! Failed builds are not cached; the next call for the context retries.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::connection::{
    ClusterConnection, ConnectionFactory, ConnectionOptions, KubeConnectionFactory,
};
use super::kubeconfig::{KubeconfigFile, KubeconfigSource, context_names, default_context_name};
use crate::config::Config;
use crate::error::{Error, Result};

/// Connection cache for multiple clusters, keyed by context name
pub struct ClusterRegistry {
    source: Arc<dyn KubeconfigSource>,
    factory: Arc<dyn ConnectionFactory>,
    default_context: String,
    connections: RwLock<HashMap<String, Arc<dyn ClusterConnection>>>,
}

impl ClusterRegistry {
    /// Create a registry without connecting (no network I/O).
    ///
    /// The default context is the kubeconfig's current context, or any
    /// configured context when none is selected.
    pub fn new(
        source: Arc<dyn KubeconfigSource>,
        factory: Arc<dyn ConnectionFactory>,
    ) -> Result<Self> {
        let kubeconfig = source
            .load()
            .map_err(|e| Error::Configuration(format!("{:#}", e)))?;

        let default_context = default_context_name(&kubeconfig)
            .ok_or_else(|| Error::Configuration("no contexts found in kubeconfig".to_string()))?;

        debug!(default_context = %default_context, "Created cluster registry");

        Ok(Self {
            source,
            factory,
            default_context,
            connections: RwLock::new(HashMap::new()),
        })
    }

    /// Registry reading the kubeconfig chosen by the tool configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let source: Arc<dyn KubeconfigSource> =
            Arc::new(KubeconfigFile::new(config.kubeconfig.clone()));
        let options: ConnectionOptions = config.connection_options();
        let factory = Arc::new(KubeConnectionFactory::new(Arc::clone(&source), options));
        Self::new(source, factory)
    }

    /// Get or create the connection for a context; empty means the default
    pub async fn connection(&self, context: &str) -> Result<Arc<dyn ClusterConnection>> {
        let context = if context.is_empty() {
            self.default_context.as_str()
        } else {
            context
        };

        {
            let connections = self.connections.read().await;
            if let Some(connection) = connections.get(context) {
                debug!(context = %context, "Using cached connection");
                return Ok(Arc::clone(connection));
            }
        }

        let mut connections = self.connections.write().await;

        // Another caller may have built it while we waited for the write lock
        if let Some(connection) = connections.get(context) {
            return Ok(Arc::clone(connection));
        }

        let start = Instant::now();
        let connection = self.factory.connect(context).await.map_err(|e| {
            warn!(context = %context, error = %format!("{:#}", e), "Failed to connect");
            Error::Connection {
                context: context.to_string(),
                message: format!("{:#}", e),
            }
        })?;

        info!(
            context = %context,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Cached new connection"
        );

        connections.insert(context.to_string(), Arc::clone(&connection));
        Ok(connection)
    }

    /// All context names in the kubeconfig, re-read on every call
    pub fn list_contexts(&self) -> Result<Vec<String>> {
        let kubeconfig = self
            .source
            .load()
            .map_err(|e| Error::Configuration(format!("{:#}", e)))?;
        Ok(context_names(&kubeconfig))
    }

    /// The default context fixed at construction
    pub fn default_context(&self) -> &str {
        &self.default_context
    }

    /// Context names with a cached connection, sorted
    pub async fn cached_contexts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.connections.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}
