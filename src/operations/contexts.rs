// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use anyhow::Result;
use serde::Serialize;
use tracing::debug;

use crate::kubernetes::ClusterRegistry;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextInfo {
    pub name: String,
    pub is_current: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContextList {
    pub contexts: Vec<ContextInfo>,
    pub current_context: String,
    pub total: usize,
}

/// Contexts from the kubeconfig, marking the registry's default
pub async fn list_contexts(registry: &ClusterRegistry) -> Result<ContextList> {
    let current = registry.default_context();
    let contexts: Vec<ContextInfo> = registry
        .list_contexts()?
        .into_iter()
        .map(|name| ContextInfo {
            is_current: name == current,
            name,
        })
        .collect();

    debug!(
        total = contexts.len(),
        connected = ?registry.cached_contexts().await,
        "Listed contexts"
    );

    Ok(ContextList {
        total: contexts.len(),
        contexts,
        current_context: current.to_string(),
    })
}
