// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use anyhow::{Context, Result, bail};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{OwnerReference, Time};
use kube::api::DynamicObject;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::debug;

use super::{handle_for, non_empty};
use crate::kubernetes::resolver::resolve_by_kind;
use crate::kubernetes::{ClusterRegistry, ListQuery};
use crate::validation;

#[derive(Debug, Clone, Default)]
pub struct DescribeRequest {
    pub context: Option<String>,
    pub kind: String,
    pub name: String,
    /// Searched across all namespaces when empty and the kind is namespaced
    pub namespace: Option<String>,
}

impl DescribeRequest {
    pub fn validate(&self) -> Result<()> {
        validation::validate_kind(&self.kind).context("invalid kind")?;
        validation::validate_resource_name(&self.name).context("invalid name")?;
        if let Some(ns) = non_empty(&self.namespace) {
            validation::validate_namespace(ns).context("invalid namespace")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescription {
    pub name: String,
    pub namespace: String,
    pub kind: String,
    pub labels: BTreeMap<String, String>,
    pub annotations: BTreeMap<String, String>,
    pub creation_timestamp: Option<Time>,
    pub resource_version: String,
    pub uid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub owner_references: Vec<OwnerReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub finalizers: Vec<String>,
}

impl ResourceDescription {
    fn from_object(object: DynamicObject, fallback_kind: &str) -> Self {
        let kind = object
            .types
            .map(|t| t.kind)
            .filter(|k| !k.is_empty())
            .unwrap_or_else(|| fallback_kind.to_string());
        let meta = object.metadata;
        let section = |key: &str| object.data.get(key).filter(|v| !v.is_null()).cloned();

        Self {
            name: meta.name.unwrap_or_default(),
            namespace: meta.namespace.unwrap_or_default(),
            kind,
            labels: meta.labels.unwrap_or_default(),
            annotations: meta.annotations.unwrap_or_default(),
            creation_timestamp: meta.creation_timestamp,
            resource_version: meta.resource_version.unwrap_or_default(),
            uid: meta.uid.unwrap_or_default(),
            spec: section("spec"),
            status: section("status"),
            owner_references: meta.owner_references.unwrap_or_default(),
            finalizers: meta.finalizers.unwrap_or_default(),
        }
    }
}

/// Fetch one resource by kind and name.
pub async fn describe_resource(
    registry: &ClusterRegistry,
    request: &DescribeRequest,
) -> Result<ResourceDescription> {
    request.validate()?;

    let connection = registry
        .connection(non_empty(&request.context).unwrap_or_default())
        .await?;
    let lists = connection.preferred_resources().await?;
    let resolved = resolve_by_kind(&lists, &request.kind)?;
    let namespace = non_empty(&request.namespace).unwrap_or_default();

    debug!(
        context = %connection.context(),
        kind = %resolved.descriptor.kind,
        name = %request.name,
        namespace = %namespace,
        "Describing resource"
    );

    let object = if resolved.namespaced && namespace.is_empty() {
        // Name lookup across every namespace
        let handle = handle_for(connection.as_ref(), &resolved, "")?;
        let query = ListQuery {
            field_selector: Some(format!("metadata.name={}", request.name)),
            ..Default::default()
        };
        let mut found = handle.list(&query).await?;
        match found.len() {
            0 => bail!(
                "{} '{}' not found in any namespace",
                resolved.descriptor.kind,
                request.name
            ),
            1 => found.remove(0),
            _ => {
                let namespaces: Vec<String> = found
                    .iter()
                    .filter_map(|o| o.metadata.namespace.clone())
                    .collect();
                bail!(
                    "{} '{}' exists in multiple namespaces ({}); specify a namespace",
                    resolved.descriptor.kind,
                    request.name,
                    namespaces.join(", ")
                )
            }
        }
    } else {
        let handle = handle_for(connection.as_ref(), &resolved, namespace)?;
        handle.get(&request.name).await.with_context(|| {
            format!("failed to get {} '{}'", resolved.descriptor.kind, request.name)
        })?
    };

    Ok(ResourceDescription::from_object(object, &resolved.descriptor.kind))
}
