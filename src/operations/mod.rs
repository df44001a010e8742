// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Read-only inspection operations.
//!
//! Each operation picks a connection from the
//! [`ClusterRegistry`](crate::kubernetes::ClusterRegistry), resolves the
//! requested kind against that cluster's discovery data, and performs a
//! single get/list call.

mod contexts;
mod describe;
mod events;
mod list;
mod logs;

pub use contexts::{ContextInfo, ContextList, list_contexts};
pub use describe::{DescribeRequest, ResourceDescription, describe_resource};
pub use events::{EventInfo, EventList, EventsRequest, list_events};
pub use list::{
    DiscoveredType, GroupDiscovery, ListOutcome, ListRequest, ResourceSummary, list_resources,
};
pub use logs::{ContainerStatusInfo, LogsRequest, PodLogs, PodStatusInfo, pod_logs};

use anyhow::Result;

use crate::kubernetes::{ClusterConnection, ResolvedMatch, ResourceHandle};

/// Default server-side timeout for list calls
pub const DEFAULT_TIMEOUT_SECS: u32 = 30;

/// Generic handle for a resolved match
fn handle_for(
    connection: &dyn ClusterConnection,
    resolved: &ResolvedMatch,
    namespace: &str,
) -> Result<Box<dyn ResourceHandle>> {
    let locator = resolved
        .locator()
        .ok_or_else(|| crate::Error::InvalidLocator {
            kind: resolved.descriptor.kind.clone(),
        })?;
    Ok(connection.resource(&locator, resolved.namespaced, namespace)?)
}

/// Treat empty strings from the CLI or callers as absent
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
