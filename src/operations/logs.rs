// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Pod log retrieval with container state reporting.

use anyhow::{Context, Result, bail};
use k8s_openapi::api::core::v1::{ContainerStatus, Pod};
use kube::api::LogParams;
use serde::Serialize;
use tracing::{debug, warn};

use super::non_empty;
use crate::kubernetes::ClusterRegistry;
use crate::validation;

pub const DEFAULT_TAIL_LINES: i64 = 100;
const DEFAULT_NAMESPACE: &str = "default";

#[derive(Debug, Clone, Default)]
pub struct LogsRequest {
    pub context: Option<String>,
    pub name: String,
    /// Defaults to "default"
    pub namespace: Option<String>,
    pub container: Option<String>,
    /// Lines from the end; None means 100, Some(0) means all
    pub tail: Option<i64>,
    /// Relative duration such as "5m" or "1h"
    pub since: Option<String>,
    /// RFC3339 timestamp; takes precedence over `since`
    pub since_time: Option<String>,
    pub timestamps: bool,
    pub previous: bool,
}

impl LogsRequest {
    pub fn validate(&self) -> Result<()> {
        validation::validate_resource_name(&self.name).context("invalid pod name")?;
        if let Some(ns) = non_empty(&self.namespace) {
            validation::validate_namespace(ns).context("invalid namespace")?;
        }
        self.log_params()?;
        Ok(())
    }

    fn namespace(&self) -> &str {
        non_empty(&self.namespace).unwrap_or(DEFAULT_NAMESPACE)
    }

    fn log_params(&self) -> Result<LogParams> {
        let mut params = LogParams {
            container: non_empty(&self.container).map(String::from),
            timestamps: self.timestamps,
            previous: self.previous,
            ..Default::default()
        };

        match self.tail.unwrap_or(DEFAULT_TAIL_LINES) {
            0 => {}
            n if n < 0 => bail!("tail must not be negative"),
            n => params.tail_lines = Some(n),
        }

        if let Some(since_time) = non_empty(&self.since_time) {
            params.since_time = Some(validation::parse_rfc3339(since_time)?);
        } else if let Some(since) = non_empty(&self.since) {
            let duration = validation::parse_duration(since)?;
            if !duration.is_zero() {
                let seconds = i64::try_from(duration.as_secs().max(1))
                    .with_context(|| format!("since '{}' is too large", since))?;
                params.since_seconds = Some(seconds);
            }
        }

        Ok(params)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PodStatusInfo {
    pub phase: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerStatusInfo {
    pub name: String,
    pub ready: bool,
    pub restart_count: i32,
    /// One of waiting, running, terminated or unknown
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
}

impl From<&ContainerStatus> for ContainerStatusInfo {
    fn from(status: &ContainerStatus) -> Self {
        let mut info = ContainerStatusInfo {
            name: status.name.clone(),
            ready: status.ready,
            restart_count: status.restart_count,
            state: "unknown".to_string(),
            ..Default::default()
        };

        let Some(state) = &status.state else {
            return info;
        };
        if let Some(waiting) = &state.waiting {
            info.state = "waiting".to_string();
            info.reason = waiting.reason.clone();
            info.message = waiting.message.clone();
        } else if let Some(running) = &state.running {
            info.state = "running".to_string();
            info.started_at = running.started_at.as_ref().map(|t| t.0.to_rfc3339());
        } else if let Some(terminated) = &state.terminated {
            info.state = "terminated".to_string();
            info.reason = terminated.reason.clone();
            info.message = terminated.message.clone();
            info.exit_code = Some(terminated.exit_code);
            info.started_at = terminated.started_at.as_ref().map(|t| t.0.to_rfc3339());
        }
        info
    }
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodLogs {
    pub pod_status: PodStatusInfo,
    pub container_statuses: Vec<ContainerStatusInfo>,
    pub logs: String,
    /// "current" or "previous"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn describe_pod(pod: &Pod) -> (PodStatusInfo, Vec<ContainerStatusInfo>) {
    let Some(status) = &pod.status else {
        return (PodStatusInfo::default(), Vec::new());
    };
    let info = PodStatusInfo {
        phase: status.phase.clone().unwrap_or_default(),
        reason: status.reason.clone().unwrap_or_default(),
        message: status.message.clone().unwrap_or_default(),
    };
    let containers = status
        .container_statuses
        .iter()
        .flatten()
        .map(ContainerStatusInfo::from)
        .collect();
    (info, containers)
}

/// Fetch pod logs.
///
/// Log retrieval failures are reported in [`PodLogs::error`]; only a missing
/// pod or an unreachable cluster fails the call.
pub async fn pod_logs(registry: &ClusterRegistry, request: &LogsRequest) -> Result<PodLogs> {
    request.validate()?;
    let params = request.log_params()?;
    let namespace = request.namespace();

    let connection = registry
        .connection(non_empty(&request.context).unwrap_or_default())
        .await?;
    let pod = connection
        .pod(namespace, &request.name)
        .await
        .with_context(|| format!("failed to get pod '{}/{}'", namespace, request.name))?;

    let (pod_status, container_statuses) = describe_pod(&pod);
    let mut result = PodLogs {
        pod_status,
        container_statuses,
        ..Default::default()
    };

    let source = if request.previous { "previous" } else { "current" };
    match connection.pod_logs(namespace, &request.name, &params).await {
        Ok(logs) => {
            result.logs = logs;
            result.source = Some(source.to_string());
        }
        Err(e) if !request.previous => {
            debug!(pod = %request.name, error = %e, "Current logs unavailable, trying previous");
            let retry = LogParams {
                previous: true,
                ..params
            };
            match connection.pod_logs(namespace, &request.name, &retry).await {
                Ok(logs) => {
                    result.logs = logs;
                    result.source = Some("previous".to_string());
                }
                Err(prev) => {
                    warn!(pod = %request.name, error = %prev, "Failed to get logs");
                    result.error = Some(format!(
                        "failed to get logs: {:#} (previous container: {:#})",
                        e, prev
                    ));
                }
            }
        }
        Err(e) => {
            warn!(pod = %request.name, error = %e, "Failed to get previous logs");
            result.error = Some(format!("failed to get logs: {:#}", e));
        }
    }

    Ok(result)
}
