// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Kubernetes event listing with client-side filtering.

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Event;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

use super::{DEFAULT_TIMEOUT_SECS, non_empty};
use crate::kubernetes::{ClusterRegistry, ListQuery};
use crate::validation;

pub const DEFAULT_EVENT_LIMIT: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct EventsRequest {
    pub context: Option<String>,
    /// Empty for all namespaces
    pub namespace: Option<String>,
    /// Name of the involved object
    pub object: Option<String>,
    /// Normal or Warning
    pub event_type: Option<String>,
    /// Case-insensitive substring of the reason
    pub reason: Option<String>,
    pub since: Option<String>,
    pub since_time: Option<String>,
    /// None means 100, Some(0) means no limit
    pub limit: Option<u32>,
    pub timeout_secs: Option<u32>,
}

impl EventsRequest {
    pub fn validate(&self) -> Result<()> {
        if let Some(ns) = non_empty(&self.namespace) {
            validation::validate_namespace(ns).context("invalid namespace")?;
        }
        if let Some(object) = non_empty(&self.object) {
            validation::validate_resource_name(object).context("invalid object name")?;
        }
        if let Some(event_type) = non_empty(&self.event_type)
            && !event_type.eq_ignore_ascii_case("normal")
            && !event_type.eq_ignore_ascii_case("warning")
        {
            bail!("invalid event type '{}': must be Normal or Warning", event_type);
        }
        self.cutoff(Utc::now())?;
        Ok(())
    }

    /// Oldest lastTimestamp to keep; sinceTime overrides since
    fn cutoff(&self, now: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        if let Some(since_time) = non_empty(&self.since_time) {
            return Ok(Some(validation::parse_rfc3339(since_time)?));
        }
        if let Some(since) = non_empty(&self.since) {
            let duration = validation::parse_duration(since)?;
            let duration = chrono::Duration::from_std(duration)
                .context("duration out of range")?;
            let cutoff = now
                .checked_sub_signed(duration)
                .context("since is too far in the past")?;
            return Ok(Some(cutoff));
        }
        Ok(None)
    }

    fn query(&self) -> ListQuery {
        ListQuery {
            field_selector: non_empty(&self.object).map(|o| format!("involvedObject.name={}", o)),
            limit: Some(self.limit.unwrap_or(DEFAULT_EVENT_LIMIT)),
            timeout_secs: Some(self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)),
            ..Default::default()
        }
    }

    fn filters(&self) -> BTreeMap<String, String> {
        let mut filters = BTreeMap::new();
        let fields = [
            ("object", &self.object),
            ("type", &self.event_type),
            ("reason", &self.reason),
            ("since", &self.since),
            ("sinceTime", &self.since_time),
        ];
        for (key, value) in fields {
            if let Some(value) = non_empty(value) {
                filters.insert(key.to_string(), value.to_string());
            }
        }
        filters
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    pub first_timestamp: String,
    pub last_timestamp: String,
    pub count: i32,
    #[serde(rename = "type")]
    pub event_type: String,
    pub reason: String,
    /// Kind/name, or namespace/Kind/name when outside the event's namespace
    pub object: String,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub source: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

impl From<&Event> for EventInfo {
    fn from(event: &Event) -> Self {
        let namespace = event.metadata.namespace.clone().unwrap_or_default();
        let involved = &event.involved_object;
        let kind = involved.kind.as_deref().unwrap_or_default();
        let name = involved.name.as_deref().unwrap_or_default();
        let object = match involved.namespace.as_deref() {
            Some(ns) if !ns.is_empty() && ns != namespace => format!("{}/{}/{}", ns, kind, name),
            _ => format!("{}/{}", kind, name),
        };

        let source = event
            .source
            .as_ref()
            .and_then(|s| {
                let component = s.component.as_deref().filter(|c| !c.is_empty())?;
                Some(match s.host.as_deref().filter(|h| !h.is_empty()) {
                    Some(host) => format!("{} ({})", component, host),
                    None => component.to_string(),
                })
            })
            .unwrap_or_default();

        let timestamp = |t: &Option<k8s_openapi::apimachinery::pkg::apis::meta::v1::Time>| {
            t.as_ref().map(|t| t.0.to_rfc3339()).unwrap_or_default()
        };

        Self {
            first_timestamp: timestamp(&event.first_timestamp),
            last_timestamp: timestamp(&event.last_timestamp),
            count: event.count.unwrap_or(1),
            event_type: event.type_.clone().unwrap_or_default(),
            reason: event.reason.clone().unwrap_or_default(),
            object,
            message: event.message.clone().unwrap_or_default(),
            source,
            namespace,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventList {
    pub events: Vec<EventInfo>,
    pub total: usize,
    pub namespace: String,
    pub filters: BTreeMap<String, String>,
}

fn keep(event: &Event, request: &EventsRequest, cutoff: Option<DateTime<Utc>>) -> bool {
    if let Some(wanted) = non_empty(&request.event_type)
        && !event
            .type_
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(wanted))
    {
        return false;
    }
    if let Some(wanted) = non_empty(&request.reason)
        && !event
            .reason
            .as_deref()
            .is_some_and(|r| r.to_lowercase().contains(&wanted.to_lowercase()))
    {
        return false;
    }
    if let Some(cutoff) = cutoff {
        return event.last_timestamp.as_ref().is_some_and(|t| t.0 >= cutoff);
    }
    true
}

/// List events, applying type, reason and time filters after the server-side object filter.
pub async fn list_events(registry: &ClusterRegistry, request: &EventsRequest) -> Result<EventList> {
    request.validate()?;
    let cutoff = request.cutoff(Utc::now())?;
    let namespace = non_empty(&request.namespace);

    let connection = registry
        .connection(non_empty(&request.context).unwrap_or_default())
        .await?;
    let events = connection
        .events(namespace, &request.query())
        .await
        .context("failed to list events")?;
    let fetched = events.len();

    let events: Vec<EventInfo> = events
        .iter()
        .filter(|e| keep(e, request, cutoff))
        .map(EventInfo::from)
        .collect();
    debug!(fetched, kept = events.len(), "Filtered events");

    Ok(EventList {
        total: events.len(),
        events,
        namespace: namespace.unwrap_or("all").to_string(),
        filters: request.filters(),
    })
}
