// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Table layouts for operation results.

use kube::api::DynamicObject;
use serde_json::Value;
use std::collections::BTreeMap;

use super::TableView;
use crate::operations::{
    ContextList, EventList, GroupDiscovery, ListOutcome, PodLogs, ResourceDescription,
    ResourceSummary,
};

pub trait Tabular {
    fn to_table(&self) -> TableView;
}

/// Compact JSON for a table cell
fn json_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(v) => v.to_string(),
    }
}

fn pairs(map: &BTreeMap<String, String>) -> String {
    map.iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}

impl Tabular for GroupDiscovery {
    fn to_table(&self) -> TableView {
        let mut view = TableView::new(&["kind", "group", "resource", "namespaced", "short_names"]);
        for t in &self.discovered_types {
            view.push(vec![
                t.kind.clone(),
                t.group.clone(),
                t.resource.clone(),
                t.namespaced.to_string(),
                t.short_names.join(","),
            ]);
        }
        view.trailer = Some(self.message.clone());
        view
    }
}

impl Tabular for Vec<ResourceSummary> {
    fn to_table(&self) -> TableView {
        let mut view = TableView::new(&["name", "namespace", "kind", "status"]);
        for item in self {
            view.push(vec![
                item.name.clone(),
                item.namespace.clone(),
                item.kind.clone(),
                json_cell(item.status.as_ref()),
            ]);
        }
        view
    }
}

impl Tabular for Vec<DynamicObject> {
    fn to_table(&self) -> TableView {
        let mut view = TableView::new(&["name", "namespace", "kind", "labels", "spec", "status"]);
        for item in self {
            view.push(vec![
                item.metadata.name.clone().unwrap_or_default(),
                item.metadata.namespace.clone().unwrap_or_default(),
                item.types
                    .as_ref()
                    .map(|t| t.kind.clone())
                    .unwrap_or_default(),
                item.metadata.labels.as_ref().map(pairs).unwrap_or_default(),
                json_cell(item.data.get("spec")),
                json_cell(item.data.get("status")),
            ]);
        }
        view
    }
}

impl Tabular for ListOutcome {
    fn to_table(&self) -> TableView {
        match self {
            ListOutcome::Types(discovery) => discovery.to_table(),
            ListOutcome::Summaries(items) => items.to_table(),
            ListOutcome::Details(items) => items.to_table(),
        }
    }
}

impl Tabular for ResourceDescription {
    fn to_table(&self) -> TableView {
        let mut view = TableView::new(&["field", "value"]);
        let created = self
            .creation_timestamp
            .as_ref()
            .map(|t| t.0.to_rfc3339())
            .unwrap_or_default();
        let owners = self
            .owner_references
            .iter()
            .map(|o| format!("{}/{}", o.kind, o.name))
            .collect::<Vec<_>>()
            .join(",");

        let fields = [
            ("name", self.name.clone()),
            ("namespace", self.namespace.clone()),
            ("kind", self.kind.clone()),
            ("uid", self.uid.clone()),
            ("resourceVersion", self.resource_version.clone()),
            ("creationTimestamp", created),
            ("labels", pairs(&self.labels)),
            ("annotations", pairs(&self.annotations)),
            ("ownerReferences", owners),
            ("finalizers", self.finalizers.join(",")),
            ("spec", json_cell(self.spec.as_ref())),
            ("status", json_cell(self.status.as_ref())),
        ];
        for (field, value) in fields {
            if !value.is_empty() {
                view.push(vec![field.to_string(), value]);
            }
        }
        view
    }
}

impl Tabular for PodLogs {
    fn to_table(&self) -> TableView {
        let mut view = TableView::new(&[
            "container",
            "state",
            "ready",
            "restarts",
            "reason",
            "exit_code",
        ]);
        for c in &self.container_statuses {
            view.push(vec![
                c.name.clone(),
                c.state.clone(),
                c.ready.to_string(),
                c.restart_count.to_string(),
                c.reason.clone().unwrap_or_default(),
                c.exit_code.map(|e| e.to_string()).unwrap_or_default(),
            ]);
        }

        let mut trailer = format!("phase: {}", self.pod_status.phase);
        if let Some(source) = &self.source {
            trailer.push_str(&format!("\nsource: {}", source));
        }
        if let Some(error) = &self.error {
            trailer.push_str(&format!("\nerror: {}", error));
        }
        if !self.logs.is_empty() {
            trailer.push_str("\n\n");
            trailer.push_str(&self.logs);
        }
        view.trailer = Some(trailer);
        view
    }
}

impl Tabular for EventList {
    fn to_table(&self) -> TableView {
        let mut view = TableView::new(&[
            "last_seen",
            "type",
            "reason",
            "object",
            "count",
            "message",
        ]);
        for e in &self.events {
            view.push(vec![
                e.last_timestamp.clone(),
                e.event_type.clone(),
                e.reason.clone(),
                e.object.clone(),
                e.count.to_string(),
                e.message.clone(),
            ]);
        }
        view
    }
}

impl Tabular for ContextList {
    fn to_table(&self) -> TableView {
        let mut view = TableView::new(&["current", "name"]);
        for c in &self.contexts {
            let marker = if c.is_current { "*" } else { "" };
            view.push(vec![marker.to_string(), c.name.clone()]);
        }
        view
    }
}
