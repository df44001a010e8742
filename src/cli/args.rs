// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::operations::{DescribeRequest, EventsRequest, ListRequest, LogsRequest};

#[derive(Parser, Debug)]
#[command(name = "kubescout")]
#[command(author, version, about = "Inspect Kubernetes resources across clusters")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Kubernetes context to use (defaults to the kubeconfig's current context)
    #[arg(short, long, global = true, value_name = "CONTEXT")]
    pub context: Option<String>,

    /// Path to the kubeconfig file
    #[arg(long, global = true, value_name = "PATH")]
    pub kubeconfig: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "json")]
    pub output: OutputFormat,

    /// Omit column headers in table output
    #[arg(long, global = true)]
    pub no_headers: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List resources of a kind, or the resource types of matching API groups
    List {
        /// Kind, plural or short name (e.g. Pod, pods, po); "all" with --group
        kind: Option<String>,

        /// Substring of the API group/version (e.g. fluxcd, argoproj)
        #[arg(short, long)]
        group: Option<String>,

        /// Namespace (all namespaces when omitted)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Label selector (e.g. app=nginx)
        #[arg(short = 'l', long)]
        selector: Option<String>,

        /// Field selector (e.g. status.phase=Running)
        #[arg(long)]
        field_selector: Option<String>,

        /// Maximum number of items to return
        #[arg(long)]
        limit: Option<u32>,

        /// Server-side timeout in seconds
        #[arg(long)]
        timeout: Option<u32>,

        /// Return complete objects instead of summaries
        #[arg(short, long)]
        details: bool,
    },

    /// Show one resource
    Describe {
        kind: String,
        name: String,

        /// Namespace (searched across all namespaces when omitted)
        #[arg(short, long)]
        namespace: Option<String>,
    },

    /// Fetch pod logs
    Logs {
        /// Pod name
        name: String,

        #[arg(short, long)]
        namespace: Option<String>,

        /// Container name (required for multi-container pods)
        #[arg(long)]
        container: Option<String>,

        /// Lines from the end of the log (0 for all)
        #[arg(long)]
        tail: Option<i64>,

        /// Only logs newer than a relative duration (e.g. 5m, 1h)
        #[arg(long, conflicts_with = "since_time")]
        since: Option<String>,

        /// Only logs after an RFC3339 timestamp
        #[arg(long)]
        since_time: Option<String>,

        /// Prefix each line with its timestamp
        #[arg(long)]
        timestamps: bool,

        /// Logs from the previous container instance
        #[arg(short, long)]
        previous: bool,
    },

    /// List events
    Events {
        /// Namespace (all namespaces when omitted)
        #[arg(short, long)]
        namespace: Option<String>,

        /// Name of the involved object
        #[arg(long)]
        object: Option<String>,

        /// Normal or Warning
        #[arg(long = "type")]
        event_type: Option<String>,

        /// Substring of the event reason
        #[arg(long)]
        reason: Option<String>,

        #[arg(long)]
        since: Option<String>,

        #[arg(long)]
        since_time: Option<String>,

        /// Maximum number of events to fetch (0 for no limit)
        #[arg(long)]
        limit: Option<u32>,

        #[arg(long)]
        timeout: Option<u32>,
    },

    /// List kubeconfig contexts
    Contexts,
}

#[derive(ValueEnum, Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Table,
}

/// A parsed subcommand turned into an operation request
#[derive(Debug)]
pub enum Request {
    List(ListRequest),
    Describe(DescribeRequest),
    Logs(LogsRequest),
    Events(EventsRequest),
    Contexts,
}

impl Args {
    pub fn request(&self) -> Request {
        let context = self.context.clone();
        match &self.command {
            Command::List {
                kind,
                group,
                namespace,
                selector,
                field_selector,
                limit,
                timeout,
                details,
            } => Request::List(ListRequest {
                context,
                kind: kind.clone(),
                group_filter: group.clone(),
                namespace: namespace.clone(),
                label_selector: selector.clone(),
                field_selector: field_selector.clone(),
                limit: *limit,
                timeout_secs: *timeout,
                show_details: *details,
            }),
            Command::Describe {
                kind,
                name,
                namespace,
            } => Request::Describe(DescribeRequest {
                context,
                kind: kind.clone(),
                name: name.clone(),
                namespace: namespace.clone(),
            }),
            Command::Logs {
                name,
                namespace,
                container,
                tail,
                since,
                since_time,
                timestamps,
                previous,
            } => Request::Logs(LogsRequest {
                context,
                name: name.clone(),
                namespace: namespace.clone(),
                container: container.clone(),
                tail: *tail,
                since: since.clone(),
                since_time: since_time.clone(),
                timestamps: *timestamps,
                previous: *previous,
            }),
            Command::Events {
                namespace,
                object,
                event_type,
                reason,
                since,
                since_time,
                limit,
                timeout,
            } => Request::Events(EventsRequest {
                context,
                namespace: namespace.clone(),
                object: object.clone(),
                event_type: event_type.clone(),
                reason: reason.clone(),
                since: since.clone(),
                since_time: since_time.clone(),
                limit: *limit,
                timeout_secs: *timeout,
            }),
            Command::Contexts => Request::Contexts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Args {
        let argv = std::iter::once("kubescout").chain(argv.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_list_with_global_flags() {
        let args = parse(&[
            "list",
            "po",
            "-n",
            "kube-system",
            "-c",
            "prod",
            "-o",
            "table",
        ]);
        assert_eq!(args.output, OutputFormat::Table);
        let Request::List(req) = args.request() else {
            panic!("expected list");
        };
        assert_eq!(req.kind.as_deref(), Some("po"));
        assert_eq!(req.namespace.as_deref(), Some("kube-system"));
        assert_eq!(req.context.as_deref(), Some("prod"));
    }

    #[test]
    fn test_list_group_without_kind() {
        let args = parse(&["list", "--group", "fluxcd"]);
        let Request::List(req) = args.request() else {
            panic!("expected list");
        };
        assert_eq!(req.kind, None);
        assert_eq!(req.group_filter.as_deref(), Some("fluxcd"));
        assert_eq!(args.output, OutputFormat::Json);
    }

    #[test]
    fn test_describe() {
        let args = parse(&["describe", "deploy", "api", "-n", "shop"]);
        let Request::Describe(req) = args.request() else {
            panic!("expected describe");
        };
        assert_eq!(req.kind, "deploy");
        assert_eq!(req.name, "api");
        assert_eq!(req.namespace.as_deref(), Some("shop"));
    }

    #[test]
    fn test_logs() {
        let args = parse(&["logs", "web", "--tail", "0", "--since", "5m", "-p"]);
        let Request::Logs(req) = args.request() else {
            panic!("expected logs");
        };
        assert_eq!(req.tail, Some(0));
        assert_eq!(req.since.as_deref(), Some("5m"));
        assert!(req.previous);
    }

    #[test]
    fn test_logs_since_conflicts_with_since_time() {
        let result = Args::try_parse_from([
            "kubescout",
            "logs",
            "web",
            "--since",
            "5m",
            "--since-time",
            "2025-06-20T10:00:00Z",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_events() {
        let args = parse(&[
            "events", "--type", "Warning", "--object", "api-1", "--limit", "0",
        ]);
        let Request::Events(req) = args.request() else {
            panic!("expected events");
        };
        assert_eq!(req.event_type.as_deref(), Some("Warning"));
        assert_eq!(req.object.as_deref(), Some("api-1"));
        assert_eq!(req.limit, Some(0));
    }

    #[test]
    fn test_contexts_and_kubeconfig() {
        let args = parse(&["--kubeconfig", "/tmp/kc", "contexts"]);
        assert!(matches!(args.request(), Request::Contexts));
        assert_eq!(args.kubeconfig, Some(PathBuf::from("/tmp/kc")));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Args::try_parse_from(["kubescout"]).is_err());
    }
}
