// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

use anyhow::{Result, anyhow};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::prelude::*;

use kubescout::cli::{Args, Request};
use kubescout::config::{self, Config};
use kubescout::error::is_transient;
use kubescout::kubernetes::ClusterRegistry;
use kubescout::operations;
use kubescout::output::render;

/// Initialize logging with file output and optional stderr
fn init_logging(verbose: bool) {
    use tracing_rolling_file::{RollingConditionBase, RollingFileAppenderBase};
    use tracing_subscriber::fmt::format::FmtSpan;

    let log_dir = config::base_dir()
        .map(|p| p.join("log"))
        .unwrap_or_else(|_| std::path::PathBuf::from("."));

    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        return;
    }

    // 10MB per file, 5 files, rotated daily as well
    let log_path = log_dir.join("kubescout.log");
    let condition = RollingConditionBase::new()
        .daily()
        .max_size(10 * 1024 * 1024);

    let file_appender = match RollingFileAppenderBase::new(log_path, condition, 5) {
        Ok(appender) => appender,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {}", e);
            return;
        }
    };

    let (non_blocking, guard) = file_appender.get_non_blocking_appender();
    // Keep the background writer alive for the whole process
    std::mem::forget(guard);

    let filter = if verbose {
        "kubescout=debug"
    } else {
        "kubescout=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_span_events(FmtSpan::NONE);

    if verbose {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(FmtSpan::NONE);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .with(stderr_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(file_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    let args = Args::parse();
    init_logging(args.verbose);

    let mut config = Config::load()?;
    if let Some(path) = &args.kubeconfig {
        config.kubeconfig = Some(path.clone());
    }
    debug!(?config, "Loaded configuration");

    let registry = ClusterRegistry::from_config(&config)?;
    match run(&args, &registry).await {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            if is_transient(&e) {
                eprintln!("Note: the cluster could not be reached; retrying may succeed");
            }
            Err(e)
        }
    }
}

async fn run(args: &Args, registry: &ClusterRegistry) -> Result<String> {
    let format = &args.output;
    let no_headers = args.no_headers;

    match args.request() {
        Request::List(request) => {
            let outcome = operations::list_resources(registry, &request).await?;
            render(&outcome, format, no_headers)
        }
        Request::Describe(request) => {
            let description = operations::describe_resource(registry, &request).await?;
            render(&description, format, no_headers)
        }
        Request::Logs(request) => {
            let logs = operations::pod_logs(registry, &request).await?;
            render(&logs, format, no_headers)
        }
        Request::Events(request) => {
            let events = operations::list_events(registry, &request).await?;
            render(&events, format, no_headers)
        }
        Request::Contexts => {
            let contexts = operations::list_contexts(registry).await?;
            render(&contexts, format, no_headers)
        }
    }
}
