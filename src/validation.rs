// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Argument validation for inspection requests.

use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use std::time::Duration;

use crate::kubernetes::resolver::ALL_KINDS;

/// DNS subdomain (RFC 1123), used for resource names
static RESOURCE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?(\.[a-z0-9]([-a-z0-9]*[a-z0-9])?)*$")
        .expect("valid resource name regex")
});

/// DNS label (RFC 1123), used for namespaces
static NAMESPACE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid namespace regex")
});

static KIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*$").expect("valid kind regex"));

/// One `<number><unit>` term of a duration like "1h30m"
static DURATION_TERM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d*)?|\.\d+)(ns|us|µs|μs|ms|s|m|h)").expect("valid duration regex")
});

pub fn validate_resource_name(name: &str) -> Result<()> {
    if name.is_empty() {
        bail!("resource name cannot be empty");
    }
    if name.len() > 253 {
        bail!("resource name too long (max 253 characters)");
    }
    if !RESOURCE_NAME.is_match(name) {
        bail!(
            "invalid resource name: must contain only lowercase alphanumeric characters, '-', or '.'"
        );
    }
    Ok(())
}

/// Empty is valid and means "all namespaces" or "default" depending on the operation
pub fn validate_namespace(namespace: &str) -> Result<()> {
    if namespace.is_empty() {
        return Ok(());
    }
    if namespace.len() > 63 {
        bail!("namespace name too long (max 63 characters)");
    }
    if !NAMESPACE.is_match(namespace) {
        bail!("invalid namespace name: must contain only lowercase alphanumeric characters or '-'");
    }
    Ok(())
}

/// Split on commas that are not inside a `(...)` value set
fn selector_terms(selector: &str) -> Vec<&str> {
    let mut terms = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (idx, ch) in selector.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                terms.push(&selector[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    terms.push(&selector[start..]);
    terms
}

/// Shallow check: each top-level term must be an (in)equality or set test
pub fn validate_label_selector(selector: &str) -> Result<()> {
    for part in selector_terms(selector)
        .into_iter()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        if !part.contains('=') && !part.contains(" in ") && !part.contains(" notin ") {
            bail!("invalid label selector format: {}", part);
        }
    }
    Ok(())
}

pub fn validate_kind(kind: &str) -> Result<()> {
    if kind.is_empty() {
        bail!("resource kind cannot be empty");
    }
    if kind == ALL_KINDS {
        return Ok(());
    }
    if !KIND.is_match(kind) {
        bail!(
            "invalid resource kind: must start with letter and contain only alphanumeric characters"
        );
    }
    Ok(())
}

/// Parse a relative duration such as "30s", "5m", "1h30m" or "1.5h"
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    if input == "0" {
        return Ok(Duration::ZERO);
    }

    let mut consumed = 0;
    let mut total = 0f64;
    for caps in DURATION_TERM.captures_iter(input) {
        let whole = caps
            .get(0)
            .ok_or_else(|| anyhow!("invalid duration '{}'", input))?;
        if whole.start() != consumed {
            bail!("invalid duration '{}'", input);
        }
        consumed = whole.end();

        let value: f64 = caps[1]
            .parse()
            .with_context(|| format!("invalid duration '{}'", input))?;
        let unit_secs = match &caps[2] {
            "ns" => 1e-9,
            "us" | "µs" | "μs" => 1e-6,
            "ms" => 1e-3,
            "s" => 1.0,
            "m" => 60.0,
            "h" => 3600.0,
            unit => bail!("unknown unit '{}' in duration '{}'", unit, input),
        };
        total += value * unit_secs;
    }

    if consumed == 0 || consumed != input.len() {
        bail!("invalid duration '{}'", input);
    }
    Duration::try_from_secs_f64(total).map_err(|_| anyhow!("invalid duration '{}'", input))
}

/// Parse an RFC3339 timestamp such as "2025-06-20T10:00:00Z"
pub fn parse_rfc3339(input: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(input)
        .map(|t| t.with_timezone(&Utc))
        .with_context(|| format!("invalid time '{}' (expected RFC3339)", input))
}
