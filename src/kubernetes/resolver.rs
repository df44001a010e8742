// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Kind resolution against a cluster's advertised resources.
//!
//! Turns a free-form token ("pod", "po", "HelmRelease", "hr") into a single
//! resource match, or selects every resource in API groups matching a
//! substring ("fluxcd", "argo").
//!
//! Matching is a linear first-match scan in discovery order: lists in the
//! order supplied, then resources within each list. When two groups advertise
//! the same short name the earlier list wins. Callers depend on this order,
//! so it must not be replaced by a map lookup or sorted input.

use super::discovery::{ResolvedMatch, ResourceList};
use crate::error::{Error, Result};

/// Kind token meaning "no specific kind": list the whole discovery set
pub const ALL_KINDS: &str = "all";

/// Whether a kind token asks for every resource type instead of one
pub fn is_all_kinds(token: &str) -> bool {
    token.is_empty() || token.eq_ignore_ascii_case(ALL_KINDS)
}

/// Resolve a kind token to the first resource whose plural name, kind or
/// short name equals it (case-insensitive).
pub fn resolve_by_kind(lists: &[ResourceList], token: &str) -> Result<ResolvedMatch> {
    let found = lists.iter().find_map(|list| {
        list.resources
            .iter()
            .find(|r| r.matches(token))
            .map(|r| ResolvedMatch::new(r, &list.group_version))
    });

    match found {
        Some(m) if m.locator().is_some() => Ok(m),
        _ => Err(Error::not_found(token)),
    }
}

/// Every resource in lists whose group/version string contains `substring`
/// (case-insensitive), in list-then-resource order. Empty when none match.
pub fn resolve_by_group_substring(lists: &[ResourceList], substring: &str) -> Vec<ResolvedMatch> {
    let needle = substring.to_lowercase();
    lists
        .iter()
        .filter(|list| list.group_version.to_lowercase().contains(&needle))
        .flat_map(|list| {
            list.resources
                .iter()
                .map(|r| ResolvedMatch::new(r, &list.group_version))
        })
        .collect()
}

/// Resolve a kind token within the API groups matching `substring`.
///
/// Applies the same first-match policy as [`resolve_by_kind`] to the subset
/// returned by [`resolve_by_group_substring`].
pub fn resolve_kind_in_group(
    lists: &[ResourceList],
    substring: &str,
    token: &str,
) -> Result<ResolvedMatch> {
    resolve_by_group_substring(lists, substring)
        .into_iter()
        .find(|m| m.descriptor.matches(token))
        .filter(|m| m.locator().is_some())
        .ok_or_else(|| Error::not_found(format!("{} (group filter '{}')", token, substring)))
}
