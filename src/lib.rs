// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Read-only Kubernetes inspection across multiple clusters.
//!
//! Kinds are resolved against each cluster's discovery data (including
//! custom resources and short names) and connections are cached per
//! kubeconfig context.

pub mod cli;
pub mod config;
pub mod error;
pub mod kubernetes;
pub mod operations;
pub mod output;
pub mod validation;

pub use error::{Error, Result};
