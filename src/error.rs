// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Error taxonomy for kind resolution and cluster connections.
//!
//! Upstream causes (kube errors, kubeconfig errors) are carried in message
//! form so the errors stay `Clone` and comparable in tests.

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// No advertised resource matches the requested kind
    #[error("cannot find resource '{kind}'")]
    NotFound { kind: String },

    /// A match exists but has no usable group/version/plural triple
    #[error("resource '{kind}' has no usable group/version/resource locator")]
    InvalidLocator { kind: String },

    /// No usable cluster configuration or default context
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Building a connection for a context failed
    #[error("failed to create client for context '{context}': {message}")]
    Connection { context: String, message: String },

    /// The discovery call against the API server failed
    #[error("failed to discover resources on context '{context}': {message}")]
    Discovery { context: String, message: String },
}

impl Error {
    pub fn not_found(kind: impl Into<String>) -> Self {
        Self::NotFound { kind: kind.into() }
    }

    /// True for errors a caller can fix by retrying the same call later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Discovery { .. })
    }
}

/// Whether any cause in an error chain is a retryable [`Error`]
pub fn is_transient(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<Error>())
        .any(Error::is_retryable)
}
