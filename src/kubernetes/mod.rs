// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

mod client;
mod connection;
pub mod discovery;
#[cfg(test)]
pub(crate) mod fixture;
pub mod kubeconfig;
pub mod resolver;

pub use client::ClusterRegistry;
pub use connection::{
    ClusterConnection, ConnectionFactory, ConnectionOptions, KubeConnection, KubeConnectionFactory,
    ListQuery, ResourceHandle,
};
pub use discovery::{ResolvedMatch, ResourceDescriptor, ResourceList, ResourceLocator};
pub use kubeconfig::{KubeconfigFile, KubeconfigSource};
