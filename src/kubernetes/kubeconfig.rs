// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Cluster configuration source.
//!
//! The registry reads contexts through [`KubeconfigSource`] so that context
//! listing can observe kubeconfig edits without a restart, and so tests can
//! supply an in-memory kubeconfig.

use anyhow::{Context, Result};
use kube::config::Kubeconfig;
use std::path::PathBuf;

/// Something that can produce the current kubeconfig on demand
pub trait KubeconfigSource: Send + Sync {
    fn load(&self) -> Result<Kubeconfig>;
}

/// Kubeconfig read from disk on every `load()`.
///
/// With an explicit path only that file is read. Otherwise `KUBECONFIG`
/// (possibly several files, merged) is used, then `~/.kube/config`.
#[derive(Debug, Clone, Default)]
pub struct KubeconfigFile {
    path: Option<PathBuf>,
}

impl KubeconfigFile {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }
}

impl KubeconfigSource for KubeconfigFile {
    fn load(&self) -> Result<Kubeconfig> {
        match &self.path {
            Some(path) => Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to load kubeconfig: {}", path.display())),
            None => Kubeconfig::read().context("Failed to load kubeconfig"),
        }
    }
}

/// Names of all contexts in a kubeconfig, in file order
pub fn context_names(kubeconfig: &Kubeconfig) -> Vec<String> {
    kubeconfig.contexts.iter().map(|c| c.name.clone()).collect()
}

/// The context to use when a caller names none: the kubeconfig's current
/// context, else any configured context.
pub fn default_context_name(kubeconfig: &Kubeconfig) -> Option<String> {
    kubeconfig
        .current_context
        .clone()
        .filter(|c| !c.is_empty())
        .or_else(|| kubeconfig.contexts.first().map(|c| c.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
current-context: staging
clusters:
- name: prod
  cluster:
    server: https://prod.example.com:6443
- name: staging
  cluster:
    server: https://staging.example.com:6443
contexts:
- name: prod
  context:
    cluster: prod
    user: admin
- name: staging
  context:
    cluster: staging
    user: admin
users:
- name: admin
  user:
    token: secret
"#;

    #[test]
    fn test_file_source_reads_explicit_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config");
        fs::write(&path, KUBECONFIG).unwrap();

        let source = KubeconfigFile::new(Some(path));
        let kubeconfig = source.load().unwrap();
        assert_eq!(context_names(&kubeconfig), vec!["prod", "staging"]);
        assert_eq!(default_context_name(&kubeconfig).as_deref(), Some("staging"));
    }

    #[test]
    fn test_file_source_rereads_on_each_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config");
        fs::write(&path, KUBECONFIG).unwrap();
        let source = KubeconfigFile::new(Some(path.clone()));
        assert_eq!(context_names(&source.load().unwrap()).len(), 2);

        let trimmed = KUBECONFIG.replace("- name: prod\n  context:", "- name: dev\n  context:");
        fs::write(&path, trimmed).unwrap();
        assert_eq!(context_names(&source.load().unwrap()), vec!["dev", "staging"]);
    }

    #[test]
    fn test_file_source_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let source = KubeconfigFile::new(Some(temp_dir.path().join("nope")));
        let err = source.load().unwrap_err();
        assert!(err.to_string().contains("Failed to load kubeconfig"));
    }

    #[test]
    fn test_default_context_falls_back_to_first() {
        let mut kubeconfig = Kubeconfig::from_yaml(KUBECONFIG).unwrap();
        kubeconfig.current_context = None;
        assert_eq!(default_context_name(&kubeconfig).as_deref(), Some("prod"));

        kubeconfig.current_context = Some(String::new());
        assert_eq!(default_context_name(&kubeconfig).as_deref(), Some("prod"));
    }

    #[test]
    fn test_default_context_none_without_contexts() {
        let kubeconfig = Kubeconfig::default();
        assert!(default_context_name(&kubeconfig).is_none());
    }
}
