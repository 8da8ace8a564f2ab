//! Per-run import options and the environment-driven importer configuration.

use rocket_okapi::okapi::schemars::{self, JsonSchema};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Batch size used when neither the request nor the environment sets one.
pub const DEFAULT_BATCH_SIZE: usize = 100;

const fn default_true() -> bool {
    true
}

/// Options accepted by a single import run.
///
/// Policy for a record whose key already exists: `update_existing` wins and the
/// row is overwritten; otherwise the record is skipped whatever `skip_duplicates`
/// says, since skipping is the only other behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportOptions {
    /// Records processed concurrently per batch (defaults to the configured size).
    #[serde(default)]
    pub batch_size: Option<usize>,
    /// Leave existing rows untouched and count them as skipped (default true).
    #[serde(default = "default_true")]
    pub skip_duplicates: bool,
    /// Overwrite non-key fields of existing rows (default false).
    #[serde(default)]
    pub update_existing: bool,
    /// Only analyze the dataset for duplicates; never write (default false).
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            batch_size: None,
            skip_duplicates: true,
            update_existing: false,
            dry_run: false,
        }
    }
}

impl ImportOptions {
    /// Effective batch size, falling back to `default` and never below 1.
    pub fn batch_size_or(&self, default: usize) -> usize {
        self.batch_size.unwrap_or(default).max(1)
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    pub fn updating_existing(mut self) -> Self {
        self.update_existing = true;
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_path(key: &str, default: &str) -> PathBuf {
    env::var(key)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(default))
}

/// Importer configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct ImportConfig {
    /// JSON dataset read by `import_all`.
    pub source_path: PathBuf,
    /// Batch size applied when a run does not specify one.
    pub default_batch_size: usize,
}

impl ImportConfig {
    pub fn from_env() -> Self {
        Self {
            source_path: env_path("EASYPAY_IMPORT_SOURCE", "./data/easypay_clients.json"),
            default_batch_size: env_usize("EASYPAY_IMPORT_BATCH_SIZE", DEFAULT_BATCH_SIZE).max(1),
        }
    }

    pub fn with_source(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
            default_batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_body_uses_defaults() {
        let options: ImportOptions = serde_json::from_str("{}").expect("options deserialize");
        assert_eq!(options, ImportOptions::default());
        assert!(options.skip_duplicates);
        assert!(!options.update_existing);
        assert!(!options.dry_run);
        assert_eq!(options.batch_size_or(DEFAULT_BATCH_SIZE), 100);
    }

    #[test]
    fn batch_size_is_clamped_to_one() {
        let options: ImportOptions =
            serde_json::from_str(r#"{"batchSize": 0, "updateExisting": true}"#)
                .expect("options deserialize");
        assert_eq!(options.batch_size_or(DEFAULT_BATCH_SIZE), 1);
        assert!(options.update_existing);
    }

    #[test]
    fn explicit_batch_size_wins_over_default() {
        let options = ImportOptions::default().with_batch_size(7);
        assert_eq!(options.batch_size_or(500), 7);
    }
}
