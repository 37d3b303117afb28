//! Loading and sharing of the language metadata.
//!
//! The loader holds the current metadata behind a reader/writer lock and
//! hands out `Arc` snapshots: analyzers keep the snapshot they started
//! with instead of re-consulting the loader per lookup, which makes
//! analyzing many compilation units in parallel against one metadata set
//! trivially safe. A reload swaps the snapshot atomically — readers see
//! either the old record or the complete new one, never a torn state.

use crate::model::LanguageMetadata;
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// The JSON payload compiled into the crate, parsed through the same
/// serde path as external files.
const BUNDLED_PAYLOAD: &str = include_str!("../assets/default_metadata.json");

/// Errors from loading a metadata document.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read metadata file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse metadata document: {0}")]
    Json(#[from] serde_json::Error),
}

impl LanguageMetadata {
    /// Parse the compiled-in default payload.
    pub fn bundled() -> Result<LanguageMetadata, MetadataError> {
        Ok(serde_json::from_str(BUNDLED_PAYLOAD)?)
    }

    /// Parse a metadata document from a JSON string.
    pub fn from_json(json: &str) -> Result<LanguageMetadata, MetadataError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a metadata document from `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<LanguageMetadata, MetadataError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Shared holder for the process-wide metadata record.
pub struct MetadataLoader {
    slot: RwLock<Arc<LanguageMetadata>>,
}

impl MetadataLoader {
    /// A loader seeded with the bundled payload.
    pub fn bundled() -> Result<MetadataLoader, MetadataError> {
        Ok(MetadataLoader::new(LanguageMetadata::bundled()?))
    }

    /// A loader seeded with an already-built record.
    pub fn new(metadata: LanguageMetadata) -> MetadataLoader {
        MetadataLoader {
            slot: RwLock::new(Arc::new(metadata)),
        }
    }

    /// A loader seeded from an external file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<MetadataLoader, MetadataError> {
        Ok(MetadataLoader::new(LanguageMetadata::from_path(path)?))
    }

    /// The current snapshot. Holders keep reading the record they got even
    /// across a concurrent reload.
    pub fn snapshot(&self) -> Arc<LanguageMetadata> {
        self.slot.read().clone()
    }

    /// Replace the record from an external file. The swap is atomic with
    /// respect to `snapshot`; on parse failure the old record stays.
    pub fn reload_from_path(&self, path: impl AsRef<Path>) -> Result<(), MetadataError> {
        let metadata = LanguageMetadata::from_path(path)?;
        let variables = metadata.variables.len();
        let methods = metadata.methods.len();
        *self.slot.write() = Arc::new(metadata);
        debug!(methods, variables, "metadata reloaded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::model::{AccessKind, AccessOutcome};

    #[test]
    fn bundled_payload_parses() {
        let metadata = LanguageMetadata::bundled().unwrap();
        assert!(metadata.methods.contains_key("vcl_recv"));
        assert!(metadata.methods.contains_key("vcl_backend_response"));
        assert!(metadata.variables.contains_key("req.url"));
        assert!(!metadata.types.is_empty());
        assert!(!metadata.tokens.is_empty());
    }

    #[test]
    fn bundled_payload_enforces_known_rules() {
        let metadata = LanguageMetadata::bundled().unwrap();
        // vcl_recv may hash but not deliver.
        assert!(metadata.valid_return_action("recv", "hash"));
        assert!(!metadata.valid_return_action("recv", "deliver"));
        // beresp.status is a backend-side write.
        assert_eq!(
            metadata.variable_access("beresp.status", "vcl_recv", AccessKind::Write),
            AccessOutcome::Denied
        );
        assert_eq!(
            metadata.variable_access("beresp.status", "vcl_backend_response", AccessKind::Write),
            AccessOutcome::Allowed
        );
        // Response headers are writable during delivery.
        assert_eq!(
            metadata.variable_access("resp.http.x-cache", "vcl_deliver", AccessKind::Write),
            AccessOutcome::Allowed
        );
    }

    #[test]
    fn valid_return_action_agrees_with_the_raw_table() {
        let metadata = LanguageMetadata::bundled().unwrap();
        for (method, info) in &metadata.methods {
            for action in &info.allowed_returns {
                assert!(metadata.valid_return_action(method, action));
            }
            assert!(!metadata.valid_return_action(method, "no_such_action"));
        }
    }

    #[test]
    fn snapshots_survive_reload() {
        let loader = MetadataLoader::bundled().unwrap();
        let before = loader.snapshot();
        // A reload from a missing path fails and leaves the record alone.
        assert!(loader.reload_from_path("/no/such/metadata.json").is_err());
        let after = loader.snapshot();
        assert!(Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn concurrent_readers_share_one_snapshot() {
        let loader = Arc::new(MetadataLoader::bundled().unwrap());
        let mut handles = Vec::new();
        for _ in 0..4 {
            let loader = Arc::clone(&loader);
            handles.push(std::thread::spawn(move || {
                let snapshot = loader.snapshot();
                snapshot.valid_return_action("recv", "hash")
            }));
        }
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
