//! Weight persistence service
//!
//! Loads tree snapshots and persisted weights from JSON files and writes the
//! flushed weights back.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt, WeightSession};
use crate::domain::{NestedNode, PersistedWeights, TreeSnapshot};
use crate::infrastructure::traits::FileSystem;

/// Service reading and writing weight state through the filesystem boundary.
pub struct WeightService {
    fs: Arc<dyn FileSystem>,
    precision: u32,
}

impl WeightService {
    /// Create a new weight service writing `precision` decimal places.
    pub fn new(fs: Arc<dyn FileSystem>, precision: u32) -> Self {
        Self { fs, precision }
    }

    /// Read a tree snapshot, accepting the flat `{"nodes": [...]}` form or a
    /// nested array of root nodes.
    #[instrument(level = "debug", skip(self))]
    pub fn load_tree(&self, path: &Path) -> ApplicationResult<TreeSnapshot> {
        if !self.fs.exists(path) {
            return Err(ApplicationError::TreeNotFound(path.to_path_buf()));
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read tree snapshot", path)?;
        let value: Value =
            serde_json::from_str(&content).with_path_context("parse tree snapshot", path)?;

        let invalid = |message: String| ApplicationError::InvalidSnapshot {
            path: path.to_path_buf(),
            message,
        };
        let is_flat = matches!(&value, Value::Object(map) if map.contains_key("nodes"));
        if value.is_array() {
            let roots: Vec<NestedNode> =
                serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
            Ok(TreeSnapshot::from_nested(&roots))
        } else if is_flat {
            serde_json::from_value(value).map_err(|e| invalid(e.to_string()))
        } else {
            Err(invalid(
                "expected an array of root nodes or an object with \"nodes\"".to_string(),
            ))
        }
    }

    /// Read persisted weights. A missing file is not an error.
    #[instrument(level = "debug", skip(self))]
    pub fn load_weights(&self, path: &Path) -> ApplicationResult<Option<PersistedWeights>> {
        if !self.fs.exists(path) {
            debug!("no weights file at {}", path.display());
            return Ok(None);
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read weights", path)?;
        if content.trim().is_empty() {
            return Ok(None);
        }
        let weights = serde_json::from_str(&content).with_path_context("parse weights", path)?;
        Ok(Some(weights))
    }

    /// Load tree and weights into a fresh editing session.
    pub fn open(&self, tree_path: &Path, weights_path: &Path) -> ApplicationResult<WeightSession> {
        let snapshot = self.load_tree(tree_path)?;
        let persisted = self.load_weights(weights_path)?;
        let session = WeightSession::from_snapshot(&snapshot, persisted.as_ref())?
            .with_precision(self.precision);
        Ok(session)
    }

    /// Flush the session and replace the weights file with the result.
    ///
    /// Content goes to a sibling temp file first and is renamed into place.
    #[instrument(level = "debug", skip(self, session))]
    pub fn save(
        &self,
        session: &WeightSession,
        weights_path: &Path,
    ) -> ApplicationResult<PersistedWeights> {
        let flushed = session.flush();
        let json = Self::to_json(&flushed)?;

        self.fs
            .ensure_parent(weights_path)
            .with_path_context("create weights directory", weights_path)?;
        let tmp = temp_path(weights_path);
        self.fs
            .write(&tmp, &json)
            .with_path_context("write weights", &tmp)?;
        self.fs
            .rename(&tmp, weights_path)
            .with_path_context("replace weights", weights_path)?;

        info!(
            categories = flushed.categories.len(),
            requirements = flushed.requirements.len(),
            "weights saved to {}",
            weights_path.display()
        );
        Ok(flushed)
    }

    /// Pretty JSON with stable key order and a trailing newline.
    pub fn to_json(weights: &PersistedWeights) -> ApplicationResult<String> {
        let mut json =
            serde_json::to_string_pretty(weights).map_err(|e| ApplicationError::OperationFailed {
                context: "serialize weights".to_string(),
                source: Box::new(e),
            })?;
        json.push('\n');
        Ok(json)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
