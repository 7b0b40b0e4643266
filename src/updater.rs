//! Bumps the stemcell version of a manifest.
//!
//! [`StemcellUpdater`] owns no I/O of its own: the manifest path is passed
//! per call and every read and write goes through the injected
//! [`DocumentAccessor`].

use crate::diff::{self, Hunk};
use crate::error::{Result, UpdateError};
use crate::manifest::{DocumentAccessor, FieldPath, scalar_text};
use crate::verify::validate_version;
use std::path::{Path, PathBuf};

/// Outcome of a single update.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub manifest: PathBuf,
    pub query: FieldPath,
    pub previous: String,
    pub current: String,
    pub hunks: Vec<Hunk>,
}

impl UpdateReport {
    /// Removed plus added lines: 2 for a bump, 0 when nothing changed.
    pub fn changed_lines(&self) -> usize {
        diff::changed_line_count(&self.hunks)
    }

    pub fn is_unchanged(&self) -> bool {
        self.hunks.is_empty()
    }
}

pub struct StemcellUpdater<A> {
    accessor: A,
    query: FieldPath,
}

impl<A: DocumentAccessor> StemcellUpdater<A> {
    /// Creates an updater targeting `/stemcells/0/version`.
    pub fn new(accessor: A) -> Self {
        Self {
            accessor,
            query: FieldPath::stemcell_version(),
        }
    }

    /// Targets a different field.
    pub fn with_query(mut self, query: FieldPath) -> Self {
        self.query = query;
        self
    }

    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    /// Returns the value currently stored at the target field.
    pub fn current_version(&self, manifest: &Path) -> Result<String> {
        let value = self.accessor.get(manifest, &self.query)?;
        scalar_text(&value).ok_or_else(|| UpdateError::schema(&self.query, "value is not a scalar"))
    }

    /// Writes `version` into the target field of `manifest`.
    ///
    /// # Errors
    ///
    /// - `InvalidVersion` if `version` cannot be a single-line scalar
    /// - `NotFound` if the manifest is missing or unreadable
    /// - `Schema` if the target field does not exist
    /// - `UnsupportedLayout` if the field cannot be rewritten on its own line
    /// - `Write` if the result cannot be persisted
    ///
    /// On error the manifest is left as it was.
    pub fn update(&mut self, manifest: &Path, version: &str) -> Result<UpdateReport> {
        validate_version(version)?;

        let previous = self.current_version(manifest)?;
        log::debug!(
            "{} {} currently holds '{}'",
            manifest.display(),
            self.query,
            previous
        );

        // The accessor has verified the readback before anything was written.
        let edit = self.accessor.set(manifest, &self.query, version)?;

        let report = UpdateReport {
            manifest: manifest.to_path_buf(),
            query: self.query.clone(),
            previous,
            current: version.to_string(),
            hunks: diff::line_changes(&edit.before, &edit.after),
        };
        log::info!(
            "Set {} in {} from '{}' to '{}' ({} lines changed)",
            report.query,
            manifest.display(),
            report.previous,
            report.current,
            report.changed_lines()
        );

        Ok(report)
    }
}
