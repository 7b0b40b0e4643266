//! Atomic file updates.
//!
//! Stages a manifest rewrite and commits it in one step.
//!
//! ## Execution Guarantees
//!
//! - **Atomicity**: The file is replaced by renaming a fully written
//!   temporary file over it; readers never see a truncated manifest
//! - **Validation**: Pre-flight checks before any mutation
//! - **Idempotency**: Unchanged content is never staged
//! - **Symlinks**: A symlinked path is resolved and its target is replaced;
//!   the link itself is kept
//!
//! ## Phases
//!
//! 1. **Build**: Stage the update via `update_file()`
//! 2. **Validate**: Check the path still exists and is writable
//! 3. **Execute**: Write through a temporary sibling of the real file
//!
//! ## Example
//!
//! ```no_run
//! # use update_stemcell::fs::Transaction;
//! # use std::path::PathBuf;
//! # fn example() -> update_stemcell::error::Result<()> {
//! let mut txn = Transaction::new(false);
//!
//! txn.update_file(
//!     PathBuf::from("manifests/cfcr.yml"),
//!     "stemcells:\n- version: latest\n".into(),
//! )?;
//!
//! txn.commit()?; // Original stays in place on error
//! # Ok(())
//! # }
//! ```

use crate::error::{Result, UpdateError};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A staged file rewrite.
#[derive(Debug, Clone)]
struct Operation {
    path: PathBuf,
    new: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransactionState {
    /// Staging.
    Building,
    /// The staged rewrite was written (or skipped in dry-run mode).
    Committed,
    /// Commit failed; the original file is untouched.
    Failed,
}

/// Transaction holding at most one file rewrite.
///
/// Must be explicitly committed. If dropped without committing, logs a warning.
///
/// ## Dry-Run Mode
///
/// When `dry_run = true`, the rewrite is staged but never written.
#[must_use = "Transaction must be committed"]
pub struct Transaction {
    operation: Option<Operation>,
    dry_run: bool,
    state: TransactionState,
}

impl Transaction {
    /// Creates a new transaction.
    pub fn new(dry_run: bool) -> Self {
        Self {
            operation: None,
            dry_run,
            state: TransactionState::Building,
        }
    }

    /// Checks that the staged file still exists and is writable.
    fn validate(op: &Operation) -> Result<()> {
        let metadata = fs::metadata(&op.path).map_err(|source| UpdateError::NotFound {
            path: op.path.clone(),
            source,
        })?;

        if metadata.permissions().readonly() {
            return Err(UpdateError::Write {
                path: op.path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "file is read-only",
                ),
            });
        }

        Ok(())
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.state == TransactionState::Building && self.operation.is_some() && !self.dry_run {
            log::warn!("Transaction dropped without commit");
        }
    }
}

impl Transaction {
    /// Stages a file update.
    ///
    /// Reads current content and compares to `new_content`. If identical,
    /// skips (idempotent). Otherwise stages for commit.
    pub fn update_file(&mut self, path: PathBuf, new_content: String) -> Result<()> {
        if self.state != TransactionState::Building {
            return Err(UpdateError::Other(anyhow::anyhow!(
                "Cannot modify transaction after commit"
            )));
        }
        if let Some(staged) = &self.operation {
            return Err(UpdateError::Other(anyhow::anyhow!(
                "{} is already staged",
                staged.path.display()
            )));
        }

        log::debug!("Staging update for: {}", path.display());

        let original = fs::read_to_string(&path).map_err(|source| {
            log::error!("Failed to read {}: {}", path.display(), source);
            UpdateError::NotFound {
                path: path.clone(),
                source,
            }
        })?;

        if original == new_content {
            log::debug!("Content unchanged, skipping: {}", path.display());
            return Ok(());
        }

        if self.dry_run {
            log::info!("Would update: {}", path.display());
        }

        self.operation = Some(Operation {
            path,
            new: new_content,
        });

        Ok(())
    }

    /// Writes the staged rewrite.
    ///
    /// On failure the original file is left as it was.
    pub fn commit(&mut self) -> Result<()> {
        if self.state != TransactionState::Building {
            return Err(UpdateError::Other(anyhow::anyhow!(
                "Transaction already committed"
            )));
        }

        let Some(op) = self.operation.as_ref().filter(|_| !self.dry_run) else {
            self.state = TransactionState::Committed;
            return Ok(());
        };

        let written = Self::validate(op).and_then(|()| {
            Self::replace_atomically(&op.path, &op.new).map_err(|source| UpdateError::Write {
                path: op.path.clone(),
                source,
            })
        });
        if let Err(e) = written {
            self.state = TransactionState::Failed;
            return Err(e);
        }

        log::info!("Updated: {}", op.path.display());
        self.state = TransactionState::Committed;
        Ok(())
    }

    /// Writes `content` to a temporary file next to the file `path` resolves
    /// to, then renames it over that file. The original permissions are
    /// carried over.
    fn replace_atomically(path: &Path, content: &str) -> std::io::Result<()> {
        let target = fs::canonicalize(path)?;
        if target != path {
            log::debug!("{} resolves to {}", path.display(), target.display());
        }
        let dir = target.parent().unwrap_or_else(|| Path::new("."));

        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(content.as_bytes())?;
        temp.as_file().sync_all()?;

        let metadata = fs::metadata(&target)?;
        fs::set_permissions(temp.path(), metadata.permissions())?;

        temp.persist(&target).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Statistics about the staged rewrite.
#[derive(Debug, Clone, Copy)]
pub struct TransactionStats {
    pub files_updated: usize,
    pub bytes_written: usize,
}

impl Transaction {
    /// Returns operation statistics.
    pub fn stats(&self) -> TransactionStats {
        TransactionStats {
            files_updated: usize::from(self.operation.is_some()),
            bytes_written: self.operation.as_ref().map_or(0, |op| op.new.len()),
        }
    }
}
