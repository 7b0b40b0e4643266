//! Pre-flight checks performed before touching a manifest.
//!
//! Unlike `rules`, these functions perform I/O. They fail early with the
//! same error the update itself would produce, before anything is staged.

use crate::error::{Result, UpdateError};
use std::fs;
use std::path::Path;

/// Checks that `manifest` exists, is a readable regular file and, unless
/// `dry_run` is set, is not read-only.
///
/// # Errors
///
/// - `NotFound` if the path is missing, not a file, or cannot be opened
/// - `Write` if the file is read-only and a write is intended
pub fn check_manifest(manifest: &Path, dry_run: bool) -> Result<()> {
    let not_found = |source| UpdateError::NotFound {
        path: manifest.to_path_buf(),
        source,
    };

    let metadata = fs::metadata(manifest).map_err(not_found)?;
    if !metadata.is_file() {
        return Err(not_found(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "not a regular file",
        )));
    }

    fs::File::open(manifest).map_err(not_found)?;

    if !dry_run && metadata.permissions().readonly() {
        return Err(UpdateError::Write {
            path: manifest.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "file is read-only"),
        });
    }

    log::debug!("Manifest {} passed pre-flight checks", manifest.display());
    Ok(())
}
