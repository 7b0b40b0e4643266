//! Where the manifest lives.
//!
//! Resolution order, highest first:
//!
//! 1. `--manifest <PATH>`
//! 2. `STEMCELL_MANIFEST`
//! 3. `<repo-dir>/manifests/cfcr.yml`, with `--repo-dir` defaulting to
//!    `REPO_DIR` or the current directory
//!
//! Flag and environment are merged by clap; this module turns the result
//! into a [`ManifestLocator`].

use crate::error::Result;
use std::path::{Path, PathBuf};

/// Environment variable naming the manifest file.
pub const MANIFEST_ENV: &str = "STEMCELL_MANIFEST";

/// Environment variable naming the deployment repository.
pub const REPO_DIR_ENV: &str = "REPO_DIR";

/// Manifest path relative to the deployment repository.
pub const DEFAULT_MANIFEST: &str = "manifests/cfcr.yml";

/// Resolves the manifest to operate on.
pub trait ManifestLocator {
    fn manifest_file(&self) -> Result<PathBuf>;
}

/// A manifest given explicitly.
#[derive(Debug, Clone)]
pub struct FixedManifest(pub PathBuf);

impl ManifestLocator for FixedManifest {
    fn manifest_file(&self) -> Result<PathBuf> {
        Ok(self.0.clone())
    }
}

/// The default manifest inside a deployment repository.
#[derive(Debug, Clone)]
pub struct RepoLayout {
    repo_dir: PathBuf,
}

impl RepoLayout {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }
}

impl ManifestLocator for RepoLayout {
    fn manifest_file(&self) -> Result<PathBuf> {
        Ok(self.repo_dir.join(DEFAULT_MANIFEST))
    }
}

/// Picks the locator for an explicit manifest (if any) and a repository.
pub fn locator(manifest: Option<&Path>, repo_dir: &Path) -> Box<dyn ManifestLocator> {
    match manifest {
        Some(path) => {
            log::debug!("Using manifest {}", path.display());
            Box::new(FixedManifest(path.to_path_buf()))
        }
        None => {
            log::debug!("Using default manifest under {}", repo_dir.display());
            Box::new(RepoLayout::new(repo_dir))
        }
    }
}
