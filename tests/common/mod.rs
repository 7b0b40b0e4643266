//! Integration tests for update-stemcell
//!
//! These tests build a throwaway deployment repository and drive the binary
//! the way a release pipeline would.

use assert_cmd::cargo::cargo_bin_cmd;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A trimmed CFCR deployment manifest.
#[allow(unused)]
pub const CFCR_MANIFEST: &str = r#"---
name: cfcr

releases:
- name: kubo
  version: 0.34.0
- name: bpm
  version: "1.1.3"

stemcells:
- alias: trusty
  os: ubuntu-xenial
  version: "250.17"

instance_groups:
- name: master
  instances: 1
  networks:
  - name: default
  azs: [z1]
  stemcell: trusty
  vm_type: small
  jobs:
  - name: kube-apiserver
    release: kubo
    properties:
      # Comment that must survive
      admin-password: ((kubo-admin-password))

update:
  canaries: 1
  max_in_flight: 1
  canary_watch_time: 10000-300000
  update_watch_time: 10000-300000

variables:
- name: kubo-admin-password
  type: password
"#;

/// Creates a repository with `manifests/cfcr.yml`.
#[allow(unused)]
pub fn create_manifest_repo() -> TempDir {
    create_repo_with(CFCR_MANIFEST)
}

/// Creates a repository whose `manifests/cfcr.yml` holds `content`.
#[allow(unused)]
pub fn create_repo_with(content: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("manifests")).unwrap();
    fs::write(manifest_path(temp.path()), content).unwrap();
    temp
}

#[allow(unused)]
pub fn manifest_path(repo: &Path) -> PathBuf {
    repo.join("manifests").join("cfcr.yml")
}

#[allow(unused)]
pub fn read_manifest(repo: &Path) -> String {
    fs::read_to_string(manifest_path(repo)).unwrap()
}

/// Helper to run the binary inside `repo`
pub fn run_update(repo: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = cargo_bin_cmd!("update-stemcell");
    cmd.args(args)
        .env_remove("STEMCELL_MANIFEST")
        .env_remove("REPO_DIR")
        .current_dir(repo);

    cmd.assert()
}

/// Reads the field back through `--current`, the way `bosh int --path` would.
#[allow(unused)]
pub fn current_value(repo: &Path, query: &str) -> String {
    let output = run_update(repo, &["--current", "--path", query])
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).unwrap()
}
