mod common;

use std::fs;

use common::*;

use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_missing_manifest() {
    let temp = TempDir::new().unwrap();

    run_update(temp.path(), &["new-stemcell-version"])
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_manifest_is_directory() {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(manifest_path(temp.path())).unwrap();

    run_update(temp.path(), &["new-stemcell-version"])
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_empty_stemcells() {
    let manifest = "name: cfcr\nstemcells: []\n";
    let temp = create_repo_with(manifest);

    run_update(temp.path(), &["new-stemcell-version"])
        .failure()
        .stderr(predicate::str::contains("sequence is empty"))
        .stderr(predicate::str::contains("left unchanged"));

    assert_eq!(read_manifest(temp.path()), manifest);
}

#[test]
fn test_absent_stemcells() {
    let manifest = "name: cfcr\nreleases:\n- name: kubo\n  version: 0.34.0\n";
    let temp = create_repo_with(manifest);

    run_update(temp.path(), &["new-stemcell-version"])
        .failure()
        .stderr(predicate::str::contains("missing key 'stemcells'"));

    assert_eq!(read_manifest(temp.path()), manifest);
}

#[test]
fn test_stemcell_without_version() {
    let manifest = "stemcells:\n- alias: trusty\n  os: ubuntu-xenial\n";
    let temp = create_repo_with(manifest);

    run_update(temp.path(), &["new-stemcell-version"])
        .failure()
        .stderr(predicate::str::contains("missing key 'version'"));

    assert_eq!(read_manifest(temp.path()), manifest);
}

#[test]
fn test_malformed_manifest() {
    let manifest = "stemcells:\n- alias: trusty\n  version: [unclosed\n";
    let temp = create_repo_with(manifest);

    run_update(temp.path(), &["new-stemcell-version"])
        .failure()
        .stderr(predicate::str::contains("Malformed manifest"));

    assert_eq!(read_manifest(temp.path()), manifest);
}

#[test]
fn test_version_with_line_break_rejected() {
    let temp = create_manifest_repo();

    run_update(temp.path(), &["250.18\nname: evil"])
        .failure()
        .stderr(predicate::str::contains("Invalid version"));

    assert_eq!(read_manifest(temp.path()), CFCR_MANIFEST);
}

#[test]
fn test_empty_version_rejected() {
    let temp = create_manifest_repo();

    run_update(temp.path(), &[""])
        .failure()
        .stderr(predicate::str::contains("Invalid version"));

    assert_eq!(read_manifest(temp.path()), CFCR_MANIFEST);
}

#[test]
fn test_missing_version_argument() {
    let temp = create_manifest_repo();

    run_update(temp.path(), &[])
        .failure()
        .stderr(predicate::str::contains("<VERSION>"));
}

#[test]
fn test_current_conflicts_with_version() {
    let temp = create_manifest_repo();

    run_update(temp.path(), &["--current", "new-stemcell-version"])
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));

    assert_eq!(read_manifest(temp.path()), CFCR_MANIFEST);
}

#[test]
fn test_invalid_query_rejected() {
    let temp = create_manifest_repo();

    run_update(temp.path(), &["--path", "stemcells/0/version", "v2"])
        .failure()
        .stderr(predicate::str::contains("Invalid path"));

    run_update(temp.path(), &["--path", "/stemcells//version", "v2"])
        .failure()
        .stderr(predicate::str::contains("Invalid path"));

    assert_eq!(read_manifest(temp.path()), CFCR_MANIFEST);
}

#[test]
fn test_non_scalar_target_rejected() {
    let temp = create_manifest_repo();

    run_update(temp.path(), &["--path", "/stemcells/0", "v2"])
        .failure()
        .stderr(predicate::str::contains("not a scalar"));

    assert_eq!(read_manifest(temp.path()), CFCR_MANIFEST);
}

#[test]
fn test_block_scalar_target_rejected() {
    let manifest = "stemcells:\n- alias: trusty\n  version: |\n    old\n";
    let temp = create_repo_with(manifest);

    run_update(temp.path(), &["new"])
        .failure()
        .stderr(predicate::str::contains("Cannot edit"));

    assert_eq!(read_manifest(temp.path()), manifest);
}

#[cfg(unix)]
#[test]
fn test_readonly_manifest_left_unchanged() {
    let temp = create_manifest_repo();
    let path = manifest_path(temp.path());

    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_readonly(true);
    fs::set_permissions(&path, perms).unwrap();

    let result = run_update(temp.path(), &["new-stemcell-version"]);

    #[allow(clippy::permissions_set_readonly_false)]
    {
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(false);
        fs::set_permissions(&path, perms).unwrap();
    }

    result.failure().stderr(predicate::str::contains("read-only"));
    assert_eq!(read_manifest(temp.path()), CFCR_MANIFEST);
}

#[test]
fn test_readonly_manifest_allows_dry_run() {
    let temp = create_manifest_repo();
    let path = manifest_path(temp.path());

    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_readonly(true);
    fs::set_permissions(&path, perms).unwrap();

    let result = run_update(temp.path(), &["--dry-run", "new-stemcell-version"]);

    #[allow(clippy::permissions_set_readonly_false)]
    {
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(false);
        fs::set_permissions(&path, perms).unwrap();
    }

    result.success();
    assert_eq!(read_manifest(temp.path()), CFCR_MANIFEST);
}

#[cfg(unix)]
#[test]
fn test_unreadable_manifest() {
    use std::os::unix::fs::PermissionsExt;

    let temp = create_manifest_repo();
    let path = manifest_path(temp.path());
    fs::set_permissions(&path, fs::Permissions::from_mode(0o000)).unwrap();

    // Privileged users can read regardless of mode bits
    if fs::File::open(&path).is_ok() {
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();
        return;
    }

    let result = run_update(temp.path(), &["new-stemcell-version"]);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

    result
        .failure()
        .stderr(predicate::str::contains("not found or unreadable"));
    assert_eq!(read_manifest(temp.path()), CFCR_MANIFEST);
}
