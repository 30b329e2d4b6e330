// tests/integration_test.rs
mod common;

use common::{commit_all, read, setup_test_repo, INIT_PY, SETUP_PY};
use git2::Repository as Git2Repo;
use serial_test::serial;
use std::env;
use std::fs;
use update_version::config::Config;
use update_version::git::{Git2Repository, Repository};
use update_version::{ReleaseError, ReleaseOptions, VersionReleaser};

fn releaser_for(path: &std::path::Path) -> VersionReleaser<Git2Repository> {
    let repo = Git2Repository::open(path).expect("Should open repository");
    VersionReleaser::new(repo, Config::default()).expect("Default config is valid")
}

#[test]
fn test_compute_version_counts_history() {
    let dir = setup_test_repo(41);
    let releaser = releaser_for(dir.path());

    let version = releaser.compute_version().unwrap();
    assert_eq!(version.to_string(), "0.3.42");
    // unchanged history, unchanged version
    assert_eq!(releaser.compute_version().unwrap(), version);
}

#[test]
fn test_release_end_to_end() {
    let dir = setup_test_repo(41);
    let releaser = releaser_for(dir.path());

    let outcome = releaser.release(ReleaseOptions::default()).unwrap();
    assert_eq!(outcome.version.to_string(), "0.3.42");

    assert_eq!(
        read(dir.path(), "setup.py"),
        SETUP_PY.replace("VERSION = '0.3.1'", "VERSION = '0.3.42'")
    );
    assert_eq!(
        read(dir.path(), "gui_o_matic/__init__.py"),
        INIT_PY.replace("__version__ = '0.3.1'", "__version__ = '0.3.42'")
    );

    let git = Git2Repo::open(dir.path()).unwrap();
    let head = git.head().unwrap().peel_to_commit().unwrap();
    assert_eq!(head.message(), Some("Version 0.3.42"));

    let tag = git
        .find_reference("refs/tags/0.3.42")
        .unwrap()
        .peel_to_commit()
        .unwrap();
    assert_eq!(tag.id(), head.id());
    // lightweight: the ref points straight at the commit
    assert_eq!(
        git.find_reference("refs/tags/0.3.42").unwrap().target(),
        Some(head.id())
    );

    let published = outcome.published.unwrap();
    assert_eq!(published.commit, head.id());
    assert_eq!(published.tag, "0.3.42");

    // the release commit only touches the two targets
    let parent_tree = head.parent(0).unwrap().tree().unwrap();
    let diff = git
        .diff_tree_to_tree(Some(&parent_tree), Some(&head.tree().unwrap()), None)
        .unwrap();
    let mut changed: Vec<String> = diff
        .deltas()
        .filter_map(|d| d.new_file().path().map(|p| p.display().to_string()))
        .collect();
    changed.sort();
    assert_eq!(changed, vec!["gui_o_matic/__init__.py", "setup.py"]);

    assert!(releaser.repository().dirty_paths().unwrap().is_empty());
}

#[test]
fn test_next_release_is_greater() {
    let dir = setup_test_repo(41);
    let releaser = releaser_for(dir.path());

    let first = releaser.release(ReleaseOptions::default()).unwrap().version;
    let second = releaser.compute_version().unwrap();

    assert_eq!(second.to_string(), "0.3.43");
    assert!(second > first);

    let outcome = releaser.release(ReleaseOptions::default()).unwrap();
    assert_eq!(outcome.version, second);
    assert!(outcome.warnings.is_empty());
}

#[test]
fn test_dry_run_changes_nothing() {
    let dir = setup_test_repo(41);
    let releaser = releaser_for(dir.path());

    let outcome = releaser.release(ReleaseOptions { dry_run: true }).unwrap();
    assert!(outcome.is_dry_run());
    assert_eq!(outcome.rewrites.len(), 2);

    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
    assert_eq!(releaser.repository().count_commits().unwrap(), 41);
    assert!(releaser.repository().list_tags().unwrap().is_empty());
}

#[test]
fn test_missing_pattern_leaves_every_target_untouched() {
    let dir = setup_test_repo(3);
    fs::write(dir.path().join("gui_o_matic/__init__.py"), "print('hi')\n").unwrap();
    let git = Git2Repo::open(dir.path()).unwrap();
    commit_all(&git, "drop version");

    let releaser = releaser_for(dir.path());
    let err = releaser.release(ReleaseOptions::default()).unwrap_err();

    assert!(matches!(err, ReleaseError::PatternNotFound { .. }));
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
    assert_eq!(releaser.repository().count_commits().unwrap(), 4);
}

#[test]
fn test_dirty_tree_aborts_before_mutation() {
    let dir = setup_test_repo(2);
    fs::write(dir.path().join("CHANGES"), "uncommitted\n").unwrap();

    let releaser = releaser_for(dir.path());
    let err = releaser.release(ReleaseOptions::default()).unwrap_err();

    match err {
        ReleaseError::DirtyWorkingTree(paths) => assert_eq!(paths, vec!["CHANGES"]),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
}

#[test]
fn test_tag_failure_rolls_back_commit_and_files() {
    let dir = setup_test_repo(41);
    let git = Git2Repo::open(dir.path()).unwrap();
    let head_before = git.head().unwrap().target().unwrap();
    // a ref below refs/tags/0.3.42/ makes refs/tags/0.3.42 impossible to create
    git.reference("refs/tags/0.3.42/blocker", head_before, false, "block tag")
        .unwrap();

    let releaser = releaser_for(dir.path());
    let err = releaser.release(ReleaseOptions::default()).unwrap_err();
    assert!(matches!(err, ReleaseError::TagFailed(_)), "got: {}", err);

    assert_eq!(git.head().unwrap().target(), Some(head_before));
    assert_eq!(read(dir.path(), "setup.py"), SETUP_PY);
    assert_eq!(read(dir.path(), "gui_o_matic/__init__.py"), INIT_PY);
    assert!(releaser.repository().dirty_paths().unwrap().is_empty());
}

#[test]
fn test_tag_failure_without_rollback_leaves_commit() {
    let dir = setup_test_repo(41);
    let git = Git2Repo::open(dir.path()).unwrap();
    let head_before = git.head().unwrap().target().unwrap();
    git.reference("refs/tags/0.3.42/blocker", head_before, false, "block tag")
        .unwrap();

    let mut config = Config::default();
    config.release.rollback_on_failure = false;
    let releaser =
        VersionReleaser::new(Git2Repository::open(dir.path()).unwrap(), config).unwrap();

    let err = releaser.release(ReleaseOptions::default()).unwrap_err();
    assert!(matches!(err, ReleaseError::TagFailed(_)));

    let head = git.head().unwrap().peel_to_commit().unwrap();
    assert_ne!(head.id(), head_before);
    assert_eq!(head.message(), Some("Version 0.3.42"));
}

fn stage(git: &Git2Repo, path: &str) -> git2::Oid {
    let mut index = git.index().unwrap();
    index.add_path(std::path::Path::new(path)).unwrap();
    index.write().unwrap();
    index.get_path(std::path::Path::new(path), 0).unwrap().id
}

fn staged_blob(dir: &std::path::Path, path: &str) -> Option<git2::Oid> {
    // fresh handle so the index is read from disk
    let git = Git2Repo::open(dir).unwrap();
    let index = git.index().unwrap();
    index.get_path(std::path::Path::new(path), 0).map(|e| e.id)
}

fn allow_dirty() -> Config {
    let mut config = Config::default();
    config.release.require_clean_tree = false;
    config
}

#[test]
fn test_release_commit_leaves_out_other_staged_files() {
    let dir = setup_test_repo(3);
    let git = Git2Repo::open(dir.path()).unwrap();
    fs::write(dir.path().join("CHANGES"), "staged by the user\n").unwrap();
    let user_blob = stage(&git, "CHANGES");

    let releaser =
        VersionReleaser::new(Git2Repository::open(dir.path()).unwrap(), allow_dirty()).unwrap();
    releaser.release(ReleaseOptions::default()).unwrap();

    let head = git.head().unwrap().peel_to_commit().unwrap();
    let parent_tree = head.parent(0).unwrap().tree().unwrap();
    let diff = git
        .diff_tree_to_tree(Some(&parent_tree), Some(&head.tree().unwrap()), None)
        .unwrap();
    let mut changed: Vec<String> = diff
        .deltas()
        .filter_map(|d| d.new_file().path().map(|p| p.display().to_string()))
        .collect();
    changed.sort();
    assert_eq!(changed, vec!["gui_o_matic/__init__.py", "setup.py"]);

    // the user's change is still staged, not committed
    assert_eq!(staged_blob(dir.path(), "CHANGES"), Some(user_blob));
    assert_eq!(
        releaser.repository().dirty_paths().unwrap(),
        vec!["CHANGES".to_string()]
    );
}

#[test]
fn test_rollback_restores_staged_target_content() {
    let dir = setup_test_repo(41);
    let git = Git2Repo::open(dir.path()).unwrap();
    let head_before = git.head().unwrap().target().unwrap();

    let staged_setup = format!("{}# release notes\n", SETUP_PY);
    fs::write(dir.path().join("setup.py"), &staged_setup).unwrap();
    let user_blob = stage(&git, "setup.py");
    git.reference("refs/tags/0.3.42/blocker", head_before, false, "block tag")
        .unwrap();

    let releaser =
        VersionReleaser::new(Git2Repository::open(dir.path()).unwrap(), allow_dirty()).unwrap();
    let err = releaser.release(ReleaseOptions::default()).unwrap_err();
    assert!(matches!(err, ReleaseError::TagFailed(_)), "got: {}", err);

    assert_eq!(git.head().unwrap().target(), Some(head_before));
    assert_eq!(staged_blob(dir.path(), "setup.py"), Some(user_blob));
    assert_eq!(read(dir.path(), "setup.py"), staged_setup);
    assert_eq!(read(dir.path(), "gui_o_matic/__init__.py"), INIT_PY);
    assert_eq!(
        releaser.repository().dirty_paths().unwrap(),
        vec!["setup.py".to_string()]
    );
}

#[test]
fn test_existing_tag_is_moved() {
    let dir = setup_test_repo(41);
    let git = Git2Repo::open(dir.path()).unwrap();
    let old_head = git.head().unwrap().peel_to_commit().unwrap();
    git.tag_lightweight("0.3.42", old_head.as_object(), false)
        .unwrap();

    let releaser = releaser_for(dir.path());
    let outcome = releaser.release(ReleaseOptions::default()).unwrap();

    assert_eq!(outcome.warnings.len(), 1);
    let new_head = git.head().unwrap().target().unwrap();
    assert_eq!(
        releaser.repository().find_tag_oid("0.3.42").unwrap(),
        Some(new_head)
    );
}

#[test]
fn test_outside_repository_is_history_unavailable() {
    let dir = tempfile::TempDir::new().unwrap();
    assert!(matches!(
        Git2Repository::open(dir.path()),
        Err(ReleaseError::HistoryUnavailable(_))
    ));
}

#[test]
#[serial]
fn test_repository_discovered_from_subdirectory() {
    let dir = setup_test_repo(5);
    let original_dir = env::current_dir().unwrap();

    env::set_current_dir(dir.path().join("gui_o_matic")).expect("Could not change dir");
    let result = Git2Repository::open(".").and_then(|repo| repo.count_commits());
    env::set_current_dir(original_dir).unwrap();

    assert_eq!(result.unwrap(), 5);
}
