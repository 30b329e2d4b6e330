#![allow(dead_code)]

use git2::Repository;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const SETUP_PY: &str = "#!/usr/bin/python3
import setuptools

# Do not edit: The VERSION gets updated by the update-version script
VERSION = '0.3.1'

setuptools.setup(
    name='gui-o-matic',
    version=VERSION,
)
";

pub const INIT_PY: &str = "from __future__ import print_function

__version__ = '0.3.1'
";

/// Create a repository whose history holds `commits` commits.
///
/// The first commit adds both version targets; the others touch `CHANGES`.
pub fn setup_test_repo(commits: usize) -> TempDir {
    let temp_dir = TempDir::new().expect("Could not create temp dir");
    let repo = Repository::init(temp_dir.path()).expect("Could not init git repo");

    {
        let mut config = repo.config().expect("Could not get config");
        config
            .set_str("user.name", "Test User")
            .expect("Could not set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Could not set user.email");
    }

    fs::create_dir_all(temp_dir.path().join("gui_o_matic")).unwrap();
    fs::write(temp_dir.path().join("setup.py"), SETUP_PY).unwrap();
    fs::write(temp_dir.path().join("gui_o_matic/__init__.py"), INIT_PY).unwrap();

    for i in 0..commits {
        if i > 0 {
            fs::write(temp_dir.path().join("CHANGES"), format!("change {}\n", i)).unwrap();
        }
        commit_all(&repo, &format!("commit {}", i + 1));
    }

    temp_dir
}

/// Stage everything in the working tree and commit it on HEAD.
pub fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
    let mut index = repo.index().expect("Could not get index");
    index
        .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
        .expect("Could not add files to index");
    index.write().expect("Could not write index");

    let tree_id = index.write_tree().expect("Could not write tree");
    let tree = repo.find_tree(tree_id).expect("Could not find tree");
    let sig = repo.signature().expect("Could not get sig");

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .expect("Could not create commit")
}

pub fn read(dir: &Path, path: &str) -> String {
    fs::read_to_string(dir.join(path)).expect("Could not read file")
}
