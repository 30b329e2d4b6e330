use crate::error::{ReleaseError, Result};
use crate::git::{IndexSnapshot, Repository};
use git2::Oid;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

struct MockCommit {
    id: Oid,
    message: String,
    paths: Vec<PathBuf>,
}

/// In-memory history for testing the release pipeline without libgit2
///
/// Working-tree files still live on disk under `root`; only history, index and
/// tags are simulated. Individual operations can be made to fail.
pub struct MockRepository {
    root: PathBuf,
    available: bool,
    history: RefCell<Vec<MockCommit>>,
    staged: RefCell<Vec<PathBuf>>,
    tags: RefCell<HashMap<String, Oid>>,
    dirty: Vec<String>,
    fail_stage: bool,
    fail_commit: bool,
    fail_tag: bool,
    fail_reset: bool,
    next_id: RefCell<u64>,
}

impl MockRepository {
    /// Create a mock whose history holds `commits` commits
    pub fn new(root: impl Into<PathBuf>, commits: usize) -> Result<Self> {
        let repo = MockRepository {
            root: root.into(),
            available: true,
            history: RefCell::new(Vec::new()),
            staged: RefCell::new(Vec::new()),
            tags: RefCell::new(HashMap::new()),
            dirty: Vec::new(),
            fail_stage: false,
            fail_commit: false,
            fail_tag: false,
            fail_reset: false,
            next_id: RefCell::new(1),
        };
        for i in 0..commits {
            let oid = repo.next_oid()?;
            repo.history.borrow_mut().push(MockCommit {
                id: oid,
                message: format!("commit {}", i + 1),
                paths: Vec::new(),
            });
        }
        Ok(repo)
    }

    /// Make every history read fail as if outside a repository
    pub fn unavailable(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn with_dirty_paths(mut self, paths: &[&str]) -> Self {
        self.dirty = paths.iter().map(|p| p.to_string()).collect();
        self
    }

    /// Paths the user staged before the release
    pub fn with_staged(self, paths: &[&str]) -> Self {
        self.staged
            .borrow_mut()
            .extend(paths.iter().map(PathBuf::from));
        self
    }

    pub fn failing_stage(mut self) -> Self {
        self.fail_stage = true;
        self
    }

    pub fn failing_commit(mut self) -> Self {
        self.fail_commit = true;
        self
    }

    pub fn failing_tag(mut self) -> Self {
        self.fail_tag = true;
        self
    }

    pub fn failing_reset(mut self) -> Self {
        self.fail_reset = true;
        self
    }

    /// Add a tag pointing to an OID
    pub fn add_tag(&self, name: impl Into<String>, oid: Oid) {
        self.tags.borrow_mut().insert(name.into(), oid);
    }

    /// Paths currently staged and not yet committed
    pub fn staged(&self) -> Vec<PathBuf> {
        self.staged.borrow().clone()
    }

    /// Commit messages, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.history
            .borrow()
            .iter()
            .map(|commit| commit.message.clone())
            .collect()
    }

    /// Paths recorded by the newest commit
    pub fn last_commit_paths(&self) -> Vec<PathBuf> {
        self.history
            .borrow()
            .last()
            .map(|commit| commit.paths.clone())
            .unwrap_or_default()
    }

    fn next_oid(&self) -> Result<Oid> {
        let mut next = self.next_id.borrow_mut();
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&next.to_be_bytes());
        *next += 1;
        Ok(Oid::from_bytes(&bytes)?)
    }

    fn require_history(&self) -> Result<()> {
        if !self.available {
            return Err(ReleaseError::history("Not in a git repository"));
        }
        if self.history.borrow().is_empty() {
            return Err(ReleaseError::history("HEAD does not point at a commit"));
        }
        Ok(())
    }
}

impl Repository for MockRepository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn count_commits(&self) -> Result<usize> {
        self.require_history()?;
        Ok(self.history.borrow().len())
    }

    fn head_oid(&self) -> Result<Oid> {
        self.require_history()?;
        self.history
            .borrow()
            .last()
            .map(|commit| commit.id)
            .ok_or_else(|| ReleaseError::history("HEAD does not point at a commit"))
    }

    fn dirty_paths(&self) -> Result<Vec<String>> {
        Ok(self.dirty.clone())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        Ok(self.tags.borrow().get(tag_name).copied())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self.tags.borrow().keys().cloned().collect();
        tags.sort();
        Ok(tags)
    }

    fn stage_paths(&self, paths: &[&Path]) -> Result<Vec<IndexSnapshot>> {
        if self.fail_stage {
            return Err(ReleaseError::commit("index is locked"));
        }
        let mut staged = self.staged.borrow_mut();
        let snapshots = paths
            .iter()
            .map(|path| IndexSnapshot {
                path: path.to_path_buf(),
                entry: staged
                    .iter()
                    .any(|p| p.as_path() == *path)
                    .then(|| (Oid::zero(), 0o100644)),
            })
            .collect();
        for path in paths {
            if !staged.iter().any(|p| p.as_path() == *path) {
                staged.push(path.to_path_buf());
            }
        }
        Ok(snapshots)
    }

    fn restore_index(&self, snapshots: &[IndexSnapshot]) -> Result<()> {
        let mut staged = self.staged.borrow_mut();
        for snapshot in snapshots {
            let present = staged.contains(&snapshot.path);
            match (&snapshot.entry, present) {
                (Some(_), false) => staged.push(snapshot.path.clone()),
                (None, true) => staged.retain(|p| *p != snapshot.path),
                _ => {}
            }
        }
        Ok(())
    }

    fn commit(&self, message: &str, paths: &[&Path]) -> Result<Oid> {
        self.require_history()
            .map_err(|e| ReleaseError::commit(e.to_string()))?;
        if self.fail_commit {
            return Err(ReleaseError::commit("commit rejected"));
        }

        let mut staged = self.staged.borrow_mut();
        let committed: Vec<PathBuf> = staged
            .iter()
            .filter(|p| paths.contains(&p.as_path()))
            .cloned()
            .collect();
        if committed.is_empty() {
            return Err(ReleaseError::commit("nothing to commit"));
        }
        staged.retain(|p| !committed.contains(p));

        let oid = self.next_oid()?;
        self.history.borrow_mut().push(MockCommit {
            id: oid,
            message: message.to_string(),
            paths: committed,
        });
        Ok(oid)
    }

    /// Soft reset: paths of dropped commits become staged again
    fn reset_head(&self, oid: Oid) -> Result<()> {
        if self.fail_reset {
            return Err(ReleaseError::commit("cannot move HEAD"));
        }
        let mut history = self.history.borrow_mut();
        let position = history
            .iter()
            .position(|commit| commit.id == oid)
            .ok_or_else(|| ReleaseError::commit(format!("Unknown commit {}", oid)))?;

        let mut staged = self.staged.borrow_mut();
        for commit in history.drain(position + 1..) {
            for path in commit.paths {
                if !staged.contains(&path) {
                    staged.push(path);
                }
            }
        }
        Ok(())
    }

    fn create_tag(&self, name: &str, oid: Oid, force: bool) -> Result<()> {
        if self.fail_tag {
            return Err(ReleaseError::tag(format!("Cannot create tag '{}'", name)));
        }
        let mut tags = self.tags.borrow_mut();
        if tags.contains_key(name) && !force {
            return Err(ReleaseError::tag(format!("Tag '{}' already exists", name)));
        }
        tags.insert(name.to_string(), oid);
        Ok(())
    }
}
