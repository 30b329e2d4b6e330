//! Git operations abstraction layer
//!
//! This module provides a trait-based abstraction over the history operations
//! a release needs, allowing for a real libgit2-backed implementation and a
//! mock implementation for testing.
//!
//! # Overview
//!
//! - [repository::Git2Repository]: A real implementation using the `git2` crate
//! - [mock::MockRepository]: An in-memory history for testing the release pipeline
//!
//! Code driving a release depends on the [Repository] trait rather than on a
//! concrete implementation.
//!
//! ```rust
//! # use update_version::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> update_version::Result<()> {
//! let commits = repo.count_commits()?;
//! println!("next patch number: {}", commits + 1);
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::error::Result;
use git2::Oid;
use std::path::{Path, PathBuf};

/// Index entry of one path as it was before [Repository::stage_paths]
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSnapshot {
    pub path: PathBuf,
    /// Blob id and file mode; `None` when the path had no entry
    pub entry: Option<(Oid, u32)>,
}

/// History operations used by a release
///
/// ## Error Handling
///
/// Implementations map failures onto the release taxonomy:
/// reading history fails with [crate::ReleaseError::HistoryUnavailable], staging
/// and committing with [crate::ReleaseError::CommitFailed], tagging with
/// [crate::ReleaseError::TagFailed].
///
/// A release runs on one thread, so implementors need not be `Sync`.
pub trait Repository {
    /// Root of the working tree; target paths are relative to it
    fn root(&self) -> &Path;

    /// Count every commit reachable from the current HEAD
    ///
    /// # Returns
    /// * `Ok(count)` - Number of commits in history, at least 1
    /// * `Err` - If HEAD is unborn or history cannot be walked
    fn count_commits(&self) -> Result<usize>;

    /// Get the OID of the commit HEAD points at
    fn head_oid(&self) -> Result<Oid>;

    /// Tracked paths with staged or unstaged modifications
    ///
    /// Untracked and ignored files are not reported.
    fn dirty_paths(&self) -> Result<Vec<String>>;

    /// Find a tag by name and get the commit it points at
    ///
    /// # Returns
    /// * `Ok(Some(Oid))` - Target of the tag if it exists
    /// * `Ok(None)` - If the tag doesn't exist
    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>>;

    /// Get all tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Add the given working-tree paths to the index
    ///
    /// Either every path is staged or the index is left as it was.
    ///
    /// # Returns
    /// * `Ok(snapshots)` - The previous entry of each path, for [Repository::restore_index]
    fn stage_paths(&self, paths: &[&Path]) -> Result<Vec<IndexSnapshot>>;

    /// Put index entries back to a state captured by [Repository::stage_paths]
    fn restore_index(&self, snapshots: &[IndexSnapshot]) -> Result<()>;

    /// Commit the staged content of `paths` on top of HEAD
    ///
    /// Other staged changes are not part of the commit and stay staged.
    ///
    /// # Returns
    /// * `Ok(Oid)` - The new commit
    /// * `Err` - If there is nothing to commit or the commit cannot be written
    fn commit(&self, message: &str, paths: &[&Path]) -> Result<Oid>;

    /// Move the current branch back to `oid`, keeping index and working tree
    fn reset_head(&self, oid: Oid) -> Result<()>;

    /// Create a lightweight tag at given OID
    ///
    /// # Arguments
    /// * `name` - Name for the tag
    /// * `oid` - Commit to tag
    /// * `force` - Replace a tag of the same name instead of failing
    fn create_tag(&self, name: &str, oid: Oid, force: bool) -> Result<()>;
}
