use super::IndexSnapshot;
use crate::error::{ReleaseError, Result};
use git2::{Oid, Repository as Git2Repo};
use std::path::{Path, PathBuf};

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    root: PathBuf,
}

impl Git2Repository {
    /// Open or discover a git repository with a working tree
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Git2Repo::discover(path).map_err(|e| {
            ReleaseError::history(format!(
                "Not in a git repository ({}): {}",
                path.display(),
                e.message()
            ))
        })?;

        Self::from_git2(repo)
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Result<Self> {
        let root = repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| ReleaseError::history("Repository has no working tree"))?;

        Ok(Git2Repository { repo, root })
    }

    /// Parent tree with only the staged entries of `paths` applied
    fn release_tree(
        &self,
        parent: &git2::Commit<'_>,
        paths: &[&Path],
    ) -> std::result::Result<Oid, git2::Error> {
        let staged = self.repo.index()?;
        let mut tree_index = git2::Index::new()?;
        tree_index.read_tree(&parent.tree()?)?;

        for path in paths {
            match staged.get_path(path, 0) {
                Some(entry) => tree_index.add(&entry)?,
                None => tree_index.remove_path(path)?,
            }
        }

        tree_index.write_tree_to(&self.repo)
    }

    fn head_commit(&self) -> Result<git2::Commit<'_>> {
        let head = self
            .repo
            .head()
            .map_err(|e| ReleaseError::history(format!("Cannot resolve HEAD: {}", e.message())))?;
        head.peel_to_commit().map_err(|e| {
            ReleaseError::history(format!("HEAD does not point at a commit: {}", e.message()))
        })
    }
}

impl super::Repository for Git2Repository {
    fn root(&self) -> &Path {
        &self.root
    }

    fn count_commits(&self) -> Result<usize> {
        let head = self.head_commit()?;

        let mut revwalk = self.repo.revwalk().map_err(|e| {
            ReleaseError::history(format!("Cannot walk history: {}", e.message()))
        })?;
        revwalk
            .push(head.id())
            .map_err(|e| ReleaseError::history(format!("Cannot walk history: {}", e.message())))?;

        let mut count = 0;
        for oid in revwalk {
            oid.map_err(|e| {
                ReleaseError::history(format!("Corrupt history: {}", e.message()))
            })?;
            count += 1;
        }

        Ok(count)
    }

    fn head_oid(&self) -> Result<Oid> {
        Ok(self.head_commit()?.id())
    }

    fn dirty_paths(&self) -> Result<Vec<String>> {
        let mut options = git2::StatusOptions::new();
        options.include_untracked(false).include_ignored(false);

        let statuses = self.repo.statuses(Some(&mut options))?;

        Ok(statuses
            .iter()
            .filter(|entry| {
                let status = entry.status();
                !status.is_empty() && !status.contains(git2::Status::IGNORED)
            })
            .filter_map(|entry| entry.path().map(|p| p.to_string()))
            .collect())
    }

    fn find_tag_oid(&self, tag_name: &str) -> Result<Option<Oid>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let oid = reference
                    .peel(git2::ObjectType::Commit)
                    .map_err(|e| ReleaseError::tag(format!("Cannot peel tag: {}", e)))?
                    .id();

                Ok(Some(oid))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            // names that are not valid refs cannot exist as tags
            Err(e) if e.code() == git2::ErrorCode::InvalidSpec => Ok(None),
            Err(e) => Err(ReleaseError::tag(format!(
                "Cannot find tag '{}': {}",
                tag_name, e
            ))),
        }
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn stage_paths(&self, paths: &[&Path]) -> Result<Vec<IndexSnapshot>> {
        let mut index = self
            .repo
            .index()
            .map_err(|e| ReleaseError::commit(format!("Cannot open index: {}", e)))?;

        let snapshots = paths
            .iter()
            .map(|path| IndexSnapshot {
                path: path.to_path_buf(),
                entry: index.get_path(path, 0).map(|entry| (entry.id, entry.mode)),
            })
            .collect();

        if let Err(e) = add_and_write(&mut index, paths) {
            // discard the partial in-memory update
            index.read(true)?;
            return Err(e);
        }
        Ok(snapshots)
    }

    fn restore_index(&self, snapshots: &[IndexSnapshot]) -> Result<()> {
        let mut index = self.repo.index()?;

        for snapshot in snapshots {
            match snapshot.entry {
                Some((id, mode)) => {
                    let size = self.repo.find_blob(id)?.size();
                    index.add(&index_entry(&snapshot.path, id, mode, size))?;
                }
                None => index.remove_path(&snapshot.path)?,
            }
        }

        index.write()?;
        Ok(())
    }

    fn commit(&self, message: &str, paths: &[&Path]) -> Result<Oid> {
        let sig = self.repo.signature().map_err(|e| {
            ReleaseError::commit(format!("No committer identity configured: {}", e))
        })?;

        let parent = self
            .head_commit()
            .map_err(|e| ReleaseError::commit(e.to_string()))?;

        let tree = self
            .release_tree(&parent, paths)
            .and_then(|tree_id| self.repo.find_tree(tree_id))
            .map_err(|e| ReleaseError::commit(format!("Cannot write tree: {}", e)))?;

        if parent.tree_id() == tree.id() {
            return Err(ReleaseError::commit("nothing to commit"));
        }

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])
            .map_err(|e| ReleaseError::commit(format!("Cannot create commit: {}", e)))
    }

    fn reset_head(&self, oid: Oid) -> Result<()> {
        let commit = self.repo.find_commit(oid)?;
        self.repo
            .reset(commit.as_object(), git2::ResetType::Soft, None)?;
        Ok(())
    }

    fn create_tag(&self, name: &str, oid: Oid, force: bool) -> Result<()> {
        if !git2::Reference::is_valid_name(&format!("refs/tags/{}", name)) {
            return Err(ReleaseError::tag(format!("Invalid tag name '{}'", name)));
        }

        let object = self
            .repo
            .find_object(oid, None)
            .map_err(|e| ReleaseError::tag(format!("Cannot find object: {}", e)))?;

        self.repo
            .tag_lightweight(name, &object, force)
            .map_err(|e| ReleaseError::tag(format!("Cannot create tag '{}': {}", name, e)))?;

        Ok(())
    }
}

fn add_and_write(index: &mut git2::Index, paths: &[&Path]) -> Result<()> {
    for path in paths {
        index.add_path(path).map_err(|e| {
            ReleaseError::commit(format!("Cannot stage {}: {}", path.display(), e))
        })?;
    }

    index
        .write()
        .map_err(|e| ReleaseError::commit(format!("Cannot write index: {}", e)))
}

fn index_entry(path: &Path, id: Oid, mode: u32, size: usize) -> git2::IndexEntry {
    git2::IndexEntry {
        ctime: git2::IndexTime::new(0, 0),
        mtime: git2::IndexTime::new(0, 0),
        dev: 0,
        ino: 0,
        mode,
        uid: 0,
        gid: 0,
        file_size: size as u32,
        id,
        flags: 0,
        flags_extended: 0,
        path: path.to_string_lossy().replace('\\', "/").into_bytes(),
    }
}
