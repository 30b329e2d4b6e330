//! Reading, rewriting and restoring target files.

use crate::domain::{TargetFile, VersionIdentifier};
use crate::error::{ReleaseError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A target rewrite computed before anything touches the disk
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRewrite {
    /// Path relative to the repository root, as staged
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    /// 1-based line holding the assignment
    pub line: usize,
    pub previous_value: String,
    pub original: String,
    pub updated: String,
}

impl PlannedRewrite {
    pub fn is_noop(&self) -> bool {
        self.original == self.updated
    }
}

/// Read every target and compute its updated content.
///
/// Nothing is written; any missing file or missing/ambiguous assignment fails
/// the whole plan.
pub fn plan_rewrites(
    root: &Path,
    targets: &[TargetFile],
    version: &VersionIdentifier,
) -> Result<Vec<PlannedRewrite>> {
    targets
        .iter()
        .map(|target| {
            let absolute_path = root.join(target.path());
            let original = fs::read_to_string(&absolute_path)
                .map_err(|e| ReleaseError::target_io(target.path(), e))?;

            let span = target.locate(&original)?;
            let updated = target.rewrite(&original, version)?;

            Ok(PlannedRewrite {
                relative_path: target.path().to_path_buf(),
                absolute_path,
                line: span.line,
                previous_value: original[span.range].to_string(),
                original,
                updated,
            })
        })
        .collect()
}

/// Write all planned rewrites.
///
/// If a write fails the files already written are put back before the error
/// is returned.
pub fn write_rewrites(plans: &[PlannedRewrite]) -> Result<()> {
    for (written, plan) in plans.iter().enumerate() {
        if let Err(e) = fs::write(&plan.absolute_path, &plan.updated) {
            let cause = ReleaseError::target_io(&plan.relative_path, e);
            return match restore_originals(&plans[..written]) {
                Ok(()) => Err(cause),
                Err(rollback) => Err(ReleaseError::RollbackFailed {
                    cause: Box::new(cause),
                    rollback: vec![rollback],
                }),
            };
        }
    }
    Ok(())
}

/// Put the original content of every planned target back.
pub fn restore_originals(plans: &[PlannedRewrite]) -> Result<()> {
    for plan in plans.iter().rev() {
        fs::write(&plan.absolute_path, &plan.original)
            .map_err(|e| ReleaseError::target_io(&plan.relative_path, e))?;
    }
    Ok(())
}
