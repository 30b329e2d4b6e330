//! Record of completed release steps and how to undo them

use crate::error::ReleaseError;
use crate::files::{self, PlannedRewrite};
use crate::git::{IndexSnapshot, Repository};
use git2::Oid;

/// A mutating step that finished and may need to be undone
#[derive(Debug, Clone)]
pub(crate) enum CompletedStep {
    FilesWritten(Vec<PlannedRewrite>),
    Staged(Vec<IndexSnapshot>),
    Committed { previous_head: Oid },
}

impl CompletedStep {
    fn undo<R: Repository>(&self, repo: &R) -> crate::Result<()> {
        match self {
            CompletedStep::FilesWritten(plans) => files::restore_originals(plans),
            CompletedStep::Staged(snapshots) => repo.restore_index(snapshots),
            CompletedStep::Committed { previous_head } => repo.reset_head(*previous_head),
        }
    }
}

/// Completed steps in execution order
#[derive(Debug, Default)]
pub(crate) struct Journal {
    steps: Vec<CompletedStep>,
}

impl Journal {
    pub(crate) fn new() -> Self {
        Journal::default()
    }

    pub(crate) fn record(&mut self, step: CompletedStep) {
        self.steps.push(step);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.steps.len()
    }

    /// Undo every recorded step, newest first.
    ///
    /// All compensations are attempted even when one fails. Returns `cause`
    /// unchanged when everything was undone.
    pub(crate) fn compensate<R: Repository>(self, repo: &R, cause: ReleaseError) -> ReleaseError {
        let mut failures = Vec::new();

        for step in self.steps.iter().rev() {
            if let Err(e) = step.undo(repo) {
                failures.push(e);
            }
        }

        if failures.is_empty() {
            cause
        } else {
            ReleaseError::RollbackFailed {
                cause: Box::new(cause),
                rollback: failures,
            }
        }
    }
}
