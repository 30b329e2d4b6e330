//! Release workflow orchestration
//!
//! [VersionReleaser] exposes each step of a release on its own
//! (compute, preflight, apply, publish) and [VersionReleaser::release] runs
//! them as one unit that undoes completed steps when a later one fails.

mod journal;

use crate::boundary::ReleaseWarning;
use crate::config::Config;
use crate::domain::{TargetFile, VersionIdentifier};
use crate::error::{ReleaseError, Result};
use crate::files::{self, PlannedRewrite};
use crate::git::{IndexSnapshot, Repository};
use git2::Oid;
use journal::{CompletedStep, Journal};
use std::path::Path;

/// Options for a single release run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ReleaseOptions {
    /// Compute, check and plan only; nothing is written
    pub dry_run: bool,
}

/// Commit and tag created by [VersionReleaser::publish]
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedRelease {
    pub commit: Oid,
    pub tag: String,
}

/// Result of a release run
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub version: VersionIdentifier,
    pub rewrites: Vec<PlannedRewrite>,
    pub warnings: Vec<ReleaseWarning>,
    /// `None` for a dry run
    pub published: Option<PublishedRelease>,
}

impl ReleaseOutcome {
    pub fn is_dry_run(&self) -> bool {
        self.published.is_none()
    }
}

/// Derives the next version from history and propagates it to the target files,
/// a commit and a tag.
pub struct VersionReleaser<R: Repository> {
    repo: R,
    config: Config,
    targets: Vec<TargetFile>,
}

impl<R: Repository> VersionReleaser<R> {
    /// Create a releaser over `repo`; the configuration is validated here
    pub fn new(repo: R, config: Config) -> Result<Self> {
        config.validate()?;
        let targets = config.target_files()?;
        Ok(VersionReleaser {
            repo,
            config,
            targets,
        })
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The version for the next release: `PREFIX.(commits + 1)`
    pub fn compute_version(&self) -> Result<VersionIdentifier> {
        let commits = self.repo.count_commits()?;
        Ok(VersionIdentifier::from_commit_count(
            self.config.version.prefix,
            commits,
        ))
    }

    /// Checks that must pass before anything is mutated.
    ///
    /// # Returns
    /// * `Ok(warnings)` - Non-fatal findings to report
    /// * `Err(DirtyWorkingTree)` - Tracked files are modified and a clean tree is required
    /// * `Err(TagFailed)` - The tag exists and replacing it is disabled
    pub fn preflight(&self, version: &VersionIdentifier) -> Result<Vec<ReleaseWarning>> {
        let mut warnings = Vec::new();

        let dirty = self.repo.dirty_paths()?;
        if !dirty.is_empty() {
            if self.config.release.require_clean_tree {
                return Err(ReleaseError::DirtyWorkingTree(dirty));
            }
            warnings.push(ReleaseWarning::DirtyWorkingTree { paths: dirty });
        }

        let tag = version.to_string();
        if let Some(existing) = self.repo.find_tag_oid(&tag)? {
            if !self.config.release.replace_existing_tag {
                return Err(ReleaseError::tag(format!(
                    "Tag '{}' already exists at {}",
                    tag, existing
                )));
            }
            warnings.push(ReleaseWarning::TagReplaced {
                tag: tag.clone(),
                previous_target: existing.to_string(),
            });
        }

        if let Some(latest) = self.latest_version_tag(&tag)? {
            if latest > *version {
                warnings.push(ReleaseWarning::VersionNotNewer {
                    version: tag,
                    latest_tag: latest.to_string(),
                });
            }
        }

        Ok(warnings)
    }

    /// Highest existing tag that is a plain version, ignoring `exclude`
    fn latest_version_tag(&self, exclude: &str) -> Result<Option<VersionIdentifier>> {
        Ok(self
            .repo
            .list_tags()?
            .iter()
            .filter(|name| name.as_str() != exclude)
            .filter_map(|name| VersionIdentifier::parse(name).ok())
            .max())
    }

    /// Compute the rewrite of every target without writing anything
    pub fn plan(&self, version: &VersionIdentifier) -> Result<Vec<PlannedRewrite>> {
        files::plan_rewrites(self.repo.root(), &self.targets, version)
    }

    /// Rewrite the version line of every target file.
    ///
    /// All targets are checked before the first write, so a missing pattern in
    /// any of them leaves every file untouched.
    pub fn apply_version(&self, version: &VersionIdentifier) -> Result<Vec<PlannedRewrite>> {
        let plans = self.plan(version)?;
        files::write_rewrites(&plans)?;
        Ok(plans)
    }

    /// Stage the targets, commit them and tag the commit.
    ///
    /// Only the targets go into the commit; anything else already staged stays
    /// staged. Completed steps are not undone when a later one fails; use
    /// [VersionReleaser::release] for that.
    pub fn publish(&self, version: &VersionIdentifier) -> Result<PublishedRelease> {
        self.stage_targets()?;
        let commit = self.commit_release(version)?;
        let tag = self.tag_release(version, commit)?;
        Ok(PublishedRelease { commit, tag })
    }

    /// Run a complete release: compute, preflight, apply, publish.
    ///
    /// When `rollback_on_failure` is set, a failure after the first mutation
    /// undoes every completed step before the error is returned.
    pub fn release(&self, options: ReleaseOptions) -> Result<ReleaseOutcome> {
        let version = self.compute_version()?;
        let mut warnings = self.preflight(&version)?;
        let rewrites = self.plan(&version)?;

        warnings.extend(
            rewrites
                .iter()
                .filter(|plan| plan.is_noop())
                .map(|plan| ReleaseWarning::TargetUnchanged {
                    path: plan.relative_path.display().to_string(),
                }),
        );

        if options.dry_run {
            return Ok(ReleaseOutcome {
                version,
                rewrites,
                warnings,
                published: None,
            });
        }

        let previous_head = self.repo.head_oid()?;
        let mut journal = Journal::new();

        match self.execute(&version, &rewrites, previous_head, &mut journal) {
            Ok(published) => Ok(ReleaseOutcome {
                version,
                rewrites,
                warnings,
                published: Some(published),
            }),
            Err(e) if self.config.release.rollback_on_failure => {
                Err(journal.compensate(&self.repo, e))
            }
            Err(e) => Err(e),
        }
    }

    fn execute(
        &self,
        version: &VersionIdentifier,
        rewrites: &[PlannedRewrite],
        previous_head: Oid,
        journal: &mut Journal,
    ) -> Result<PublishedRelease> {
        files::write_rewrites(rewrites)?;
        journal.record(CompletedStep::FilesWritten(rewrites.to_vec()));

        let snapshots = self.stage_targets()?;
        journal.record(CompletedStep::Staged(snapshots));

        let commit = self.commit_release(version)?;
        journal.record(CompletedStep::Committed { previous_head });

        let tag = self.tag_release(version, commit)?;
        Ok(PublishedRelease { commit, tag })
    }

    fn target_paths(&self) -> Vec<&Path> {
        self.targets.iter().map(TargetFile::path).collect()
    }

    fn stage_targets(&self) -> Result<Vec<IndexSnapshot>> {
        self.repo.stage_paths(&self.target_paths())
    }

    fn commit_release(&self, version: &VersionIdentifier) -> Result<Oid> {
        let message = self.config.release.commit_message_for(version);
        self.repo.commit(&message, &self.target_paths())
    }

    fn tag_release(&self, version: &VersionIdentifier, commit: Oid) -> Result<String> {
        let tag = version.to_string();
        self.repo
            .create_tag(&tag, commit, self.config.release.replace_existing_tag)?;
        Ok(tag)
    }
}
