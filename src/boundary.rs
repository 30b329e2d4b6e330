use std::fmt;

/// Non-fatal conditions found while preparing a release.
/// These are reported to the user but do not stop the release.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// A tag with the computed name exists and will be moved to the release commit
    TagReplaced { tag: String, previous_target: String },
    /// An existing version tag is not lower than the computed version
    VersionNotNewer { version: String, latest_tag: String },
    /// Tracked files have uncommitted changes and the clean-tree check is disabled
    DirtyWorkingTree { paths: Vec<String> },
    /// A target already carries the computed version
    TargetUnchanged { path: String },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::TagReplaced {
                tag,
                previous_target,
            } => {
                let short_hash = if previous_target.len() > 7 {
                    &previous_target[..7]
                } else {
                    previous_target.as_str()
                };
                write!(
                    f,
                    "Tag '{}' already exists (at {}) and will be replaced",
                    tag, short_hash
                )
            }
            ReleaseWarning::VersionNotNewer {
                version,
                latest_tag,
            } => {
                write!(
                    f,
                    "Version {} is not newer than existing tag '{}'",
                    version, latest_tag
                )
            }
            ReleaseWarning::DirtyWorkingTree { paths } => {
                write!(f, "Uncommitted changes in: {}", paths.join(", "))
            }
            ReleaseWarning::TargetUnchanged { path } => {
                write!(f, "{} already carries this version", path)
            }
        }
    }
}
