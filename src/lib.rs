pub mod boundary;
pub mod config;
pub mod domain;
pub mod error;
pub mod files;
pub mod git;
pub mod release;
pub mod ui;

pub use error::{ReleaseError, Result};
pub use release::{ReleaseOptions, ReleaseOutcome, VersionReleaser};
