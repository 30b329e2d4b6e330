use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed `MAJOR.MINOR` part of every computed version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VersionPrefix {
    pub major: u64,
    pub minor: u64,
}

impl VersionPrefix {
    pub fn new(major: u64, minor: u64) -> Self {
        VersionPrefix { major, minor }
    }
}

impl FromStr for VersionPrefix {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 2 {
            return Err(ReleaseError::config(format!(
                "Invalid version prefix: '{}' - expected MAJOR.MINOR",
                s
            )));
        }

        let major = parse_component(parts[0], "major", s)?;
        let minor = parse_component(parts[1], "minor", s)?;

        Ok(VersionPrefix { major, minor })
    }
}

impl TryFrom<String> for VersionPrefix {
    type Error = ReleaseError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<VersionPrefix> for String {
    fn from(prefix: VersionPrefix) -> Self {
        prefix.to_string()
    }
}

impl fmt::Display for VersionPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

fn parse_component(part: &str, name: &str, whole: &str) -> Result<u64> {
    let invalid = || {
        ReleaseError::config(format!(
            "Invalid {} component '{}' in version prefix '{}'",
            name, part, whole
        ))
    };

    // u64::from_str accepts a leading '+', which is not a version digit
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    part.parse::<u64>().map_err(|_| invalid())
}

/// A `MAJOR.MINOR.PATCH` release identifier derived from history length
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionIdentifier {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionIdentifier {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        VersionIdentifier {
            major,
            minor,
            patch,
        }
    }

    /// The patch number is one more than the number of commits in history,
    /// so the release commit created for this version makes the count match.
    pub fn from_commit_count(prefix: VersionPrefix, commit_count: usize) -> Self {
        VersionIdentifier {
            major: prefix.major,
            minor: prefix.minor,
            patch: commit_count as u64 + 1,
        }
    }

    pub fn prefix(&self) -> VersionPrefix {
        VersionPrefix::new(self.major, self.minor)
    }

    /// Parse a plain `X.Y.Z` release version; pre-release and build metadata are rejected
    pub fn parse(s: &str) -> Result<Self> {
        let version = semver::Version::parse(s.trim())
            .map_err(|e| ReleaseError::version(format!("Invalid version '{}': {}", s, e)))?;
        VersionIdentifier::try_from(version)
    }
}

impl TryFrom<semver::Version> for VersionIdentifier {
    type Error = ReleaseError;

    fn try_from(version: semver::Version) -> Result<Self> {
        if !version.pre.is_empty() || !version.build.is_empty() {
            return Err(ReleaseError::version(format!(
                "'{}' is not a plain MAJOR.MINOR.PATCH version",
                version
            )));
        }
        Ok(VersionIdentifier::new(
            version.major,
            version.minor,
            version.patch,
        ))
    }
}

impl From<VersionIdentifier> for semver::Version {
    fn from(id: VersionIdentifier) -> Self {
        semver::Version::new(id.major, id.minor, id.patch)
    }
}

impl FromStr for VersionIdentifier {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        VersionIdentifier::parse(s)
    }
}

impl fmt::Display for VersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
