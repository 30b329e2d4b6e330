use crate::domain::VersionIdentifier;
use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::ops::Range;
use std::path::{Path, PathBuf};

/// A file holding one `NAME = '<version>'` assignment that must follow releases
#[derive(Debug, Clone)]
pub struct TargetFile {
    path: PathBuf,
    variable: String,
    regex: Regex,
}

/// Location of the quoted version value inside a target's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueSpan {
    /// 1-based line number
    pub line: usize,
    /// Byte range of the value, quotes excluded
    pub range: Range<usize>,
}

impl TargetFile {
    /// Create a target for `variable` inside `path` (relative to the repository root)
    pub fn new(path: impl Into<PathBuf>, variable: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let variable = variable.into();

        if !is_identifier(&variable) {
            return Err(ReleaseError::config(format!(
                "Invalid variable name '{}' for target {}",
                variable,
                path.display()
            )));
        }

        // indentation and spacing around '=' are kept as found
        let pattern = format!(
            r#"^(?:[ \t]*){}[ \t]*=[ \t]*(?:'(?P<single>[^'\r\n]*)'|"(?P<double>[^"\r\n]*)")"#,
            regex::escape(&variable)
        );
        let regex = Regex::new(&pattern)
            .map_err(|e| ReleaseError::config(format!("Invalid target pattern: {}", e)))?;

        Ok(TargetFile {
            path,
            variable,
            regex,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Find the single assignment line in `content`
    pub fn locate(&self, content: &str) -> Result<ValueSpan> {
        let mut found = Vec::new();
        let mut offset = 0;

        for (idx, line) in content.split_inclusive('\n').enumerate() {
            let body = strip_line_ending(line);
            if let Some(caps) = self.regex.captures(body) {
                if let Some(value) = caps.name("single").or_else(|| caps.name("double")) {
                    found.push(ValueSpan {
                        line: idx + 1,
                        range: offset + value.start()..offset + value.end(),
                    });
                }
            }
            offset += line.len();
        }

        match found.len() {
            0 => Err(ReleaseError::PatternNotFound {
                path: self.path.clone(),
                variable: self.variable.clone(),
            }),
            1 => Ok(found.remove(0)),
            count => Err(ReleaseError::AmbiguousPattern {
                path: self.path.clone(),
                variable: self.variable.clone(),
                count,
            }),
        }
    }

    /// Replace the assigned value with `version`, leaving every other byte as is
    pub fn rewrite(&self, content: &str, version: &VersionIdentifier) -> Result<String> {
        let span = self.locate(content)?;
        let version = version.to_string();

        let mut updated = String::with_capacity(content.len() + version.len());
        updated.push_str(&content[..span.range.start]);
        updated.push_str(&version);
        updated.push_str(&content[span.range.end..]);
        Ok(updated)
    }
}

fn strip_line_ending(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(body) => body.strip_suffix('\r').unwrap_or(body),
        None => line,
    }
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first == '_' || first.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    }
}
