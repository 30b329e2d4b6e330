//! Terminal output for release progress.
//!
//! `format_*` functions build the text and are testable; `display_*`
//! functions print it.

use console::style;

use crate::boundary::ReleaseWarning;
use crate::domain::VersionIdentifier;
use crate::files::PlannedRewrite;
use crate::release::ReleaseOutcome;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print a non-fatal warning.
pub fn display_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("!").yellow().bold(), warning);
}

/// One line per target: `path:line  old -> new`
pub fn format_rewrite(plan: &PlannedRewrite, version: &VersionIdentifier) -> String {
    format!(
        "{}:{}  {} -> {}",
        plan.relative_path.display(),
        plan.line,
        plan.previous_value,
        version
    )
}

/// Display the version and the planned file changes.
pub fn display_plan(version: &VersionIdentifier, rewrites: &[PlannedRewrite]) {
    println!("\n{} {}", style("Version:").bold(), style(version).green());
    for plan in rewrites {
        println!("  {}", format_rewrite(plan, version));
    }
}

/// Summary line for a finished run
pub fn format_outcome(outcome: &ReleaseOutcome) -> String {
    match &outcome.published {
        Some(published) => {
            let hash = published.commit.to_string();
            format!(
                "Released {} (commit {}, tag {})",
                outcome.version,
                &hash[..hash.len().min(7)],
                published.tag
            )
        }
        None => format!("Dry run: {} would be released", outcome.version),
    }
}

/// Print warnings, planned changes, and the summary of a release run.
pub fn display_outcome(outcome: &ReleaseOutcome) {
    for warning in &outcome.warnings {
        display_warning(warning);
    }
    display_plan(&outcome.version, &outcome.rewrites);
    println!();
    display_success(&format_outcome(outcome));
}
