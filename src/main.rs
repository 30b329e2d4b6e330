use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use update_version::config;
use update_version::git::{Git2Repository, Repository};
use update_version::ui;
use update_version::{ReleaseOptions, VersionReleaser};

#[derive(clap::Parser)]
#[command(
    name = "update-version",
    version,
    about = "Derive the release version from the commit count, write it into the source tree, commit and tag"
)]
struct Args {
    #[arg(
        short = 'C',
        long,
        default_value = ".",
        help = "Repository to release (searched upwards from this path)"
    )]
    repo: PathBuf,

    #[arg(short, long, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(long, help = "Print the computed version and exit")]
    print: bool,

    #[arg(long, help = "Preview what would happen without making changes")]
    dry_run: bool,

    #[arg(long, help = "Fail instead of moving an existing tag with the same name")]
    no_replace_tag: bool,

    #[arg(long, help = "Release even if tracked files have uncommitted changes")]
    allow_dirty: bool,

    #[arg(long, help = "Leave completed steps in place when a later step fails")]
    no_rollback: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        ui::display_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let repo = Git2Repository::open(&args.repo)?;

    let mut config = config::load_config(args.config.as_deref(), repo.root())
        .context("Error loading config")?;
    if args.no_replace_tag {
        config.release.replace_existing_tag = false;
    }
    if args.allow_dirty {
        config.release.require_clean_tree = false;
    }
    if args.no_rollback {
        config.release.rollback_on_failure = false;
    }

    let releaser = VersionReleaser::new(repo, config)?;

    if args.print {
        println!("{}", releaser.compute_version()?);
        return Ok(());
    }

    if args.dry_run {
        ui::display_status("Dry run: no files, commits or tags will be changed");
    }
    ui::display_status(&format!(
        "Releasing {}",
        releaser.repository().root().display()
    ));

    let outcome = releaser.release(ReleaseOptions {
        dry_run: args.dry_run,
    })?;

    ui::display_outcome(&outcome);
    Ok(())
}
