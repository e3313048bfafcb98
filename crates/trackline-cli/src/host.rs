//! Shared plumbing: argument groups, repository access, node construction,
//! and output.

use anyhow::{Context, Result, bail};
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use trackline::{Classification, TrackingStatusNode, ViewConfig};
use trackline_git::{BranchTracking, Git2History};
use tracing::debug;

#[derive(Args, Debug)]
pub struct RepoArgs {
    /// Path to the git repository
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,
}

#[derive(Args, Debug)]
pub struct TargetArgs {
    /// Local branch name
    pub branch: String,

    #[command(flatten)]
    pub repo: RepoArgs,

    /// Which side of a diverged branch to show (defaults to ahead)
    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionArg {
    Ahead,
    Behind,
}

impl From<DirectionArg> for Classification {
    fn from(direction: DirectionArg) -> Self {
        match direction {
            DirectionArg::Ahead => Classification::Ahead,
            DirectionArg::Behind => Classification::Behind,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct ViewArgs {
    /// Load view settings from a JSON file (flags override it)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Commits per page; 0 loads the whole range
    #[arg(long)]
    pub page_size: Option<usize>,

    /// List changed files instead of unpushed commits
    #[arg(long)]
    pub no_ahead_commits: bool,

    /// Omit date markers between commits
    #[arg(long)]
    pub no_dates: bool,

    /// Omit the files-summary entry
    #[arg(long)]
    pub no_files: bool,
}

impl ViewArgs {
    pub fn to_config(&self) -> Result<ViewConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {:?}", path))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("Invalid view config in {:?}", path))?
            }
            None => ViewConfig::default(),
        };

        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if self.no_ahead_commits {
            config.show_ahead_commits = false;
        }
        if self.no_dates {
            config.show_date_markers = false;
        }
        if self.no_files {
            config.show_files = false;
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub json: bool,
    pub pretty: bool,
}

impl Output {
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let text = if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        };
        println!("{}", text);
        Ok(())
    }
}

pub fn open_repo(args: &RepoArgs) -> Result<git2::Repository> {
    let repo_path = if args.repo.is_absolute() {
        args.repo.clone()
    } else {
        std::env::current_dir()?.join(&args.repo)
    };

    git2::Repository::open(&repo_path)
        .with_context(|| format!("Failed to open repository at {:?}", repo_path))
}

/// Build the node for a branch, picking the requested side of its status.
pub fn build_node(target: &TargetArgs, config: ViewConfig) -> Result<TrackingStatusNode> {
    let repo = open_repo(&target.repo)?;
    let tracking = trackline_git::tracking_status(&repo, &target.branch)?;
    let classification = pick_classification(&tracking, target.direction)?;
    debug!(branch = %target.branch, %classification, "building node");

    let unpublished = match classification {
        Classification::Ahead => Some(trackline_git::unpublished_commits(
            &repo,
            &tracking.status,
        )?),
        _ => None,
    };

    let node = TrackingStatusNode::new(
        tracking.status,
        classification,
        Arc::new(Git2History::new()),
        config,
    );
    Ok(match unpublished {
        Some(commits) => node.with_unpublished_commits(commits),
        None => node,
    })
}

fn pick_classification(
    tracking: &BranchTracking,
    direction: Option<DirectionArg>,
) -> Result<Classification> {
    let available = tracking.classifications();
    let Some(direction) = direction else {
        return available
            .first()
            .copied()
            .context("Branch has no tracking classification");
    };

    let wanted = Classification::from(direction);
    if !available.contains(&wanted) {
        bail!(
            "Branch '{}' is not {} (status: {})",
            tracking.status.reference,
            wanted,
            join(&available)
        );
    }
    Ok(wanted)
}

pub fn join(classifications: &[Classification]) -> String {
    classifications
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
