#![doc = include_str!("../README.md")]

mod files;
mod history;

pub use files::GitFilesSummary;
pub use history::Git2History;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{BranchType, ErrorCode, Oid, Repository};
use std::path::PathBuf;
use trackline::{
    AheadBehind, Classification, Commit, TrackingError, TrackingStatus, UnpublishedCommits,
    classify,
};

// ============================================================================
// Errors
// ============================================================================

/// Failures inside repository access.
#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git: {0}")]
    Git(#[from] git2::Error),

    #[error("repository task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("reference not found: {0}")]
    RefNotFound(String),

    #[error("invalid log cursor: {0}")]
    InvalidCursor(String),
}

impl From<GitError> for TrackingError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::RefNotFound(name) => TrackingError::Unresolvable(name),
            other => TrackingError::fetch(other),
        }
    }
}

// ============================================================================
// Tracking status
// ============================================================================

/// A branch's tracking status plus what classification needs beyond it.
#[derive(Debug, Clone)]
pub struct BranchTracking {
    pub status: TrackingStatus,
    /// The upstream is configured but its reference does not exist.
    pub upstream_missing: bool,
    /// Short hex of the local tip.
    pub head_short: String,
}

impl BranchTracking {
    /// The states to build nodes for; a diverged branch yields two.
    pub fn classifications(&self) -> Vec<Classification> {
        classify(
            self.status.state,
            self.status.upstream.as_deref(),
            self.upstream_missing,
        )
    }
}

/// Read the tracking status of a local branch.
///
/// Counts are zero when there is no upstream or when its reference is missing.
pub fn tracking_status(repo: &Repository, branch: &str) -> Result<BranchTracking> {
    let local = repo
        .find_branch(branch, BranchType::Local)
        .with_context(|| format!("Branch '{}' not found", branch))?;
    let refname = local
        .get()
        .name()
        .context("Branch reference name is not valid UTF-8")?
        .to_string();
    let local_oid = local.get().peel_to_commit()?.id();
    let repo_path = repo_path(repo);
    let head_short = short_oid(local_oid);

    let Some(upstream_ref) = configured_upstream(repo, branch, &refname)? else {
        return Ok(BranchTracking {
            status: TrackingStatus::new(branch, repo_path, AheadBehind::default(), None),
            upstream_missing: false,
            head_short,
        });
    };
    let upstream = shorten_ref(&upstream_ref);

    let upstream_oid = match repo.find_reference(&upstream_ref) {
        Ok(reference) => reference.peel_to_commit()?.id(),
        Err(e) if e.code() == ErrorCode::NotFound => {
            return Ok(BranchTracking {
                status: TrackingStatus::new(
                    branch,
                    repo_path,
                    AheadBehind::default(),
                    Some(upstream),
                ),
                upstream_missing: true,
                head_short,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let (ahead, behind) = repo
        .graph_ahead_behind(local_oid, upstream_oid)
        .with_context(|| format!("Failed to compare '{}' with '{}'", branch, upstream))?;

    Ok(BranchTracking {
        status: TrackingStatus::new(
            branch,
            repo_path,
            AheadBehind { ahead, behind },
            Some(upstream),
        ),
        upstream_missing: false,
        head_short,
    })
}

/// Tracking status of every local branch, sorted by name.
pub fn list_tracking(repo: &Repository) -> Result<Vec<BranchTracking>> {
    let mut branches = Vec::new();

    for branch_result in repo.branches(Some(BranchType::Local))? {
        let (branch, _) = branch_result?;
        let Some(name) = branch.name()? else {
            continue;
        };
        branches.push(tracking_status(repo, name)?);
    }

    branches.sort_by(|a, b| a.status.reference.cmp(&b.status.reference));
    Ok(branches)
}

/// Commits on the branch that its upstream lacks, oldest first.
pub fn unpublished_commits(
    repo: &Repository,
    status: &TrackingStatus,
) -> Result<UnpublishedCommits> {
    let Some(upstream) = &status.upstream else {
        return Ok(UnpublishedCommits::new());
    };

    let head = repo
        .revparse_single(&status.reference)
        .with_context(|| format!("Failed to resolve '{}'", status.reference))?
        .peel_to_commit()?;
    let base = match repo.revparse_single(upstream) {
        Ok(obj) => obj.peel_to_commit()?.id(),
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(UnpublishedCommits::new()),
        Err(e) => return Err(e.into()),
    };

    let mut walker = repo.revwalk()?;
    walker.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;
    walker.push(head.id())?;
    walker.hide(base)?;

    let mut commits = UnpublishedCommits::new();
    for oid in walker {
        commits.push(oid?.to_string());
    }
    Ok(commits)
}

// ============================================================================
// Private helpers
// ============================================================================

/// Full name of the branch's configured upstream, if one is configured.
fn configured_upstream(repo: &Repository, branch: &str, refname: &str) -> Result<Option<String>> {
    let config = repo.config()?;
    let merge = match config.get_string(&format!("branch.{}.merge", branch)) {
        Ok(merge) => merge,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    // The remote may be gone; fall back to the merge ref so the branch still
    // reports an upstream, which then classifies as missing.
    match repo.branch_upstream_name(refname) {
        Ok(buf) => Ok(Some(buf.as_str().unwrap_or(&merge).to_string())),
        Err(_) => Ok(Some(merge)),
    }
}

fn shorten_ref(name: &str) -> String {
    name.strip_prefix("refs/remotes/")
        .or_else(|| name.strip_prefix("refs/heads/"))
        .unwrap_or(name)
        .to_string()
}

fn repo_path(repo: &Repository) -> PathBuf {
    repo.workdir().unwrap_or_else(|| repo.path()).to_path_buf()
}

pub(crate) fn commit_from_git(commit: &git2::Commit) -> Commit {
    let subject = commit
        .message()
        .unwrap_or("")
        .lines()
        .next()
        .unwrap_or("")
        .to_string();

    Commit {
        id: commit.id().to_string(),
        short_id: short_oid(commit.id()),
        subject,
        author: commit.author().name().unwrap_or("unknown").to_string(),
        date: commit_date(commit.time()),
        parent_ids: commit.parent_ids().map(|p| p.to_string()).collect(),
    }
}

fn commit_date(time: git2::Time) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    DateTime::<Utc>::from_timestamp(time.seconds(), 0)
        .unwrap_or_default()
        .with_timezone(&offset)
}

fn short_oid(oid: Oid) -> String {
    safe_prefix(&oid.to_string(), 8)
}

/// Return the first `n` characters of a string, safe for any UTF-8 content.
fn safe_prefix(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use git2::{BranchType, Oid, Repository};

    pub fn init_temp_repo() -> (tempfile::TempDir, Repository) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();

        // Configure author for commits
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        (dir, repo)
    }

    pub fn create_commit(
        repo: &Repository,
        message: &str,
        file_name: &str,
        content: &str,
        parent: Option<Oid>,
    ) -> Oid {
        let mut index = repo.index().unwrap();
        let file_path = repo.workdir().unwrap().join(file_name);
        std::fs::write(&file_path, content).unwrap();
        index.add_path(std::path::Path::new(file_name)).unwrap();
        index.write().unwrap();
        let tree_id = index.write_tree().unwrap();
        let tree = repo.find_tree(tree_id).unwrap();
        let sig = repo.signature().unwrap();
        let parent = parent.map(|oid| repo.find_commit(oid).unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    /// Linear history of `n` commits on the current branch, oldest first.
    pub fn linear_history(repo: &Repository, n: usize) -> Vec<Oid> {
        let mut oids = Vec::new();
        for i in 0..n {
            let oid = create_commit(
                repo,
                &format!("commit {}", i + 1),
                &format!("file{}.txt", i + 1),
                &format!("v{}", i + 1),
                oids.last().copied(),
            );
            oids.push(oid);
        }
        oids
    }

    pub fn head_branch(repo: &Repository) -> String {
        repo.head().unwrap().shorthand().unwrap().to_string()
    }

    /// Point `origin/<branch>` at `upstream` and make it the branch's upstream.
    pub fn track(repo: &Repository, branch: &str, upstream: Oid) {
        if repo.find_remote("origin").is_err() {
            repo.remote("origin", "https://example.com/org/repo.git").unwrap();
        }
        repo.reference(
            &format!("refs/remotes/origin/{}", branch),
            upstream,
            true,
            "test upstream",
        )
        .unwrap();
        repo.find_branch(branch, BranchType::Local)
            .unwrap()
            .set_upstream(Some(&format!("origin/{}", branch)))
            .unwrap();
    }
}
