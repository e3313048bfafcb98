//! Aggregate file changes of one side of a tracking delta.

use crate::GitError;
use crate::history::with_repo;
use async_trait::async_trait;
use git2::{Delta, DiffDelta, DiffFindOptions, DiffOptions, ErrorCode, Repository};
use trackline::{
    Direction, FileChange, FileStatus, FilesComparison, FilesSummary, TrackingStatus,
};

/// The files a delta touches, diffed from the merge base to the side that
/// holds the delta's commits.
///
/// For ahead deltas `ref1` is the local branch and `ref2` the upstream; behind
/// deltas swap them.
#[derive(Debug, Clone)]
pub struct GitFilesSummary {
    status: TrackingStatus,
    direction: Direction,
}

impl GitFilesSummary {
    pub fn new(status: TrackingStatus, direction: Direction) -> Self {
        Self { status, direction }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    fn refs(&self) -> Option<(String, String)> {
        let upstream = self.status.upstream.clone()?;
        let reference = self.status.reference.clone();
        Some(match self.direction {
            Direction::Ahead => (reference, upstream),
            Direction::Behind => (upstream, reference),
        })
    }

    fn title(&self) -> String {
        match self.direction {
            Direction::Ahead => format!("Outgoing changes on {}", self.status.reference),
            Direction::Behind => format!("Incoming changes to {}", self.status.reference),
        }
    }
}

#[async_trait]
impl FilesSummary for GitFilesSummary {
    async fn files(&self) -> trackline::Result<Vec<FileChange>> {
        let Some((tip, other)) = self.refs() else {
            return Ok(Vec::new());
        };
        let files = with_repo(&self.status.repo_path, move |repo| {
            delta_files(repo, &tip, &other)
        })
        .await?;
        Ok(files)
    }

    async fn files_comparison(&self) -> trackline::Result<Option<FilesComparison>> {
        let Some((ref1, ref2)) = self.refs() else {
            return Ok(None);
        };
        let files = self.files().await?;
        Ok(Some(FilesComparison {
            repo_path: self.status.repo_path.clone(),
            ref1,
            ref2,
            title: self.title(),
            files,
        }))
    }
}

/// Files changed on `tip` since it diverged from `other`.
fn delta_files(repo: &Repository, tip: &str, other: &str) -> Result<Vec<FileChange>, GitError> {
    let tip = resolve_commit(repo, tip)?;
    let other = resolve_commit(repo, other)?;
    let base = repo.merge_base(tip.id(), other.id())?;
    let base_tree = repo.find_commit(base)?.tree()?;
    let tip_tree = tip.tree()?;

    let mut opts = DiffOptions::new();
    let mut diff = repo.diff_tree_to_tree(Some(&base_tree), Some(&tip_tree), Some(&mut opts))?;
    diff.find_similar(Some(DiffFindOptions::new().renames(true)))?;

    Ok(diff.deltas().filter_map(|d| file_change(&d)).collect())
}

fn resolve_commit<'r>(repo: &'r Repository, name: &str) -> Result<git2::Commit<'r>, GitError> {
    match repo.revparse_single(name) {
        Ok(obj) => Ok(obj.peel_to_commit()?),
        Err(e) if e.code() == ErrorCode::NotFound => Err(GitError::RefNotFound(name.to_string())),
        Err(e) => Err(e.into()),
    }
}

fn file_change(delta: &DiffDelta<'_>) -> Option<FileChange> {
    let status = match delta.status() {
        Delta::Added => FileStatus::Added,
        Delta::Modified => FileStatus::Modified,
        Delta::Deleted => FileStatus::Deleted,
        Delta::Renamed => FileStatus::Renamed,
        Delta::Copied => FileStatus::Copied,
        Delta::Typechange => FileStatus::TypeChanged,
        _ => return None,
    };

    let path = delta
        .new_file()
        .path()
        .or_else(|| delta.old_file().path())?
        .to_string_lossy()
        .into_owned();
    let old_path = match status {
        FileStatus::Renamed | FileStatus::Copied => delta
            .old_file()
            .path()
            .map(|p| p.to_string_lossy().into_owned()),
        _ => None,
    };

    Some(FileChange {
        path,
        old_path,
        status,
    })
}
