//! Collaborator traits the engine consumes.
//!
//! A host supplies one [`GitHistory`] implementation (see `trackline-git` for
//! the libgit2-backed one). Every method may suspend and may fail with
//! [`TrackingError::FetchFailed`](crate::TrackingError::FetchFailed).

use crate::error::Result;
use crate::types::{
    Commit, Direction, FileChange, FilesComparison, LogQuery, LogResult, TrackingStatus,
};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Repository history access.
#[async_trait]
pub trait GitHistory: Send + Sync {
    /// Resolve a revision expression (e.g. `"<id>^"`) to a commit id.
    ///
    /// Returns `Ok(None)` when the expression names nothing.
    async fn resolve_reference(&self, repo_path: &Path, expr: &str) -> Result<Option<String>>;

    /// Fetch the first page of a log.
    async fn get_log(&self, repo_path: &Path, query: &LogQuery) -> Result<Option<Arc<LogResult>>>;

    /// Extend `log` by up to `limit` commits using its cursor.
    ///
    /// The returned log holds the previous commits followed by the new ones.
    /// Returning `Ok(None)` or the same `Arc` signals that nothing changed.
    async fn log_more(
        &self,
        repo_path: &Path,
        log: &Arc<LogResult>,
        limit: Option<usize>,
    ) -> Result<Option<Arc<LogResult>>>;

    /// The first parent of `commit` in the full history.
    async fn previous_id(&self, repo_path: &Path, commit: &Commit) -> Result<Option<String>> {
        let _ = repo_path;
        Ok(commit.previous_id().map(str::to_string))
    }

    /// The files-summary delegate for one side of a branch's tracking status.
    fn files_summary(&self, status: &TrackingStatus, direction: Direction) -> Arc<dyn FilesSummary>;
}

/// Aggregate file changes across a whole delta.
#[async_trait]
pub trait FilesSummary: Send + Sync {
    /// The changed files, which are also the delegate's children.
    async fn files(&self) -> Result<Vec<FileChange>>;

    /// The comparison describing the delta, if one can be built.
    async fn files_comparison(&self) -> Result<Option<FilesComparison>>;
}

/// Capability used to repair the oldest commit of an ahead page.
#[async_trait]
pub trait ParentLookup: Send + Sync {
    /// The commit's first parent, or `None` when it is not known.
    async fn previous_id(&self, commit: &Commit) -> Result<Option<String>>;

    /// Re-read a single commit with its full parentage.
    async fn reload(&self, id: &str) -> Result<Option<Commit>>;
}

/// [`ParentLookup`] over a [`GitHistory`].
///
/// `reload` issues a two-entry log anchored at the commit, so the commit is
/// read outside any range and keeps its parent.
pub struct HistoryParentLookup<'a> {
    history: &'a dyn GitHistory,
    repo_path: &'a Path,
}

impl<'a> HistoryParentLookup<'a> {
    pub fn new(history: &'a dyn GitHistory, repo_path: &'a Path) -> Self {
        Self { history, repo_path }
    }
}

#[async_trait]
impl ParentLookup for HistoryParentLookup<'_> {
    async fn previous_id(&self, commit: &Commit) -> Result<Option<String>> {
        self.history.previous_id(self.repo_path, commit).await
    }

    async fn reload(&self, id: &str) -> Result<Option<Commit>> {
        let log = self
            .history
            .get_log(self.repo_path, &LogQuery::new(id, Some(2)))
            .await?;
        Ok(log.and_then(|log| log.commits.first().cloned()))
    }
}
