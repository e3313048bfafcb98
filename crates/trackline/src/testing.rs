//! Scripted collaborators for unit tests.

use crate::error::{Result, TrackingError};
use crate::provider::{FilesSummary, GitHistory};
use crate::types::{
    Commit, Direction, FileChange, FileStatus, FilesComparison, LogCursor, LogQuery, LogResult,
    TrackingStatus,
};
use async_trait::async_trait;
use chrono::DateTime;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Semaphore;

pub(crate) fn commit(id: &str, date: &str, parents: &[&str]) -> Commit {
    Commit {
        id: id.to_string(),
        short_id: id.chars().take(7).collect(),
        subject: format!("commit {}", id),
        author: "Test User".to_string(),
        date: DateTime::parse_from_rfc3339(date).unwrap(),
        parent_ids: parents.iter().map(|p| p.to_string()).collect(),
    }
}

pub(crate) fn file(path: &str) -> FileChange {
    FileChange {
        path: path.to_string(),
        old_path: None,
        status: FileStatus::Modified,
    }
}

/// A history whose range logs page through a fixed commit list.
///
/// Range queries (`a..b`) page through `commits`; any other query is treated
/// as a lookup anchored at a single commit id.
pub(crate) struct FakeHistory {
    commits: Vec<Commit>,
    parents: HashMap<String, String>,
    files: Vec<FileChange>,
    comparison: Option<FilesComparison>,
    hold: Option<Semaphore>,
    fail: AtomicBool,
    stalled: AtomicBool,
    pub log_calls: AtomicUsize,
    pub more_calls: AtomicUsize,
    pub anchored_calls: AtomicUsize,
    pub queries: Mutex<Vec<LogQuery>>,
}

impl FakeHistory {
    pub fn new(commits: Vec<Commit>) -> Self {
        Self {
            commits,
            parents: HashMap::new(),
            files: Vec::new(),
            comparison: None,
            hold: None,
            fail: AtomicBool::new(false),
            stalled: AtomicBool::new(false),
            log_calls: AtomicUsize::new(0),
            more_calls: AtomicUsize::new(0),
            anchored_calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Range fetches wait until [`FakeHistory::release`] is called.
    pub fn held(mut self) -> Self {
        self.hold = Some(Semaphore::new(0));
        self
    }

    pub fn with_parent(mut self, id: &str, parent: &str) -> Self {
        self.parents.insert(id.to_string(), parent.to_string());
        self
    }

    pub fn with_files(mut self, files: Vec<FileChange>) -> Self {
        self.files = files;
        self
    }

    pub fn with_comparison(mut self, comparison: FilesComparison) -> Self {
        self.comparison = Some(comparison);
        self
    }

    pub fn release(&self) {
        if let Some(hold) = &self.hold {
            hold.add_permits(1);
        }
    }

    /// `log_more` answers with the log it was given.
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }

    pub fn more_calls(&self) -> usize {
        self.more_calls.load(Ordering::SeqCst)
    }

    /// Every release lets exactly one held fetch through.
    async fn wait_for_release(&self) -> Result<()> {
        if let Some(hold) = &self.hold {
            hold.acquire()
                .await
                .map_err(|e| TrackingError::FetchFailed(e.to_string()))?
                .forget();
        }
        Ok(())
    }

    fn check_failure(&self) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(TrackingError::FetchFailed("scripted failure".into()));
        }
        Ok(())
    }

    fn page(&self, reference: &str, mut commits: Vec<Commit>, limit: Option<usize>) -> LogResult {
        let start = commits.len();
        let end = limit.map_or(self.commits.len(), |l| (start + l).min(self.commits.len()));
        commits.extend_from_slice(&self.commits[start..end]);
        let has_more = end < self.commits.len();
        LogResult {
            reference: reference.to_string(),
            commits,
            has_more,
            cursor: has_more.then(|| LogCursor::new(end.to_string())),
            limit,
        }
    }
}

#[async_trait]
impl GitHistory for FakeHistory {
    async fn resolve_reference(&self, _repo_path: &Path, expr: &str) -> Result<Option<String>> {
        self.check_failure()?;
        if let Some(id) = expr.strip_suffix('^') {
            return Ok(self.parents.get(id).cloned());
        }
        Ok(self
            .commits
            .iter()
            .find(|c| c.id == expr)
            .map(|c| c.id.clone()))
    }

    async fn get_log(&self, _repo_path: &Path, query: &LogQuery) -> Result<Option<Arc<LogResult>>> {
        self.queries.lock().push(query.clone());

        if !query.reference.contains("..") {
            self.anchored_calls.fetch_add(1, Ordering::SeqCst);
            let Some(found) = self.commits.iter().find(|c| c.id == query.reference) else {
                return Ok(None);
            };
            let mut found = found.clone();
            if let Some(parent) = self.parents.get(&found.id) {
                found.parent_ids = vec![parent.clone()];
            }
            return Ok(Some(Arc::new(LogResult {
                reference: query.reference.clone(),
                commits: vec![found],
                has_more: false,
                cursor: None,
                limit: query.limit,
            })));
        }

        self.log_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_release().await?;
        self.check_failure()?;
        Ok(Some(Arc::new(self.page(
            &query.reference,
            Vec::new(),
            query.limit,
        ))))
    }

    async fn log_more(
        &self,
        _repo_path: &Path,
        log: &Arc<LogResult>,
        limit: Option<usize>,
    ) -> Result<Option<Arc<LogResult>>> {
        self.more_calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_release().await?;
        self.check_failure()?;
        if !log.has_more || self.stalled.load(Ordering::SeqCst) {
            return Ok(Some(log.clone()));
        }
        Ok(Some(Arc::new(self.page(
            &log.reference,
            log.commits.clone(),
            limit,
        ))))
    }

    fn files_summary(
        &self,
        _status: &TrackingStatus,
        _direction: Direction,
    ) -> Arc<dyn FilesSummary> {
        Arc::new(FakeFilesSummary {
            files: self.files.clone(),
            comparison: self.comparison.clone(),
        })
    }
}

pub(crate) struct FakeFilesSummary {
    pub files: Vec<FileChange>,
    pub comparison: Option<FilesComparison>,
}

#[async_trait]
impl FilesSummary for FakeFilesSummary {
    async fn files(&self) -> Result<Vec<FileChange>> {
        Ok(self.files.clone())
    }

    async fn files_comparison(&self) -> Result<Option<FilesComparison>> {
        Ok(self.comparison.clone())
    }
}
