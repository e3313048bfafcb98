use crate::cache::{LoadMore, PaginatedLogCache};
use crate::compare::ComparisonAssembler;
use crate::config::ViewConfig;
use crate::error::Result;
use crate::materialize::{
    DeltaView, FilesSummaryEntry, TrackingChild, flattens_ahead, materialize,
    resolve_oldest_commit,
};
use crate::provider::{FilesSummary, GitHistory, HistoryParentLookup};
use crate::range::delta_range;
use crate::types::{Classification, FilesComparison, TrackingStatus, UnpublishedCommits};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// One side of a branch's relationship with its upstream, as a tree node.
///
/// The status and classification are fixed at construction. Children are
/// fetched lazily and the commit log is cached until [`refresh`] resets it.
///
/// [`refresh`]: TrackingStatusNode::refresh
pub struct TrackingStatusNode {
    status: TrackingStatus,
    classification: Classification,
    history: Arc<dyn GitHistory>,
    config: RwLock<ViewConfig>,
    cache: PaginatedLogCache,
    files_summary: Option<Arc<dyn FilesSummary>>,
    unpublished: Option<UnpublishedCommits>,
    changes: watch::Sender<u64>,
}

impl TrackingStatusNode {
    pub fn new(
        status: TrackingStatus,
        classification: Classification,
        history: Arc<dyn GitHistory>,
        config: ViewConfig,
    ) -> Self {
        let range = delta_range(classification, &status);
        let files_summary = match (classification.direction(), &status.upstream) {
            (Some(direction), Some(_)) => Some(history.files_summary(&status, direction)),
            _ => None,
        };
        let cache = PaginatedLogCache::new(
            history.clone(),
            status.repo_path.clone(),
            range,
            config.page_size,
        );
        let (changes, _) = watch::channel(0);

        Self {
            status,
            classification,
            history,
            config: RwLock::new(config),
            cache,
            files_summary,
            unpublished: None,
            changes,
        }
    }

    /// Supply the unpublished commits (oldest first) used for the push comparison.
    pub fn with_unpublished_commits(mut self, commits: UnpublishedCommits) -> Self {
        self.unpublished = Some(commits);
        self
    }

    /// Stable key: repository, branch, and state.
    pub fn id(&self) -> String {
        format!(
            "{}:{}:{}",
            self.status.repo_path.display(),
            self.status.reference,
            self.classification
        )
    }

    pub fn status(&self) -> &TrackingStatus {
        &self.status
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    /// The current pagination limit; `None` means the page size applies.
    pub fn page_limit(&self) -> Option<usize> {
        self.cache.limit()
    }

    pub fn set_page_limit(&self, limit: Option<usize>) {
        self.cache.set_limit(limit);
    }

    pub fn config(&self) -> ViewConfig {
        self.config.read().clone()
    }

    pub fn set_config(&self, config: ViewConfig) {
        self.cache.set_page_size(config.page_size);
        *self.config.write() = config;
    }

    pub fn files_summary(&self) -> Option<Arc<dyn FilesSummary>> {
        self.files_summary.clone()
    }

    /// Change notifications: the value increments whenever children change.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// The node's children, fetching the first page of the log if needed.
    pub async fn get_children(&self) -> Result<Vec<TrackingChild>> {
        if !self.classification.has_delta() {
            return Ok(Vec::new());
        }

        let log = self.cache.get().await?;
        let options = self.config();

        let flattened = if flattens_ahead(self.classification, &self.status, &options) {
            match &self.files_summary {
                Some(summary) => Some(summary.files().await?),
                None => Some(Vec::new()),
            }
        } else {
            None
        };

        let commits = match &log {
            Some(log) if self.classification == Classification::Ahead && flattened.is_none() => {
                let lookup =
                    HistoryParentLookup::new(self.history.as_ref(), &self.status.repo_path);
                resolve_oldest_commit(log.commits.clone(), &lookup).await
            }
            Some(log) => log.commits.clone(),
            None => Vec::new(),
        };

        let entry = self.files_summary_entry();
        let view = DeltaView {
            commits: &commits,
            has_more: log.as_ref().is_some_and(|l| l.has_more),
            files_summary: entry.as_ref(),
        };
        Ok(materialize(
            self.classification,
            &self.status,
            view,
            flattened,
            &options,
        ))
    }

    /// Load the next page of commits. Returns whether the children changed.
    pub async fn load_more(&self, page_size: Option<usize>) -> Result<bool> {
        match self.cache.load_more(page_size).await? {
            LoadMore::Extended(log) => {
                debug!(node = %self.id(), commits = log.commits.len(), "loaded more commits");
                self.notify();
                Ok(true)
            }
            LoadMore::Unchanged => Ok(false),
        }
    }

    /// Refresh the node; with `reset`, drop the cached log so it is refetched.
    pub async fn refresh(&self, reset: bool) {
        if !reset {
            return;
        }
        self.cache.reset().await;
        self.notify();
    }

    /// The file comparison for the whole delta.
    pub async fn get_files_comparison(&self) -> Result<Option<FilesComparison>> {
        ComparisonAssembler::new(self.history.as_ref(), &self.status.repo_path)
            .assemble(
                self.classification,
                self.unpublished.as_ref(),
                self.files_summary.as_deref(),
            )
            .await
    }

    fn files_summary_entry(&self) -> Option<FilesSummaryEntry> {
        let direction = self.classification.direction()?;
        let upstream = self.status.upstream.clone()?;
        Some(FilesSummaryEntry {
            reference: self.status.reference.clone(),
            upstream,
            direction,
        })
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }
}
