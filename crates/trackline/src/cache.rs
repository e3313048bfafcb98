//! Single-flight, paginated log cache owned by one tracking-status node.
//!
//! The slot moves through `Absent -> Fetching -> Present` and back to `Absent`
//! on invalidation or failure. Concurrent `get` callers attach to the pending
//! fetch; concurrent `load_more` callers attach to the pending extension.
//! A generation counter bumped by [`PaginatedLogCache::invalidate`] makes a
//! fetch that finishes after an invalidation drop its result instead of
//! storing it.

use crate::config::ViewConfig;
use crate::error::{Result, TrackingError};
use crate::provider::GitHistory;
use crate::range::RangeExpr;
use crate::types::{LogQuery, LogResult, PaginationCursor};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;

type SharedFetch = Shared<BoxFuture<'static, Result<Option<Arc<LogResult>>>>>;
type SharedExtend = Shared<BoxFuture<'static, Result<LoadMore>>>;

/// Outcome of [`PaginatedLogCache::load_more`].
#[derive(Debug, Clone)]
pub enum LoadMore {
    /// Nothing was fetched, or the fetch produced no new commits.
    Unchanged,
    /// The cached log was replaced by this longer one.
    Extended(Arc<LogResult>),
}

impl LoadMore {
    pub fn changed(&self) -> bool {
        matches!(self, LoadMore::Extended(_))
    }
}

enum CacheState {
    Absent,
    Fetching { generation: u64, task: SharedFetch },
    Present(Arc<LogResult>),
}

struct Slot {
    state: CacheState,
    generation: u64,
    cursor: PaginationCursor,
    page_size: usize,
    /// Id of the most recent extension task.
    extension: u64,
    extending: Option<(u64, SharedExtend)>,
}

struct Inner {
    history: Arc<dyn GitHistory>,
    repo_path: PathBuf,
    range: Option<RangeExpr>,
    slot: Mutex<Slot>,
    /// Serializes pagination against resets.
    gate: tokio::sync::Mutex<()>,
}

/// Cached log for one range. Cheap to clone; clones share the slot.
#[derive(Clone)]
pub struct PaginatedLogCache {
    inner: Arc<Inner>,
}

impl PaginatedLogCache {
    /// A cache for `range`. With no range, `get` always returns `Ok(None)`.
    pub fn new(
        history: Arc<dyn GitHistory>,
        repo_path: impl Into<PathBuf>,
        range: Option<RangeExpr>,
        page_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                history,
                repo_path: repo_path.into(),
                range,
                slot: Mutex::new(Slot {
                    state: CacheState::Absent,
                    generation: 0,
                    cursor: PaginationCursor::default(),
                    page_size,
                    extension: 0,
                    extending: None,
                }),
                gate: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn range(&self) -> Option<&RangeExpr> {
        self.inner.range.as_ref()
    }

    /// The pagination limit; `None` means the configured page size applies.
    pub fn limit(&self) -> Option<usize> {
        self.inner.slot.lock().cursor.limit
    }

    pub fn set_limit(&self, limit: Option<usize>) {
        self.inner.slot.lock().cursor.limit = limit;
    }

    pub fn set_page_size(&self, page_size: usize) {
        self.inner.slot.lock().page_size = page_size;
    }

    /// The cached log, without fetching.
    pub fn peek(&self) -> Option<Arc<LogResult>> {
        match &self.inner.slot.lock().state {
            CacheState::Present(log) => Some(log.clone()),
            CacheState::Absent | CacheState::Fetching { .. } => None,
        }
    }

    /// Return the cached log, fetching the first page if there is none.
    ///
    /// Callers arriving while a fetch is pending share its outcome, success or
    /// failure. A failed fetch leaves the slot empty so the next call retries.
    pub async fn get(&self) -> Result<Option<Arc<LogResult>>> {
        let Some(range) = &self.inner.range else {
            return Ok(None);
        };

        let (generation, task) = {
            let mut slot = self.inner.slot.lock();
            match &slot.state {
                CacheState::Present(log) => return Ok(Some(log.clone())),
                CacheState::Fetching { generation, task } => (*generation, task.clone()),
                CacheState::Absent => {
                    let limit = ViewConfig::limit_for(slot.cursor.limit.unwrap_or(slot.page_size));
                    let task = self.fetch(LogQuery::new(range.to_string(), limit));
                    let generation = slot.generation;
                    slot.state = CacheState::Fetching {
                        generation,
                        task: task.clone(),
                    };
                    (generation, task)
                }
            }
        };

        let result = task.clone().await;
        self.settle(generation, &task, &result);
        result
    }

    /// Drop the cached log. A fetch still in flight will not be stored.
    pub fn invalidate(&self) {
        let mut slot = self.inner.slot.lock();
        slot.generation += 1;
        slot.state = CacheState::Absent;
        debug!(generation = slot.generation, "log cache invalidated");
    }

    /// Invalidate after any pending `load_more` has finished.
    pub async fn reset(&self) {
        let _gate = self.inner.gate.lock().await;
        self.invalidate();
    }

    /// Fetch the next page and replace the cached log with the merged result.
    ///
    /// A no-op when nothing is cached or the cached log is complete. The page
    /// size is `page_size` or the configured default. On success the cursor
    /// limit becomes the new total commit count.
    ///
    /// The extension runs as its own task and completes even if every caller
    /// stops waiting, so the gate it holds is always released.
    pub async fn load_more(&self, page_size: Option<usize>) -> Result<LoadMore> {
        let task = {
            let mut slot = self.inner.slot.lock();
            match &slot.extending {
                Some((_, task)) => task.clone(),
                None => {
                    slot.extension += 1;
                    let id = slot.extension;
                    let handle = tokio::spawn(run_extension(self.inner.clone(), id, page_size));
                    let task = async move {
                        handle
                            .await
                            .unwrap_or_else(|e| Err(TrackingError::fetch(e)))
                    }
                    .boxed()
                    .shared();
                    slot.extending = Some((id, task.clone()));
                    task
                }
            }
        };

        task.await
    }

    fn fetch(&self, query: LogQuery) -> SharedFetch {
        let history = self.inner.history.clone();
        let repo_path = self.inner.repo_path.clone();
        async move {
            debug!(reference = %query.reference, limit = ?query.limit, "fetching log");
            history.get_log(&repo_path, &query).await
        }
        .boxed()
        .shared()
    }

    /// Store a finished fetch if the slot is still waiting on that exact fetch.
    fn settle(&self, generation: u64, task: &SharedFetch, result: &Result<Option<Arc<LogResult>>>) {
        let mut slot = self.inner.slot.lock();
        let pending = match &slot.state {
            CacheState::Fetching {
                generation: g,
                task: t,
            } => *g == generation && t.ptr_eq(task),
            CacheState::Absent => {
                if slot.generation != generation {
                    debug!(generation, "discarding stale log fetch");
                }
                false
            }
            CacheState::Present(_) => false,
        };
        if !pending {
            return;
        }

        slot.state = match result {
            Ok(Some(log)) => CacheState::Present(log.clone()),
            Ok(None) => CacheState::Absent,
            Err(e) => {
                debug!(error = %e, "log fetch failed");
                CacheState::Absent
            }
        };
    }
}

/// Extend the log, then retire this extension so the next `load_more` starts
/// a fresh one.
async fn run_extension(
    inner: Arc<Inner>,
    id: u64,
    page_size: Option<usize>,
) -> Result<LoadMore> {
    let result = extend(&inner, page_size).await;

    let mut slot = inner.slot.lock();
    if slot.extending.as_ref().is_some_and(|(current, _)| *current == id) {
        slot.extending = None;
    }
    result
}

async fn extend(inner: &Inner, page_size: Option<usize>) -> Result<LoadMore> {
    let _gate = inner.gate.lock().await;

    let (generation, current, page_size) = {
        let slot = inner.slot.lock();
        let CacheState::Present(log) = &slot.state else {
            return Ok(LoadMore::Unchanged);
        };
        if !log.has_more {
            return Ok(LoadMore::Unchanged);
        }
        (
            slot.generation,
            log.clone(),
            page_size.unwrap_or(slot.page_size),
        )
    };

    debug!(
        reference = %current.reference,
        loaded = current.commits.len(),
        page_size,
        "loading more commits"
    );
    let next = inner
        .history
        .log_more(&inner.repo_path, &current, ViewConfig::limit_for(page_size))
        .await?;
    let Some(next) = next else {
        return Ok(LoadMore::Unchanged);
    };
    if Arc::ptr_eq(&next, &current) {
        return Ok(LoadMore::Unchanged);
    }

    let mut slot = inner.slot.lock();
    let still_current = slot.generation == generation
        && matches!(&slot.state, CacheState::Present(log) if Arc::ptr_eq(log, &current));
    if !still_current {
        debug!("discarding page loaded for a replaced log");
        return Ok(LoadMore::Unchanged);
    }

    slot.cursor.limit = Some(next.commits.len());
    slot.state = CacheState::Present(next.clone());
    Ok(LoadMore::Extended(next))
}
