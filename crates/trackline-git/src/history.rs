//! [`GitHistory`] over libgit2.
//!
//! Every call opens the repository on the blocking pool. Log cursors are
//! walk offsets: a follow-up page re-walks the same expression and skips the
//! commits already delivered.

use crate::files::GitFilesSummary;
use crate::{GitError, commit_from_git};
use async_trait::async_trait;
use git2::{ErrorCode, Repository, Sort};
use std::path::Path;
use std::sync::Arc;
use trackline::{
    Commit, Direction, FilesSummary, GitHistory, LogCursor, LogQuery, LogResult, TrackingStatus,
};
use tracing::debug;

/// libgit2-backed history provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct Git2History;

impl Git2History {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl GitHistory for Git2History {
    async fn resolve_reference(
        &self,
        repo_path: &Path,
        expr: &str,
    ) -> trackline::Result<Option<String>> {
        let expr = expr.to_string();
        let resolved = with_repo(repo_path, move |repo| match repo.revparse_single(&expr) {
            Ok(obj) => Ok(Some(obj.peel_to_commit()?.id().to_string())),
            Err(e) if matches!(e.code(), ErrorCode::NotFound | ErrorCode::InvalidSpec) => Ok(None),
            Err(e) => Err(e.into()),
        })
        .await?;
        Ok(resolved)
    }

    async fn get_log(
        &self,
        repo_path: &Path,
        query: &LogQuery,
    ) -> trackline::Result<Option<Arc<LogResult>>> {
        let reference = query.reference.clone();
        let limit = query.limit;
        let (commits, has_more) =
            with_repo(repo_path, move |repo| walk(repo, &reference, 0, limit)).await?;
        debug!(reference = %query.reference, count = commits.len(), has_more, "log page");

        Ok(Some(Arc::new(LogResult {
            reference: query.reference.clone(),
            cursor: has_more.then(|| LogCursor::new(commits.len().to_string())),
            commits,
            has_more,
            limit,
        })))
    }

    async fn log_more(
        &self,
        repo_path: &Path,
        log: &Arc<LogResult>,
        limit: Option<usize>,
    ) -> trackline::Result<Option<Arc<LogResult>>> {
        let Some(cursor) = log.cursor.as_ref().filter(|_| log.has_more) else {
            return Ok(None);
        };
        let skip: usize = cursor
            .as_str()
            .parse()
            .map_err(|_| GitError::InvalidCursor(cursor.as_str().to_string()))?;

        let reference = log.reference.clone();
        let (more, has_more) =
            with_repo(repo_path, move |repo| walk(repo, &reference, skip, limit)).await?;
        if more.is_empty() {
            // The range shrank since the last page; what is shown is all there is.
            debug!(reference = %log.reference, "log exhausted early");
            return Ok(Some(Arc::new(LogResult {
                reference: log.reference.clone(),
                commits: log.commits.clone(),
                has_more: false,
                cursor: None,
                limit: None,
            })));
        }
        debug!(reference = %log.reference, added = more.len(), has_more, "log extended");

        let mut commits = log.commits.clone();
        commits.extend(more);
        Ok(Some(Arc::new(LogResult {
            reference: log.reference.clone(),
            cursor: has_more.then(|| LogCursor::new(commits.len().to_string())),
            limit: has_more.then_some(commits.len()),
            commits,
            has_more,
        })))
    }

    fn files_summary(
        &self,
        status: &TrackingStatus,
        direction: Direction,
    ) -> Arc<dyn FilesSummary> {
        Arc::new(GitFilesSummary::new(status.clone(), direction))
    }
}

/// Run `f` against the repository at `repo_path` on the blocking pool.
pub(crate) async fn with_repo<T, F>(repo_path: &Path, f: F) -> Result<T, GitError>
where
    F: FnOnce(&Repository) -> Result<T, GitError> + Send + 'static,
    T: Send + 'static,
{
    let repo_path = repo_path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let repo = Repository::open(&repo_path)?;
        f(&repo)
    })
    .await?
}

/// Walk `reference` newest first, skipping `skip` commits and taking up to
/// `limit`. Also reports whether more commits remain.
///
/// `reference` is either a range (`a..b`) or a single revision.
fn walk(
    repo: &Repository,
    reference: &str,
    skip: usize,
    limit: Option<usize>,
) -> Result<(Vec<Commit>, bool), GitError> {
    let mut walker = repo.revwalk()?;
    walker.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
    if reference.contains("..") {
        walker.push_range(reference)?;
    } else {
        let oid = repo.revparse_single(reference)?.peel_to_commit()?.id();
        walker.push(oid)?;
    }

    let mut commits = Vec::new();
    let mut has_more = false;
    for oid in walker.skip(skip) {
        let oid = oid?;
        if limit.is_some_and(|limit| commits.len() >= limit) {
            has_more = true;
            break;
        }
        commits.push(commit_from_git(&repo.find_commit(oid)?));
    }
    Ok((commits, has_more))
}
