//! Turning a fetched delta into the ordered children of a tracking node.

use crate::config::ViewConfig;
use crate::provider::ParentLookup;
use crate::types::{Classification, Commit, Direction, FileChange, TrackingStatus};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

/// A child of a tracking-status node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TrackingChild {
    /// The aggregate file changes of the whole delta.
    FilesSummary(FilesSummaryEntry),
    /// One changed file, shown inline when an ahead node is flattened.
    File(FileChange),
    /// Marks the first commit of a calendar day.
    DateMarker { date: NaiveDate },
    Commit(Commit),
    /// More commits exist past the preceding entry.
    LoadMore(Continuation),
}

/// Identifies the files-summary delegate a child stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesSummaryEntry {
    #[serde(rename = "ref")]
    pub reference: String,
    pub upstream: String,
    pub direction: Direction,
}

/// Where the next page starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Continuation {
    /// The last commit shown before the continuation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

/// A page of commits ready to lay out.
#[derive(Debug, Clone, Copy)]
pub struct DeltaView<'a> {
    /// Commits, newest first, after any oldest-commit repair.
    pub commits: &'a [Commit],
    pub has_more: bool,
    pub files_summary: Option<&'a FilesSummaryEntry>,
}

/// Whether an ahead node shows its changed files in place of commits.
pub fn flattens_ahead(
    classification: Classification,
    status: &TrackingStatus,
    options: &ViewConfig,
) -> bool {
    classification == Classification::Ahead
        && !options.show_ahead_commits
        && status.upstream.is_some()
        && status.state.ahead > 0
}

/// Lay out the children of a node.
///
/// `flattened` carries the files-summary delegate's children and is only
/// consulted when [`flattens_ahead`] holds; the commit page is then not shown
/// at this level at all.
pub fn materialize(
    classification: Classification,
    status: &TrackingStatus,
    view: DeltaView<'_>,
    flattened: Option<Vec<FileChange>>,
    options: &ViewConfig,
) -> Vec<TrackingChild> {
    match classification {
        Classification::Same | Classification::Missing | Classification::None => Vec::new(),
        Classification::Behind => nested(view, options),
        Classification::Ahead => {
            if flattens_ahead(classification, status, options) {
                flattened
                    .unwrap_or_default()
                    .into_iter()
                    .map(TrackingChild::File)
                    .collect()
            } else {
                nested(view, options)
            }
        }
    }
}

/// `[files-summary, ...commits, continuation?]`
fn nested(view: DeltaView<'_>, options: &ViewConfig) -> Vec<TrackingChild> {
    let mut children = Vec::with_capacity(view.commits.len() + 2);

    if options.show_files
        && let Some(entry) = view.files_summary
    {
        children.push(TrackingChild::FilesSummary(entry.clone()));
    }

    if options.show_date_markers {
        children.extend(with_date_markers(view.commits));
    } else {
        children.extend(view.commits.iter().cloned().map(TrackingChild::Commit));
    }

    if view.has_more {
        children.push(TrackingChild::LoadMore(Continuation {
            after: view.commits.last().map(|c| c.id.clone()),
        }));
    }

    children
}

/// Commits in their given order, each day's first commit preceded by a marker.
pub fn with_date_markers(commits: &[Commit]) -> Vec<TrackingChild> {
    let mut children = Vec::with_capacity(commits.len() + 4);
    let mut current: Option<NaiveDate> = None;

    for commit in commits {
        let day = commit.day();
        if current != Some(day) {
            children.push(TrackingChild::DateMarker { date: day });
            current = Some(day);
        }
        children.push(TrackingChild::Commit(commit.clone()));
    }

    children
}

/// Make sure the oldest commit of an ahead page knows its parent.
///
/// The ahead range stops at the upstream, so the log can deliver its boundary
/// commit without a parent. When `lookup` cannot name one, the commit is read
/// again on its own and substituted. Lookup failures keep the original commit.
pub async fn resolve_oldest_commit(
    mut commits: Vec<Commit>,
    lookup: &dyn ParentLookup,
) -> Vec<Commit> {
    let Some(oldest) = commits.last() else {
        return commits;
    };

    match lookup.previous_id(oldest).await {
        Ok(Some(_)) => return commits,
        Ok(None) => {}
        Err(e) => {
            warn!(commit = %oldest.id, error = %e, "could not look up previous commit");
            return commits;
        }
    }

    let oldest_id = oldest.id.clone();
    match lookup.reload(&oldest_id).await {
        Ok(Some(reloaded)) => {
            debug!(commit = %oldest_id, "substituted oldest ahead commit");
            if let Some(last) = commits.last_mut() {
                *last = reloaded;
            }
        }
        Ok(None) => {}
        Err(e) => {
            warn!(commit = %oldest_id, error = %e, "could not reload oldest ahead commit");
        }
    }

    commits
}
