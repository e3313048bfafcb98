//! File comparisons for a tracking node.

use crate::error::{Result, TrackingError};
use crate::provider::{FilesSummary, GitHistory};
use crate::types::{Classification, FilesComparison, UnpublishedCommits};
use std::path::Path;
use tracing::debug;

/// Title of an ahead comparison, naming the reference being pushed.
pub fn push_title(reference: &str) -> String {
    format!("Changes to push from {}", reference)
}

/// Builds the comparison a tracking node exposes.
pub struct ComparisonAssembler<'a> {
    history: &'a dyn GitHistory,
    repo_path: &'a Path,
}

impl<'a> ComparisonAssembler<'a> {
    pub fn new(history: &'a dyn GitHistory, repo_path: &'a Path) -> Self {
        Self { history, repo_path }
    }

    /// The comparison for `classification`.
    ///
    /// Ahead nodes reframe the delegate's comparison as the diff of everything
    /// that will be pushed: from the parent of the oldest unpublished commit
    /// up to the delegate's first reference. Every other state returns the
    /// delegate's comparison unchanged, or `None` without a delegate.
    ///
    /// An unresolvable parent, an empty unpublished set, or a delegate with no
    /// comparison all yield `Ok(None)`.
    pub async fn assemble(
        &self,
        classification: Classification,
        unpublished: Option<&UnpublishedCommits>,
        delegate: Option<&dyn FilesSummary>,
    ) -> Result<Option<FilesComparison>> {
        match classification {
            Classification::Ahead => match self.assemble_ahead(unpublished, delegate).await {
                Err(TrackingError::Unresolvable(what)) => {
                    debug!(%what, "no push comparison available");
                    Ok(None)
                }
                other => other,
            },
            Classification::Behind
            | Classification::Same
            | Classification::Missing
            | Classification::None => match delegate {
                Some(delegate) => delegate.files_comparison().await,
                None => Ok(None),
            },
        }
    }

    async fn assemble_ahead(
        &self,
        unpublished: Option<&UnpublishedCommits>,
        delegate: Option<&dyn FilesSummary>,
    ) -> Result<Option<FilesComparison>> {
        let oldest = unpublished
            .and_then(UnpublishedCommits::oldest)
            .ok_or_else(|| TrackingError::Unresolvable("no unpublished commits".into()))?;

        let parent_expr = format!("{}^", oldest);
        let parent = self
            .history
            .resolve_reference(self.repo_path, &parent_expr)
            .await?
            .ok_or(TrackingError::Unresolvable(parent_expr))?;

        let Some(delegate) = delegate else {
            return Ok(None);
        };
        let Some(comparison) = delegate.files_comparison().await? else {
            return Ok(None);
        };

        Ok(Some(FilesComparison {
            title: push_title(&comparison.ref1),
            ref2: comparison.ref1,
            ref1: parent,
            repo_path: comparison.repo_path,
            files: comparison.files,
        }))
    }
}
