use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Tracking status
// ============================================================================

/// Commit counts between a local branch and its upstream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AheadBehind {
    /// Commits on the local branch that the upstream lacks.
    pub ahead: usize,
    /// Commits on the upstream that the local branch lacks.
    pub behind: usize,
}

/// The relationship between a local branch and its upstream.
///
/// Produced by whoever inspects the repository and handed to a node as-is.
/// `upstream` is present for every [`Classification`] except
/// [`Classification::None`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingStatus {
    /// Local branch name (e.g. "main", "feature/foo").
    #[serde(rename = "ref")]
    pub reference: String,
    /// Path of the repository the branch lives in.
    pub repo_path: PathBuf,
    pub state: AheadBehind,
    /// Upstream name (e.g. "origin/main").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
}

impl TrackingStatus {
    pub fn new(
        reference: impl Into<String>,
        repo_path: impl Into<PathBuf>,
        state: AheadBehind,
        upstream: Option<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            repo_path: repo_path.into(),
            state,
            upstream,
        }
    }
}

/// Which side of the relationship a delta describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Local commits not yet pushed.
    Ahead,
    /// Upstream commits not yet pulled.
    Behind,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Ahead => write!(f, "ahead"),
            Direction::Behind => write!(f, "behind"),
        }
    }
}

/// The five mutually exclusive tracking states a node can represent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// The local branch has commits to push.
    Ahead,
    /// The upstream has commits to pull.
    Behind,
    /// Local branch and upstream point at the same history.
    Same,
    /// An upstream is configured but its reference does not exist.
    Missing,
    /// No upstream is configured.
    None,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Ahead => write!(f, "ahead"),
            Classification::Behind => write!(f, "behind"),
            Classification::Same => write!(f, "same"),
            Classification::Missing => write!(f, "missing"),
            Classification::None => write!(f, "none"),
        }
    }
}

impl std::str::FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ahead" => Ok(Classification::Ahead),
            "behind" => Ok(Classification::Behind),
            "same" => Ok(Classification::Same),
            "missing" => Ok(Classification::Missing),
            "none" => Ok(Classification::None),
            other => Err(format!("unknown classification '{}'", other)),
        }
    }
}

// ============================================================================
// Commits and logs
// ============================================================================

/// A commit as delivered by the log collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full hex id.
    pub id: String,
    /// Abbreviated id for display.
    pub short_id: String,
    /// First line of the commit message.
    pub subject: String,
    pub author: String,
    /// Commit time in the committer's recorded offset.
    pub date: DateTime<FixedOffset>,
    /// Known parent ids. A log restricted to a range may leave this empty for
    /// the range's boundary commit.
    #[serde(default)]
    pub parent_ids: Vec<String>,
}

impl Commit {
    /// The first parent, when the log delivered one.
    pub fn previous_id(&self) -> Option<&str> {
        self.parent_ids.first().map(String::as_str)
    }

    /// Calendar day of the commit in its own offset.
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Opaque continuation token embedded in a [`LogResult`].
///
/// Only the log collaborator that issued it can interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogCursor(String);

impl LogCursor {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One fetched (possibly partial) log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogResult {
    /// The revision expression the log was fetched for.
    pub reference: String,
    /// Commits, newest first.
    pub commits: Vec<Commit>,
    /// Whether the range holds more commits than delivered.
    pub has_more: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<LogCursor>,
    /// The limit the log was fetched with; `None` means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

/// Parameters for a first-page log fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogQuery {
    /// Revision expression: a range (`a..b`) or a single revision.
    pub reference: String,
    /// Maximum commits to deliver; `None` means unbounded.
    pub limit: Option<usize>,
}

impl LogQuery {
    pub fn new(reference: impl Into<String>, limit: Option<usize>) -> Self {
        Self {
            reference: reference.into(),
            limit,
        }
    }
}

/// Pagination state of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PaginationCursor {
    /// `None` means "use the configured page size".
    pub limit: Option<usize>,
}

// ============================================================================
// File comparisons
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
    Copied,
    TypeChanged,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            FileStatus::Added => "A",
            FileStatus::Modified => "M",
            FileStatus::Deleted => "D",
            FileStatus::Renamed => "R",
            FileStatus::Copied => "C",
            FileStatus::TypeChanged => "T",
        };
        write!(f, "{}", code)
    }
}

/// A single changed file within a delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    /// Previous path for renames and copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    pub status: FileStatus,
}

/// The aggregate file comparison of a delta, between two references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesComparison {
    pub repo_path: PathBuf,
    pub ref1: String,
    pub ref2: String,
    pub title: String,
    pub files: Vec<FileChange>,
}

/// Ids of commits that have not been pushed yet, oldest first.
///
/// Append order is publish order: the first element is the oldest unpublished
/// commit, and [`UnpublishedCommits::oldest`] relies on that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnpublishedCommits(Vec<String>);

impl UnpublishedCommits {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, id: impl Into<String>) {
        let id = id.into();
        if !self.0.contains(&id) {
            self.0.push(id);
        }
    }

    pub fn oldest(&self) -> Option<&str> {
        self.0.first().map(String::as_str)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.iter().any(|c| c == id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for UnpublishedCommits {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut commits = Self::new();
        for id in iter {
            commits.push(id);
        }
        commits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_round_trips_through_str() {
        for c in [
            Classification::Ahead,
            Classification::Behind,
            Classification::Same,
            Classification::Missing,
            Classification::None,
        ] {
            assert_eq!(c.to_string().parse::<Classification>().unwrap(), c);
        }
        assert!("sideways".parse::<Classification>().is_err());
    }

    #[test]
    fn test_unpublished_commits_keep_insertion_order() {
        let commits: UnpublishedCommits = ["c1", "c2", "c3", "c2"].into_iter().collect();
        assert_eq!(commits.len(), 3);
        assert_eq!(commits.oldest(), Some("c1"));
        assert_eq!(commits.iter().collect::<Vec<_>>(), vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn test_empty_unpublished_commits_have_no_oldest() {
        assert_eq!(UnpublishedCommits::new().oldest(), None);
    }

    #[test]
    fn test_commit_day_uses_own_offset() {
        let commit = Commit {
            id: "abc".into(),
            short_id: "abc".into(),
            subject: "late night".into(),
            author: "Alex".into(),
            date: DateTime::parse_from_rfc3339("2024-03-01T23:30:00-05:00").unwrap(),
            parent_ids: vec![],
        };
        assert_eq!(commit.day(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(commit.previous_id(), None);
    }

    #[test]
    fn test_tracking_status_serializes_ref_key() {
        let status = TrackingStatus::new(
            "main",
            "/tmp/repo",
            AheadBehind { ahead: 1, behind: 0 },
            Some("origin/main".into()),
        );
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["ref"], "main");
        assert_eq!(json["upstream"], "origin/main");
        assert_eq!(json["state"]["ahead"], 1);
    }
}
