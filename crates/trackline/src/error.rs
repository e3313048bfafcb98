use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackingError>;

/// Errors surfaced by tracking-status operations.
///
/// Errors are `Clone` because a single in-flight log fetch hands the same
/// outcome to every caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    /// A collaborator (log, reference resolution, file summary) failed.
    #[error("fetch failed: {0}")]
    FetchFailed(String),

    /// A reference or parent commit could not be resolved.
    #[error("unresolvable reference: {0}")]
    Unresolvable(String),
}

impl TrackingError {
    pub fn fetch(err: impl std::fmt::Display) -> Self {
        TrackingError::FetchFailed(err.to_string())
    }
}
