#![doc = include_str!("../README.md")]

mod cache;
mod compare;
mod config;
mod error;
mod materialize;
mod node;
mod provider;
mod range;
mod types;

#[cfg(test)]
mod testing;

pub use cache::{LoadMore, PaginatedLogCache};
pub use compare::{ComparisonAssembler, push_title};
pub use config::ViewConfig;
pub use error::{Result, TrackingError};
pub use materialize::{
    Continuation, DeltaView, FilesSummaryEntry, TrackingChild, flattens_ahead, materialize,
    resolve_oldest_commit, with_date_markers,
};
pub use node::TrackingStatusNode;
pub use provider::{FilesSummary, GitHistory, HistoryParentLookup, ParentLookup};
pub use range::{RangeExpr, classify, delta_range, resolve_range};
pub use types::{
    AheadBehind, Classification, Commit, Direction, FileChange, FileStatus, FilesComparison,
    LogCursor, LogQuery, LogResult, PaginationCursor, TrackingStatus, UnpublishedCommits,
};
