//! Revision ranges and the mapping from tracking state to delta.

use crate::types::{AheadBehind, Classification, Direction, TrackingStatus};
use serde::{Deserialize, Serialize};

/// A two-dot revision range: commits reachable from `to` but not from `from`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RangeExpr {
    pub from: String,
    pub to: String,
}

impl std::fmt::Display for RangeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.from, self.to)
    }
}

/// Build the range holding the delta in `direction`.
///
/// - `Ahead`: commits on `reference` missing from `upstream` (`upstream..reference`)
/// - `Behind`: commits on `upstream` missing from `reference` (`reference..upstream`)
///
/// Both names must be non-empty; callers only reach this for states that
/// have an upstream.
pub fn resolve_range(direction: Direction, reference: &str, upstream: &str) -> RangeExpr {
    debug_assert!(!reference.is_empty(), "range requires a local ref");
    debug_assert!(!upstream.is_empty(), "range requires an upstream");

    match direction {
        Direction::Ahead => RangeExpr {
            from: upstream.to_string(),
            to: reference.to_string(),
        },
        Direction::Behind => RangeExpr {
            from: reference.to_string(),
            to: upstream.to_string(),
        },
    }
}

impl Classification {
    /// The delta direction, or `None` for states that never fetch a log.
    pub fn direction(self) -> Option<Direction> {
        match self {
            Classification::Ahead => Some(Direction::Ahead),
            Classification::Behind => Some(Direction::Behind),
            Classification::Same | Classification::Missing | Classification::None => None,
        }
    }

    /// Whether the state has a commit delta worth fetching.
    pub fn has_delta(self) -> bool {
        self.direction().is_some()
    }
}

/// The range a node with `classification` fetches, if any.
pub fn delta_range(classification: Classification, status: &TrackingStatus) -> Option<RangeExpr> {
    let direction = classification.direction()?;
    let upstream = status.upstream.as_deref()?;
    Some(resolve_range(direction, &status.reference, upstream))
}

/// Classify a branch's tracking status.
///
/// Returns every state a node should be built for: a branch that has diverged
/// is both `Ahead` and `Behind`, in that order.
pub fn classify(
    state: AheadBehind,
    upstream: Option<&str>,
    upstream_missing: bool,
) -> Vec<Classification> {
    if upstream.is_none() {
        return vec![Classification::None];
    }
    if upstream_missing {
        return vec![Classification::Missing];
    }

    let mut states = Vec::new();
    if state.ahead > 0 {
        states.push(Classification::Ahead);
    }
    if state.behind > 0 {
        states.push(Classification::Behind);
    }
    if states.is_empty() {
        states.push(Classification::Same);
    }
    states
}
