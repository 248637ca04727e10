//! Contract between the budget engine and whatever static timing analyser the
//! flow is built on.
//!
//! The engine never sees a timing graph. It hands a delay table to a
//! [`TimingOracle`], gets back an immutable [`TimingSnapshot`] and only asks
//! that snapshot for slacks and arrival/required tags.

use crate::db::indices::{AtomPinId, TimingNodeId};
use crate::db::table::NetPinTable;

/// One nanosecond, in the seconds-based units used by every delay table.
pub const NS: f64 = 1e-9;
/// One picosecond.
pub const PS: f64 = 1e-12;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnalysisMode {
    Setup,
    Hold,
}

/// An arrival or required time together with the node it was propagated from.
///
/// For required tags the origin is the capturing endpoint; `None` means the
/// analyser could not attribute the time to a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimingTag {
    pub time: f64,
    pub origin: Option<TimingNodeId>,
}

impl TimingTag {
    pub fn new(time: f64, origin: Option<TimingNodeId>) -> Self {
        Self { time, origin }
    }
}

/// Result of one full timing update. Shared read-only across worker threads.
pub trait TimingSnapshot: Sync {
    /// Slack at an atom pin. `f64::INFINITY` marks an untimed pin.
    fn slack(&self, pin: AtomPinId, mode: AnalysisMode) -> f64;

    /// Arrival tags at `node`. Empty when the node is unconstrained in `mode`.
    fn arrival_tags(&self, node: TimingNodeId, mode: AnalysisMode) -> &[TimingTag];

    /// Required tags at `node`. Empty when the node is unconstrained in `mode`.
    fn required_tags(&self, node: TimingNodeId, mode: AnalysisMode) -> &[TimingTag];
}

/// Builds timing snapshots from routing delay estimates.
///
/// `refresh` must not depend on earlier calls: two refreshes with different
/// tables yield independent snapshots.
pub trait TimingOracle {
    type Snapshot: TimingSnapshot;

    fn refresh(&self, delays: &NetPinTable) -> Self::Snapshot;
}

/// Per-atom-pin setup criticality in `[0, 1]`.
pub trait CriticalitySnapshot {
    fn criticality(&self, pin: AtomPinId) -> f64;
}

/// Tag with the smallest time, if any.
pub fn min_tag(tags: &[TimingTag]) -> Option<&TimingTag> {
    tags.iter().min_by(|a, b| a.time.total_cmp(&b.time))
}

/// Tag with the largest time, if any.
pub fn max_tag(tags: &[TimingTag]) -> Option<&TimingTag> {
    tags.iter().max_by(|a, b| a.time.total_cmp(&b.time))
}
