//! Single-clock static timing analysis over a [`TimingGraph`].
//!
//! Setup analysis propagates the latest arrival forward and the earliest
//! required time backward from the clock period at every endpoint. Hold
//! analysis propagates the earliest arrival and the latest required time from
//! the hold requirement. Every tag remembers the node it came from: arrival
//! tags carry the launching source, required tags the capturing endpoint.

use crate::error::TimingError;
use crate::graph::TimingGraph;
use tdr_common::db::indices::{AtomPinId, TimingNodeId};
use tdr_common::db::lookup::PinLookup;
use tdr_common::db::table::NetPinTable;
use tdr_common::timing::{
    AnalysisMode, CriticalitySnapshot, NS, TimingOracle, TimingSnapshot, TimingTag,
};
use tdr_common::util::config::TimingConfig;

pub struct StaEngine<'a> {
    graph: &'a TimingGraph,
    lookup: &'a PinLookup,
    clock_period: f64,
    hold_time: f64,
}

impl<'a> StaEngine<'a> {
    /// The graph must already be levelized.
    pub fn new(
        graph: &'a TimingGraph,
        lookup: &'a PinLookup,
        config: &TimingConfig,
    ) -> Result<Self, TimingError> {
        if !graph.is_levelized() {
            return Err(TimingError::CombinationalLoop {
                unvisited: graph.node_count() - graph.order().len(),
            });
        }
        Ok(Self {
            graph,
            lookup,
            clock_period: config.clock_period_ns * NS,
            hold_time: config.hold_time_ns * NS,
        })
    }

    pub fn analyze(&self, delays: &NetPinTable) -> StaSnapshot {
        let setup = self.propagate(delays, AnalysisMode::Setup);
        let hold = self.propagate(delays, AnalysisMode::Hold);

        let num_atoms = self.lookup.num_atom_pins();
        let mut setup_slack = Vec::with_capacity(num_atoms);
        let mut hold_slack = Vec::with_capacity(num_atoms);
        let mut criticality = Vec::with_capacity(num_atoms);

        for i in 0..num_atoms {
            let node = self.lookup.tnode(AtomPinId::new(i)).index();
            let s = setup.slack(node, AnalysisMode::Setup);
            setup_slack.push(s);
            hold_slack.push(hold.slack(node, AnalysisMode::Hold));
            criticality.push(if s.is_finite() && self.clock_period > 0.0 {
                (1.0 - s / self.clock_period).clamp(0.0, 1.0)
            } else {
                0.0
            });
        }

        StaSnapshot {
            setup,
            hold,
            setup_slack,
            hold_slack,
            criticality,
        }
    }

    fn propagate(&self, delays: &NetPinTable, mode: AnalysisMode) -> ModeTags {
        let n = self.graph.node_count();
        let mut arrival: Vec<Option<TimingTag>> = vec![None; n];
        let mut required: Vec<Option<TimingTag>> = vec![None; n];

        // Setup keeps the latest arrival and the earliest requirement, hold the opposite.
        let keep_arrival = |new: f64, old: f64| match mode {
            AnalysisMode::Setup => new > old,
            AnalysisMode::Hold => new < old,
        };
        let keep_required = |new: f64, old: f64| match mode {
            AnalysisMode::Setup => new < old,
            AnalysisMode::Hold => new > old,
        };

        for &node in self.graph.order() {
            if self.graph.is_source(node) {
                arrival[node.index()] = Some(TimingTag::new(0.0, Some(node)));
                continue;
            }
            let mut best: Option<TimingTag> = None;
            for edge in self.graph.fanin(node) {
                let Some(from) = arrival[edge.from.index()] else {
                    continue;
                };
                let t = from.time + edge.delay.resolve(delays);
                if best.is_none_or(|b| keep_arrival(t, b.time)) {
                    best = Some(TimingTag::new(t, from.origin));
                }
            }
            arrival[node.index()] = best;
        }

        let endpoint_required = match mode {
            AnalysisMode::Setup => self.clock_period,
            AnalysisMode::Hold => self.hold_time,
        };

        for &node in self.graph.order().iter().rev() {
            if self.graph.is_endpoint(node) {
                if !self.graph.is_source(node) {
                    required[node.index()] = Some(TimingTag::new(endpoint_required, Some(node)));
                }
                continue;
            }
            let mut best: Option<TimingTag> = None;
            for edge in self.graph.fanout(node) {
                let Some(to) = required[edge.to.index()] else {
                    continue;
                };
                let t = to.time - edge.delay.resolve(delays);
                if best.is_none_or(|b| keep_required(t, b.time)) {
                    best = Some(TimingTag::new(t, to.origin));
                }
            }
            required[node.index()] = best;
        }

        ModeTags {
            arrival: arrival.into_iter().map(|t| t.into_iter().collect()).collect(),
            required: required.into_iter().map(|t| t.into_iter().collect()).collect(),
        }
    }
}

impl TimingOracle for StaEngine<'_> {
    type Snapshot = StaSnapshot;

    fn refresh(&self, delays: &NetPinTable) -> StaSnapshot {
        self.analyze(delays)
    }
}

struct ModeTags {
    arrival: Vec<Vec<TimingTag>>,
    required: Vec<Vec<TimingTag>>,
}

impl ModeTags {
    fn slack(&self, node: usize, mode: AnalysisMode) -> f64 {
        match (self.arrival[node].first(), self.required[node].first()) {
            (Some(a), Some(r)) => match mode {
                AnalysisMode::Setup => r.time - a.time,
                AnalysisMode::Hold => a.time - r.time,
            },
            _ => f64::INFINITY,
        }
    }
}

/// Immutable result of one [`StaEngine::analyze`] call.
pub struct StaSnapshot {
    setup: ModeTags,
    hold: ModeTags,
    setup_slack: Vec<f64>,
    hold_slack: Vec<f64>,
    criticality: Vec<f64>,
}

impl StaSnapshot {
    fn tags(&self, mode: AnalysisMode) -> &ModeTags {
        match mode {
            AnalysisMode::Setup => &self.setup,
            AnalysisMode::Hold => &self.hold,
        }
    }

    /// Worst finite setup slack over all atom pins, or `None` if nothing is timed.
    pub fn worst_setup_slack(&self) -> Option<f64> {
        self.setup_slack
            .iter()
            .copied()
            .filter(|s| s.is_finite())
            .min_by(f64::total_cmp)
    }
}

impl TimingSnapshot for StaSnapshot {
    fn slack(&self, pin: AtomPinId, mode: AnalysisMode) -> f64 {
        let table = match mode {
            AnalysisMode::Setup => &self.setup_slack,
            AnalysisMode::Hold => &self.hold_slack,
        };
        table.get(pin.index()).copied().unwrap_or(f64::INFINITY)
    }

    fn arrival_tags(&self, node: TimingNodeId, mode: AnalysisMode) -> &[TimingTag] {
        self.tags(mode)
            .arrival
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn required_tags(&self, node: TimingNodeId, mode: AnalysisMode) -> &[TimingTag] {
        self.tags(mode)
            .required
            .get(node.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

impl CriticalitySnapshot for StaSnapshot {
    fn criticality(&self, pin: AtomPinId) -> f64 {
        self.criticality.get(pin.index()).copied().unwrap_or(0.0)
    }
}
