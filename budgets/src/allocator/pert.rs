//! Iterative min-max PERT allocation.
//!
//! Max-budgets are grown against setup slack, then min-budgets are shrunk
//! against hold slack. Each round re-runs timing on the budgets themselves and
//! hands every sink a share of its path's slack proportional to how much of
//! the path delay its own connection accounts for.

use crate::BudgetContext;
use crate::error::BudgetError;
use crate::oracle::{sink_path_delay, sink_slack};
use crate::report;
use crate::store::{BudgetStore, BudgetTable};
use rayon::prelude::*;
use std::path::Path;
use tdr_common::db::indices::NetId;
use tdr_common::db::table::NetPinTable;
use tdr_common::timing::{AnalysisMode, NS, PS, TimingOracle, TimingSnapshot};
use tdr_common::util::config::PertConfig;
use tdr_common::util::profiler::ScopedTimer;

/// Floor applied to min-budgets after the hold phase.
const MIN_BUDGET_FLOOR: f64 = -1.0 * NS;

#[derive(Clone, Copy, Debug, PartialEq)]
enum PinAdjustment {
    /// No finite slack reached this sink; leave the budget alone.
    Skip,
    /// No path delay to distribute; the budget drops to zero.
    Reset,
    Shift(f64),
}

impl PinAdjustment {
    fn magnitude(self) -> f64 {
        match self {
            PinAdjustment::Shift(d) => d.abs(),
            PinAdjustment::Skip | PinAdjustment::Reset => 0.0,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PhaseStats {
    pub iterations: usize,
    /// Largest |adjustment| of the final round, in seconds.
    pub last_change: f64,
    pub converged: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PertStats {
    pub setup: PhaseStats,
    pub hold: PhaseStats,
}

pub struct PertAllocator<'a, O: TimingOracle> {
    oracle: &'a O,
    config: &'a PertConfig,
}

impl<'a, O: TimingOracle> PertAllocator<'a, O> {
    pub fn new(oracle: &'a O, config: &'a PertConfig) -> Self {
        Self { oracle, config }
    }

    pub fn allocate(
        &self,
        ctx: &BudgetContext<'_>,
        store: &mut BudgetStore,
    ) -> Result<PertStats, BudgetError> {
        ctx.validate()?;
        store.check_shape(ctx.db)?;
        let _timer = ScopedTimer::new("PERT budget allocation");

        let setup = self.run_phase(ctx, store, AnalysisMode::Setup);
        self.dump_temporary(store.max(), "setup");

        store.min = store.max.clone();
        let hold = self.run_phase(ctx, store, AnalysisMode::Hold);

        apply_floor(&mut store.min, MIN_BUDGET_FLOOR);
        let snapshot = self.oracle.refresh(&store.min);
        let change = adjust_budgets(&snapshot, ctx, &mut store.min, AnalysisMode::Hold);
        log::debug!("PERT hold touch-up pass: max change {:.1} ps", change / PS);
        apply_floor(&mut store.min, MIN_BUDGET_FLOOR);
        store.clamp(BudgetTable::Min);
        store.enforce_min_le_max();
        self.dump_temporary(store.min(), "hold");

        store.set_targets();
        store.check_invariants()?;

        log::info!(
            "PERT budgets: setup {} iters ({}), hold {} iters ({})",
            setup.iterations,
            if setup.converged { "converged" } else { "capped" },
            hold.iterations,
            if hold.converged { "converged" } else { "capped" },
        );
        Ok(PertStats { setup, hold })
    }

    fn run_phase(
        &self,
        ctx: &BudgetContext<'_>,
        store: &mut BudgetStore,
        mode: AnalysisMode,
    ) -> PhaseStats {
        let (which, _timer) = match mode {
            AnalysisMode::Setup => (BudgetTable::Max, ScopedTimer::new("PERT setup phase")),
            AnalysisMode::Hold => (BudgetTable::Min, ScopedTimer::new("PERT hold phase")),
        };
        let threshold = self.config.convergence_threshold_ps * PS;
        let mut stats = PhaseStats {
            last_change: f64::INFINITY,
            converged: true,
            ..PhaseStats::default()
        };

        while stats.iterations < self.config.min_iterations || stats.last_change > threshold {
            if stats.iterations >= self.config.max_iterations {
                log::warn!(
                    "PERT {:?} phase hit the {} iteration cap (last change {:.1} ps)",
                    mode,
                    self.config.max_iterations,
                    stats.last_change / PS
                );
                stats.converged = false;
                break;
            }

            let snapshot = self.oracle.refresh(store.table(which));
            stats.last_change = adjust_budgets(&snapshot, ctx, store.table_mut(which), mode);
            store.clamp(which);
            stats.iterations += 1;

            log::debug!(
                "PERT {:?} iter {}: max change {:.1} ps",
                mode,
                stats.iterations,
                stats.last_change / PS
            );
        }
        stats
    }

    fn dump_temporary(&self, table: &NetPinTable, label: &str) {
        let Some(dir) = &self.config.temporary_dump_dir else {
            return;
        };
        let path = Path::new(dir).join(format!("temporary_budgets_{label}.txt"));
        if let Err(e) = report::dump_temporary(table, &path) {
            log::warn!("{}", e);
        }
    }
}

/// One slack-distribution pass over every sink. Returns the largest |adjustment|.
///
/// All adjustments are computed from the snapshot and delay table before any
/// budget is written, so nets are processed in parallel.
fn adjust_budgets<S: TimingSnapshot>(
    snapshot: &S,
    ctx: &BudgetContext<'_>,
    budgets: &mut NetPinTable,
    mode: AnalysisMode,
) -> f64 {
    let adjustments: Vec<Vec<PinAdjustment>> = ctx
        .db
        .nets
        .par_iter()
        .enumerate()
        .map(|(inet, net)| {
            let net_id = NetId::new(inet);
            (1..net.pins.len())
                .map(|ipin| pin_adjustment(snapshot, ctx, net_id, ipin, mode))
                .collect()
        })
        .collect();

    let max_change = adjustments
        .par_iter()
        .flat_map_iter(|row| row.iter().map(|a| a.magnitude()))
        .reduce(|| 0.0, f64::max);

    for (inet, row) in adjustments.iter().enumerate() {
        let net_id = NetId::new(inet);
        for (k, adjustment) in row.iter().enumerate() {
            let slot = &mut budgets[(net_id, k + 1)];
            match *adjustment {
                PinAdjustment::Skip => {}
                PinAdjustment::Reset => *slot = 0.0,
                PinAdjustment::Shift(d) => *slot += d,
            }
        }
    }
    max_change
}

fn pin_adjustment<S: TimingSnapshot>(
    snapshot: &S,
    ctx: &BudgetContext<'_>,
    net: NetId,
    ipin: usize,
    mode: AnalysisMode,
) -> PinAdjustment {
    let path_delay = sink_path_delay(snapshot, ctx, net, ipin, mode);
    if path_delay <= 0.0 {
        return PinAdjustment::Reset;
    }
    let Some(slack) = sink_slack(snapshot, ctx, net, ipin, mode) else {
        return PinAdjustment::Skip;
    };

    let share = ctx.delays[(net, ipin)] * slack / path_delay;
    match mode {
        AnalysisMode::Setup => PinAdjustment::Shift(share),
        AnalysisMode::Hold => PinAdjustment::Shift(-share),
    }
}

fn apply_floor(table: &mut NetPinTable, floor: f64) {
    for row in table.rows_mut() {
        for v in row.iter_mut().skip(1) {
            *v = v.max(floor);
        }
    }
}
