//! Congestion feedback from the router.
//!
//! A net reported congested several iterations in a row has its min-budgets
//! loosened a little on every `relax` call, so the router is free to take a
//! shorter, less contested path for it.

use crate::set::BudgetSet;
use tdr_common::db::indices::NetId;
use tdr_common::timing::{NS, PS};

/// Consecutive congested iterations before a net is relaxed.
pub const CONGESTION_THRESHOLD: u32 = 3;

/// Amount removed from a min-budget per `relax` call.
pub const MIN_DELAY_DECREMENT: f64 = 1.0 * PS;

/// Min-budgets closer than this to their lower bound are left alone.
const RELAX_HEADROOM: f64 = 1.0 * NS;

impl BudgetSet {
    pub fn update_congested(&mut self, net: NetId) {
        if let BudgetSet::Active(store) = self {
            if let Some(count) = store.congestion.get_mut(net.index()) {
                *count += 1;
            }
        }
    }

    pub fn update_uncongested(&mut self, net: NetId) {
        if let BudgetSet::Active(store) = self {
            if let Some(count) = store.congestion.get_mut(net.index()) {
                *count = 0;
            }
        }
    }

    /// Lowers the min-budget of every sink on chronically congested nets.
    /// Returns the number of sinks loosened.
    pub fn relax(&mut self) -> usize {
        let BudgetSet::Active(store) = self else {
            return 0;
        };

        let mut relaxed = 0;
        for (inet, &count) in store.congestion.iter().enumerate() {
            if count < CONGESTION_THRESHOLD {
                continue;
            }
            let lower = store.lower_bound.row(NetId::new(inet));
            let min = &mut store.min.rows_mut()[inet];
            for ipin in 1..min.len() {
                if min[ipin] - lower[ipin] >= RELAX_HEADROOM {
                    min[ipin] -= MIN_DELAY_DECREMENT;
                    relaxed += 1;
                }
            }
        }
        log::debug!("Relaxed {} congested sink budgets", relaxed);
        relaxed
    }
}
