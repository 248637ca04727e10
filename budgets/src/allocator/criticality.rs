//! Single-pass allocation that scales each connection's delay estimate by its
//! pin criticality. Critical connections get a max-budget close to their
//! current delay; non-critical ones are allowed to stretch toward the upper
//! bound. Min-budgets are left at zero.

use crate::BudgetContext;
use crate::error::BudgetError;
use crate::oracle::sink_criticality;
use crate::store::{BudgetStore, DEFAULT_LOWER_BOUND, DEFAULT_UPPER_BOUND};
use tdr_common::db::indices::NetId;
use tdr_common::timing::CriticalitySnapshot;
use tdr_common::util::config::BudgetConfig;

#[derive(Clone, Copy, Debug)]
pub struct CriticalityAllocator {
    max_criticality: f64,
    criticality_exp: f64,
}

impl CriticalityAllocator {
    pub fn new(max_criticality: f64, criticality_exp: f64) -> Self {
        Self {
            max_criticality,
            criticality_exp,
        }
    }

    pub fn from_config(config: &BudgetConfig) -> Self {
        Self::new(config.max_criticality, config.criticality_exp)
    }

    /// Shifts a raw criticality down by `1 - max_criticality`, raises it to the
    /// criticality exponent and caps it at `max_criticality`.
    pub fn reshape(&self, raw: f64) -> f64 {
        let shifted = (raw - (1.0 - self.max_criticality)).max(0.0);
        shifted.powf(self.criticality_exp).min(self.max_criticality)
    }

    pub fn allocate<C: CriticalitySnapshot + ?Sized>(
        &self,
        ctx: &BudgetContext<'_>,
        criticalities: &C,
        store: &mut BudgetStore,
    ) -> Result<(), BudgetError> {
        ctx.validate()?;
        store.check_shape(ctx.db)?;

        let mut unconstrained = 0usize;
        for (inet, net) in ctx.db.nets.iter().enumerate() {
            let net_id = NetId::new(inet);
            for ipin in 1..net.pins.len() {
                let crit = self.reshape(sink_criticality(criticalities, ctx, net_id, ipin));

                store.min[(net_id, ipin)] = 0.0;
                store.lower_bound[(net_id, ipin)] = DEFAULT_LOWER_BOUND;
                store.upper_bound[(net_id, ipin)] = DEFAULT_UPPER_BOUND;
                store.max[(net_id, ipin)] = if crit == 0.0 {
                    unconstrained += 1;
                    DEFAULT_UPPER_BOUND
                } else {
                    (ctx.delays[(net_id, ipin)] / crit).min(DEFAULT_UPPER_BOUND)
                };
            }
        }
        log::debug!("Scale-delay budgets: {} sinks left unconstrained", unconstrained);

        store.set_targets();
        store.check_invariants()
    }
}
