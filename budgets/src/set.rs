//! The budget set a routing run holds: either no budgets at all, or the full
//! tables produced by one of the allocators.

use crate::BudgetContext;
use crate::allocator::criticality::CriticalityAllocator;
use crate::allocator::pert::PertAllocator;
use crate::error::BudgetError;
use crate::report::BudgetSummary;
use crate::store::BudgetStore;
use tdr_common::db::indices::NetId;
use tdr_common::db::table::NetPinTable;
use tdr_common::timing::{CriticalitySnapshot, TimingOracle};
use tdr_common::util::config::{BudgetAlgorithm, BudgetConfig};
use tdr_common::util::profiler::ScopedTimer;

const SHORT_PATH_EXP: f64 = 0.5;

pub enum BudgetSet {
    Inactive,
    Active(BudgetStore),
}

impl BudgetSet {
    /// Allocates budgets with the configured algorithm.
    ///
    /// `criticalities` is only read by the scale-delay algorithm; minimax
    /// queries `oracle` instead.
    pub fn load<O, C>(
        ctx: &BudgetContext<'_>,
        config: &BudgetConfig,
        oracle: &O,
        criticalities: &C,
    ) -> Result<BudgetSet, BudgetError>
    where
        O: TimingOracle,
        C: CriticalitySnapshot + ?Sized,
    {
        if config.algorithm == BudgetAlgorithm::Disable {
            log::info!("Route budgets disabled");
            return Ok(BudgetSet::Inactive);
        }
        ctx.validate()?;

        let _timer = ScopedTimer::new("Route budget load");
        let mut store = BudgetStore::allocate(ctx.db);
        match config.algorithm {
            BudgetAlgorithm::Minimax => {
                PertAllocator::new(oracle, &config.pert).allocate(ctx, &mut store)?;
            }
            BudgetAlgorithm::ScaleDelay => {
                CriticalityAllocator::from_config(config).allocate(ctx, criticalities, &mut store)?;
            }
            BudgetAlgorithm::Disable => return Ok(BudgetSet::Inactive),
        }

        let summary = BudgetSummary::of(&store);
        log::info!("Route budgets ({:?}): {}", config.algorithm, summary);

        let set = BudgetSet::Active(store);
        if let Some(path) = &config.dump_file {
            if let Err(e) = set.dump(path) {
                log::warn!("{}", e);
            }
        }
        Ok(set)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, BudgetSet::Active(_))
    }

    pub fn store(&self) -> Option<&BudgetStore> {
        match self {
            BudgetSet::Active(store) => Some(store),
            BudgetSet::Inactive => None,
        }
    }

    pub fn get_min(&self, net: NetId, ipin: usize) -> Result<f64, BudgetError> {
        self.lookup(net, ipin, |s| &s.min)
    }

    pub fn get_max(&self, net: NetId, ipin: usize) -> Result<f64, BudgetError> {
        self.lookup(net, ipin, |s| &s.max)
    }

    pub fn get_target(&self, net: NetId, ipin: usize) -> Result<f64, BudgetError> {
        self.lookup(net, ipin, |s| &s.target)
    }

    /// How tight the window is below the target: 0 when the target sits on
    /// the lower bound, approaching 1 as the lower bound falls away from it.
    pub fn get_short_path_criticality(&self, net: NetId, ipin: usize) -> Result<f64, BudgetError> {
        let target = self.get_target(net, ipin)?;
        if target == 0.0 {
            return Ok(0.0);
        }
        let lower = self.lookup(net, ipin, |s| &s.lower_bound)?;
        Ok(((target - lower) / target).powf(SHORT_PATH_EXP))
    }

    fn lookup(
        &self,
        net: NetId,
        ipin: usize,
        table: impl Fn(&BudgetStore) -> &NetPinTable,
    ) -> Result<f64, BudgetError> {
        let BudgetSet::Active(store) = self else {
            return Err(BudgetError::precondition("route budgets are not active"));
        };
        store.check_sink(net, ipin)?;
        Ok(table(store)[(net, ipin)])
    }
}
