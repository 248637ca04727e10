//! Per-connection delay budgets for a timing-driven router.
//!
//! Every sink of every net gets a `[min, max]` delay window and a target
//! inside it. Routing that lands inside the window meets both setup and hold;
//! the target is what the router aims for when it has a choice.

pub mod allocator;
pub mod congestion;
pub mod error;
pub mod oracle;
pub mod report;
pub mod set;
pub mod store;

#[cfg(test)]
mod test_util;

pub use allocator::criticality::CriticalityAllocator;
pub use allocator::pert::{PertAllocator, PertStats, PhaseStats};
pub use error::BudgetError;
pub use report::BudgetSummary;
pub use set::BudgetSet;
pub use store::{BudgetStore, BudgetTable};

use tdr_common::db::core::NetlistDB;
use tdr_common::db::lookup::PinLookup;
use tdr_common::db::table::NetPinTable;

/// Read-only inputs shared by every allocator.
///
/// `delays` holds the routing delay estimate of each connection, shaped like `db`.
#[derive(Clone, Copy)]
pub struct BudgetContext<'a> {
    pub db: &'a NetlistDB,
    pub lookup: &'a PinLookup,
    pub delays: &'a NetPinTable,
}

impl<'a> BudgetContext<'a> {
    pub fn new(db: &'a NetlistDB, lookup: &'a PinLookup, delays: &'a NetPinTable) -> Self {
        Self { db, lookup, delays }
    }

    pub(crate) fn validate(&self) -> Result<(), BudgetError> {
        if !self.delays.matches(self.db) {
            return Err(BudgetError::precondition(format!(
                "delay table has {} nets, netlist has {} (or pin counts differ)",
                self.delays.num_nets(),
                self.db.num_nets()
            )));
        }
        Ok(())
    }
}
