//! Owned storage for the five budget tables and the per-net congestion counters.

use crate::error::BudgetError;
use tdr_common::db::core::NetlistDB;
use tdr_common::db::indices::NetId;
use tdr_common::db::table::NetPinTable;
use tdr_common::timing::NS;

pub const DEFAULT_LOWER_BOUND: f64 = 0.0;
pub const DEFAULT_UPPER_BOUND: f64 = 100.0 * NS;

/// Targets sit at most this far above the minimum budget.
const TARGET_MIN_OFFSET: f64 = 0.1 * NS;

/// Which of the two adjustable tables an operation applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BudgetTable {
    Min,
    Max,
}

pub struct BudgetStore {
    pub(crate) lower_bound: NetPinTable,
    pub(crate) upper_bound: NetPinTable,
    pub(crate) min: NetPinTable,
    pub(crate) max: NetPinTable,
    pub(crate) target: NetPinTable,
    pub(crate) congestion: Vec<u32>,
}

impl BudgetStore {
    /// Zeroed tables shaped like `db`, with the default bounds on every sink
    /// and each max-budget starting at its lower bound.
    pub fn allocate(db: &NetlistDB) -> Self {
        let mut store = Self {
            lower_bound: NetPinTable::zeroed(db),
            upper_bound: NetPinTable::zeroed(db),
            min: NetPinTable::zeroed(db),
            max: NetPinTable::zeroed(db),
            target: NetPinTable::zeroed(db),
            congestion: vec![0; db.num_nets()],
        };

        for (inet, net) in db.nets.iter().enumerate() {
            let net_id = NetId::new(inet);
            for ipin in 1..net.pins.len() {
                store.lower_bound[(net_id, ipin)] = DEFAULT_LOWER_BOUND;
                store.upper_bound[(net_id, ipin)] = DEFAULT_UPPER_BOUND;
                store.max[(net_id, ipin)] = store.lower_bound[(net_id, ipin)];
            }
        }
        store
    }

    pub fn num_nets(&self) -> usize {
        self.min.num_nets()
    }

    pub fn lower_bound(&self) -> &NetPinTable {
        &self.lower_bound
    }

    pub fn upper_bound(&self) -> &NetPinTable {
        &self.upper_bound
    }

    pub fn min(&self) -> &NetPinTable {
        &self.min
    }

    pub fn max(&self) -> &NetPinTable {
        &self.max
    }

    pub fn target(&self) -> &NetPinTable {
        &self.target
    }

    pub fn congestion_count(&self, net: NetId) -> Option<u32> {
        self.congestion.get(net.index()).copied()
    }

    pub(crate) fn table(&self, which: BudgetTable) -> &NetPinTable {
        match which {
            BudgetTable::Min => &self.min,
            BudgetTable::Max => &self.max,
        }
    }

    pub(crate) fn table_mut(&mut self, which: BudgetTable) -> &mut NetPinTable {
        match which {
            BudgetTable::Min => &mut self.min,
            BudgetTable::Max => &mut self.max,
        }
    }

    /// Forces every sink value of the selected table into `[lower_bound, upper_bound]`.
    pub fn clamp(&mut self, which: BudgetTable) {
        let table = match which {
            BudgetTable::Min => &mut self.min,
            BudgetTable::Max => &mut self.max,
        };
        clamp_into(table, &self.lower_bound, &self.upper_bound);
    }

    /// Lowers min-budgets that exceed their max-budget. Max is never raised.
    pub fn enforce_min_le_max(&mut self) {
        for (min_row, max_row) in self.min.rows_mut().iter_mut().zip(self.max.rows()) {
            for (min, &max) in min_row.iter_mut().zip(max_row).skip(1) {
                if *min > max {
                    *min = max;
                }
            }
        }
    }

    /// Recomputes every target from the current min/max window.
    pub fn set_targets(&mut self) {
        let rows = self.target.rows_mut().iter_mut().zip(self.min.rows()).zip(self.max.rows());
        for ((target_row, min_row), max_row) in rows {
            for ipin in 1..target_row.len() {
                target_row[ipin] = delay_target(min_row[ipin], max_row[ipin]);
            }
        }
    }

    /// Checks `lower ≤ min ≤ max ≤ upper` and `min ≤ target ≤ max` on every sink.
    pub fn check_invariants(&self) -> Result<(), BudgetError> {
        for (net, ipin, lower) in self.lower_bound.sinks() {
            let upper = self.upper_bound[(net, ipin)];
            let min = self.min[(net, ipin)];
            let max = self.max[(net, ipin)];
            let target = self.target[(net, ipin)];

            let detail = if !(lower <= min && min <= max && max <= upper) {
                format!(
                    "window out of order: lower={lower:e} min={min:e} max={max:e} upper={upper:e}"
                )
            } else if !(min <= target && target <= max) {
                format!("target {target:e} outside [{min:e}, {max:e}]")
            } else {
                continue;
            };
            return Err(BudgetError::InvariantViolation { net, ipin, detail });
        }
        Ok(())
    }

    /// Fails unless every table and the congestion counters are shaped like `db`.
    pub(crate) fn check_shape(&self, db: &NetlistDB) -> Result<(), BudgetError> {
        let tables = [
            &self.lower_bound,
            &self.upper_bound,
            &self.min,
            &self.max,
            &self.target,
        ];
        if tables.iter().all(|t| t.matches(db)) && self.congestion.len() == db.num_nets() {
            return Ok(());
        }
        Err(BudgetError::precondition(format!(
            "budget store has {} nets, netlist has {} (or pin counts differ)",
            self.num_nets(),
            db.num_nets()
        )))
    }

    /// Fails unless `(net, ipin)` names a sink that exists in these tables.
    pub(crate) fn check_sink(&self, net: NetId, ipin: usize) -> Result<(), BudgetError> {
        if ipin == 0 {
            return Err(BudgetError::precondition(format!(
                "{net:?} pin 0 is the driver and has no budget"
            )));
        }
        match self.min.get(net, ipin) {
            Some(_) => Ok(()),
            None => Err(BudgetError::precondition(format!(
                "{net:?} pin {ipin} does not exist"
            ))),
        }
    }
}

pub(crate) fn clamp_into(table: &mut NetPinTable, lower: &NetPinTable, upper: &NetPinTable) {
    let rows = table.rows_mut().iter_mut().zip(lower.rows()).zip(upper.rows());
    for ((row, lo_row), hi_row) in rows {
        for ipin in 1..row.len() {
            row[ipin] = row[ipin].max(lo_row[ipin]).min(hi_row[ipin]);
        }
    }
}

/// Target delay inside a `[min, max]` window.
///
/// Biased toward the minimum so short-path (hold) risk dominates the choice
/// rather than splitting the window evenly.
pub fn delay_target(min: f64, max: f64) -> f64 {
    (0.5 * (min + max)).min(min + TARGET_MIN_OFFSET)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::fanout_db;

    #[test]
    fn allocate_sets_default_window() {
        let db = fanout_db(&[2, 1]);
        let store = BudgetStore::allocate(&db);
        for (net, ipin, lower) in store.lower_bound().sinks() {
            assert_eq!(lower, 0.0);
            assert_eq!(store.upper_bound()[(net, ipin)], 100.0 * NS);
            assert_eq!(store.max()[(net, ipin)], lower);
            assert_eq!(store.min()[(net, ipin)], 0.0);
        }
        assert_eq!(store.num_nets(), 2);
        assert_eq!(store.congestion_count(NetId::new(1)), Some(0));
    }

    #[test]
    fn clamp_forces_values_into_bounds() {
        let db = fanout_db(&[3]);
        let mut store = BudgetStore::allocate(&db);
        let n = NetId::new(0);
        store.max[(n, 1)] = -5.0 * NS;
        store.max[(n, 2)] = 500.0 * NS;
        store.max[(n, 3)] = 7.0 * NS;
        store.clamp(BudgetTable::Max);
        assert_eq!(store.max[(n, 1)], 0.0);
        assert_eq!(store.max[(n, 2)], 100.0 * NS);
        assert_eq!(store.max[(n, 3)], 7.0 * NS);
    }

    #[test]
    fn enforce_min_le_max_only_lowers_min() {
        let db = fanout_db(&[2]);
        let mut store = BudgetStore::allocate(&db);
        let n = NetId::new(0);
        store.max[(n, 1)] = 2.0 * NS;
        store.min[(n, 1)] = 3.0 * NS;
        store.max[(n, 2)] = 4.0 * NS;
        store.min[(n, 2)] = 1.0 * NS;
        store.enforce_min_le_max();
        assert_eq!(store.min[(n, 1)], 2.0 * NS);
        assert_eq!(store.max[(n, 1)], 2.0 * NS);
        assert_eq!(store.min[(n, 2)], 1.0 * NS);
    }

    #[test]
    fn target_is_biased_toward_min() {
        assert_eq!(delay_target(0.0, 100.0 * NS), 0.1 * NS);
        let t = delay_target(1.0 * NS, 1.1 * NS);
        assert!((t - 1.05 * NS).abs() < 1e-18);
        assert_eq!(delay_target(0.0, 0.0), 0.0);
    }

    #[test]
    fn invariant_check_names_offending_pin() {
        let db = fanout_db(&[1, 2]);
        let mut store = BudgetStore::allocate(&db);
        store.set_targets();
        assert!(store.check_invariants().is_ok());

        store.min[(NetId::new(1), 2)] = 1.0 * NS;
        match store.check_invariants() {
            Err(BudgetError::InvariantViolation { net, ipin, .. }) => {
                assert_eq!(net, NetId::new(1));
                assert_eq!(ipin, 2);
            }
            other => panic!("expected invariant violation, got {other:?}"),
        }
    }

    #[test]
    fn invariant_check_covers_target() {
        let db = fanout_db(&[1]);
        let mut store = BudgetStore::allocate(&db);
        store.max[(NetId::new(0), 1)] = 5.0 * NS;
        store.target[(NetId::new(0), 1)] = 6.0 * NS;
        assert!(store.check_invariants().is_err());
    }

    #[test]
    fn shape_check_compares_every_table_to_the_netlist() {
        let db = fanout_db(&[2, 1]);
        let mut store = BudgetStore::allocate(&db);
        assert!(store.check_shape(&db).is_ok());
        assert!(matches!(
            store.check_shape(&fanout_db(&[2])),
            Err(BudgetError::PreconditionViolation(_))
        ));
        assert!(store.check_shape(&fanout_db(&[2, 3])).is_err());

        store.target = NetPinTable::zeroed(&fanout_db(&[2, 2]));
        assert!(store.check_shape(&db).is_err());

        let mut store = BudgetStore::allocate(&db);
        store.congestion.pop();
        assert!(store.check_shape(&db).is_err());
    }

    #[test]
    fn driver_and_missing_pins_are_rejected() {
        let db = fanout_db(&[1]);
        let store = BudgetStore::allocate(&db);
        assert!(store.check_sink(NetId::new(0), 1).is_ok());
        assert!(matches!(
            store.check_sink(NetId::new(0), 0),
            Err(BudgetError::PreconditionViolation(_))
        ));
        assert!(store.check_sink(NetId::new(0), 2).is_err());
        assert!(store.check_sink(NetId::new(4), 1).is_err());
    }
}
