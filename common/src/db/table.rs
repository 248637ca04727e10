use crate::db::core::NetlistDB;
use crate::db::indices::NetId;
use std::ops::{Index, IndexMut};

/// A value per (net, pin), laid out net-major.
///
/// Row `n` has one slot per pin of net `n`, driver included, so pin indices
/// line up with `NetData::pins`. The driver slot is carried but never read by
/// budget code.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct NetPinTable {
    rows: Vec<Vec<f64>>,
}

impl NetPinTable {
    pub fn zeroed(db: &NetlistDB) -> Self {
        Self::filled(db, 0.0)
    }

    pub fn filled(db: &NetlistDB, value: f64) -> Self {
        Self {
            rows: db.nets.iter().map(|n| vec![value; n.pins.len()]).collect(),
        }
    }

    /// Builds a table directly from rows. Used by callers that already hold a
    /// per-net delay layout.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Self {
        Self { rows }
    }

    pub fn num_nets(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, net: NetId, ipin: usize) -> Option<f64> {
        self.rows.get(net.index()).and_then(|r| r.get(ipin)).copied()
    }

    #[inline]
    pub fn row(&self, net: NetId) -> &[f64] {
        &self.rows[net.index()]
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<f64>] {
        &mut self.rows
    }

    /// True when the table has exactly the net/pin shape of `db`.
    pub fn matches(&self, db: &NetlistDB) -> bool {
        self.rows.len() == db.nets.len()
            && self
                .rows
                .iter()
                .zip(&db.nets)
                .all(|(r, n)| r.len() == n.pins.len())
    }

    /// Iterates `(net, ipin, value)` over sink slots only.
    pub fn sinks(&self) -> impl Iterator<Item = (NetId, usize, f64)> + '_ {
        self.rows.iter().enumerate().flat_map(|(inet, row)| {
            row.iter()
                .enumerate()
                .skip(1)
                .map(move |(ipin, &v)| (NetId::new(inet), ipin, v))
        })
    }
}

impl Index<(NetId, usize)> for NetPinTable {
    type Output = f64;

    #[inline]
    fn index(&self, (net, ipin): (NetId, usize)) -> &f64 {
        &self.rows[net.index()][ipin]
    }
}

impl IndexMut<(NetId, usize)> for NetPinTable {
    #[inline]
    fn index_mut(&mut self, (net, ipin): (NetId, usize)) -> &mut f64 {
        &mut self.rows[net.index()][ipin]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_net_db() -> NetlistDB {
        let mut db = NetlistDB::new();
        let a = db.add_net("a".to_string());
        for i in 0..3 {
            db.add_pin(a, format!("a{i}"));
        }
        let b = db.add_net("b".to_string());
        for i in 0..2 {
            db.add_pin(b, format!("b{i}"));
        }
        db
    }

    #[test]
    fn shape_follows_netlist() {
        let db = two_net_db();
        let t = NetPinTable::zeroed(&db);
        assert_eq!(t.num_nets(), 2);
        assert_eq!(t.row(NetId::new(0)).len(), 3);
        assert_eq!(t.row(NetId::new(1)).len(), 2);
        assert!(t.matches(&db));
    }

    #[test]
    fn sinks_skip_driver_slot() {
        let db = two_net_db();
        let mut t = NetPinTable::filled(&db, 1.0);
        t[(NetId::new(1), 1)] = 7.0;
        let sinks: Vec<_> = t.sinks().collect();
        assert_eq!(sinks.len(), 3);
        assert_eq!(sinks[2], (NetId::new(1), 1, 7.0));
    }

    #[test]
    fn get_is_checked() {
        let db = two_net_db();
        let t = NetPinTable::zeroed(&db);
        assert_eq!(t.get(NetId::new(0), 2), Some(0.0));
        assert_eq!(t.get(NetId::new(0), 3), None);
        assert_eq!(t.get(NetId::new(9), 0), None);
    }

    #[test]
    fn mismatched_shape_is_detected() {
        let db = two_net_db();
        let t = NetPinTable::from_rows(vec![vec![0.0; 3]]);
        assert!(!t.matches(&db));
    }
}
