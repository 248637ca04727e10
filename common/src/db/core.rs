use crate::db::indices::*;
use std::collections::HashMap;

/// A routed signal. `pins[0]` is the driver; every later entry is a sink.
#[derive(Clone, Debug)]
pub struct NetData {
    pub name: String,
    pub pins: Vec<PinId>,
}

impl NetData {
    pub fn num_sinks(&self) -> usize {
        self.pins.len().saturating_sub(1)
    }
}

pub struct NetlistDB {
    pub nets: Vec<NetData>,

    pub pin_names: Vec<String>,
    pub pin_to_net: Vec<NetId>,

    pub net_name_map: HashMap<String, NetId>,
}

impl Default for NetlistDB {
    fn default() -> Self {
        Self::new()
    }
}

impl NetlistDB {
    pub fn new() -> Self {
        Self {
            nets: Vec::with_capacity(1000),
            pin_names: Vec::with_capacity(5000),
            pin_to_net: Vec::with_capacity(5000),
            net_name_map: HashMap::new(),
        }
    }

    pub fn num_nets(&self) -> usize {
        self.nets.len()
    }

    pub fn num_pins(&self) -> usize {
        self.pin_names.len()
    }

    /// Number of pins (driver included) on `net`, or `None` for an unknown net.
    pub fn net_pin_count(&self, net: NetId) -> Option<usize> {
        self.nets.get(net.index()).map(|n| n.pins.len())
    }

    /// Global pin id of the `ipin`-th pin of `net`.
    #[inline]
    pub fn net_pin(&self, net: NetId, ipin: usize) -> Option<PinId> {
        self.nets
            .get(net.index())
            .and_then(|n| n.pins.get(ipin))
            .copied()
    }

    pub fn total_sinks(&self) -> usize {
        self.nets.iter().map(NetData::num_sinks).sum()
    }

    pub fn add_net(&mut self, name: String) -> NetId {
        if let Some(&id) = self.net_name_map.get(&name) {
            return id;
        }
        let id = NetId::new(self.nets.len());
        self.nets.push(NetData {
            name: name.clone(),
            pins: Vec::new(),
        });
        self.net_name_map.insert(name, id);
        id
    }

    /// Appends a pin to `net`. The first pin added to a net becomes its driver.
    pub fn add_pin(&mut self, net: NetId, name: String) -> PinId {
        let pid = PinId::new(self.pin_names.len());
        self.pin_names.push(name);
        self.pin_to_net.push(net);

        self.nets[net.index()].pins.push(pid);
        pid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_pin_is_driver() {
        let mut db = NetlistDB::new();
        let n = db.add_net("n0".to_string());
        let drv = db.add_pin(n, "u1/O".to_string());
        let snk = db.add_pin(n, "u2/I0".to_string());

        assert_eq!(db.net_pin(n, 0), Some(drv));
        assert_eq!(db.net_pin(n, 1), Some(snk));
        assert_eq!(db.nets[n.index()].num_sinks(), 1);
        assert_eq!(db.pin_to_net[snk.index()], n);
    }

    #[test]
    fn add_net_is_idempotent_by_name() {
        let mut db = NetlistDB::new();
        let a = db.add_net("clk".to_string());
        let b = db.add_net("clk".to_string());
        assert_eq!(a, b);
        assert_eq!(db.num_nets(), 1);
    }

    #[test]
    fn out_of_range_lookups_are_none() {
        let mut db = NetlistDB::new();
        let n = db.add_net("n".to_string());
        db.add_pin(n, "a".to_string());
        assert_eq!(db.net_pin(n, 5), None);
        assert_eq!(db.net_pin_count(NetId::new(3)), None);
    }

    #[test]
    fn total_sinks_skips_drivers() {
        let mut db = NetlistDB::new();
        for name in ["a", "b"] {
            let n = db.add_net(name.to_string());
            for i in 0..3 {
                db.add_pin(n, format!("{name}/{i}"));
            }
        }
        assert_eq!(db.total_sinks(), 4);
    }
}
