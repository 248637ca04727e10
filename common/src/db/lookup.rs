use crate::db::indices::{AtomPinId, PinId, TimingNodeId};

/// Resolves clustered pins to the fine-grained atom pins behind them, and atom
/// pins to their timing graph node.
///
/// A clustered input pin can fan out to several atom pins inside the block,
/// so timing queries on a net sink aggregate over all of them.
#[derive(Debug, Default, Clone)]
pub struct PinLookup {
    pin_atoms: Vec<Vec<AtomPinId>>,
    atom_tnode: Vec<TimingNodeId>,
}

impl PinLookup {
    pub fn new(num_pins: usize) -> Self {
        Self {
            pin_atoms: vec![Vec::new(); num_pins],
            atom_tnode: Vec::new(),
        }
    }

    /// Registers a new atom pin behind `pin`, driven by timing node `tnode`.
    pub fn add_atom_pin(&mut self, pin: PinId, tnode: TimingNodeId) -> AtomPinId {
        if pin.index() >= self.pin_atoms.len() {
            self.pin_atoms.resize(pin.index() + 1, Vec::new());
        }
        let id = AtomPinId::new(self.atom_tnode.len());
        self.atom_tnode.push(tnode);
        self.pin_atoms[pin.index()].push(id);
        id
    }

    pub fn atom_pins(&self, pin: PinId) -> &[AtomPinId] {
        self.pin_atoms
            .get(pin.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[inline]
    pub fn tnode(&self, atom: AtomPinId) -> TimingNodeId {
        self.atom_tnode[atom.index()]
    }

    pub fn num_atom_pins(&self) -> usize {
        self.atom_tnode.len()
    }
}
