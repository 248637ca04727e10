use crate::BudgetContext;
use std::sync::atomic::{AtomicUsize, Ordering};
use tdr_common::db::core::NetlistDB;
use tdr_common::db::indices::{AtomPinId, TimingNodeId};
use tdr_common::db::lookup::PinLookup;
use tdr_common::db::table::NetPinTable;
use tdr_common::timing::{
    AnalysisMode, CriticalitySnapshot, NS, TimingOracle, TimingSnapshot, TimingTag,
};

pub fn fanout_db(fanouts: &[usize]) -> NetlistDB {
    let mut db = NetlistDB::new();
    for (i, &fanout) in fanouts.iter().enumerate() {
        let net = db.add_net(format!("n{i}"));
        for p in 0..=fanout {
            db.add_pin(net, format!("n{i}/p{p}"));
        }
    }
    db
}

fn mode_slot(mode: AnalysisMode) -> usize {
    match mode {
        AnalysisMode::Setup => 0,
        AnalysisMode::Hold => 1,
    }
}

/// Hand-built snapshot. Every atom pin is untimed until given a slack.
#[derive(Clone, Default)]
pub struct MockSnapshot {
    arrival: [Vec<Vec<TimingTag>>; 2],
    required: [Vec<Vec<TimingTag>>; 2],
    slack: [Vec<f64>; 2],
    criticality: Vec<f64>,
}

impl MockSnapshot {
    pub fn new(num_nodes: usize) -> Self {
        Self {
            arrival: [vec![Vec::new(); num_nodes], vec![Vec::new(); num_nodes]],
            required: [vec![Vec::new(); num_nodes], vec![Vec::new(); num_nodes]],
            slack: [Vec::new(), Vec::new()],
            criticality: Vec::new(),
        }
    }

    pub fn set_arrival(&mut self, node: TimingNodeId, mode: AnalysisMode, tags: Vec<TimingTag>) {
        self.arrival[mode_slot(mode)][node.index()] = tags;
    }

    pub fn set_required(&mut self, node: TimingNodeId, mode: AnalysisMode, tags: Vec<TimingTag>) {
        self.required[mode_slot(mode)][node.index()] = tags;
    }

    pub fn set_slack(&mut self, atom: AtomPinId, mode: AnalysisMode, slack: f64) {
        let table = &mut self.slack[mode_slot(mode)];
        if table.len() <= atom.index() {
            table.resize(atom.index() + 1, f64::INFINITY);
        }
        table[atom.index()] = slack;
    }

    pub fn set_criticality(&mut self, atom: AtomPinId, crit: f64) {
        if self.criticality.len() <= atom.index() {
            self.criticality.resize(atom.index() + 1, 0.0);
        }
        self.criticality[atom.index()] = crit;
    }
}

impl TimingSnapshot for MockSnapshot {
    fn slack(&self, pin: AtomPinId, mode: AnalysisMode) -> f64 {
        self.slack[mode_slot(mode)]
            .get(pin.index())
            .copied()
            .unwrap_or(f64::INFINITY)
    }

    fn arrival_tags(&self, node: TimingNodeId, mode: AnalysisMode) -> &[TimingTag] {
        &self.arrival[mode_slot(mode)][node.index()]
    }

    fn required_tags(&self, node: TimingNodeId, mode: AnalysisMode) -> &[TimingTag] {
        &self.required[mode_slot(mode)][node.index()]
    }
}

impl CriticalitySnapshot for MockSnapshot {
    fn criticality(&self, pin: AtomPinId) -> f64 {
        self.criticality.get(pin.index()).copied().unwrap_or(0.0)
    }
}

/// Oracle that builds each snapshot with a closure and counts refreshes.
pub struct MockOracle<F> {
    build: F,
    calls: AtomicUsize,
}

impl<F: Fn(&NetPinTable) -> MockSnapshot> MockOracle<F> {
    pub fn new(build: F) -> Self {
        Self {
            build,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl<F: Fn(&NetPinTable) -> MockSnapshot> TimingOracle for MockOracle<F> {
    type Snapshot = MockSnapshot;

    fn refresh(&self, delays: &NetPinTable) -> MockSnapshot {
        self.calls.fetch_add(1, Ordering::Relaxed);
        (self.build)(delays)
    }
}

/// Netlist whose sinks each resolve to `atoms_per_sink` atom pins, one timing
/// node per atom, plus one shared terminal node at the end.
pub struct Fixture {
    pub db: NetlistDB,
    pub lookup: PinLookup,
    pub delays: NetPinTable,
    pub atoms: Vec<AtomPinId>,
}

pub const TERMINAL_REQUIRED: f64 = 10.0 * NS;

impl Fixture {
    pub fn new(fanouts: &[usize], atoms_per_sink: usize) -> Self {
        let db = fanout_db(fanouts);
        let mut lookup = PinLookup::new(db.num_pins());
        let mut atoms = Vec::new();
        for net in &db.nets {
            for &pin in &net.pins[1..] {
                for _ in 0..atoms_per_sink {
                    let node = TimingNodeId::new(lookup.num_atom_pins());
                    atoms.push(lookup.add_atom_pin(pin, node));
                }
            }
        }
        let delays = NetPinTable::filled(&db, 1.0 * NS);
        Self {
            db,
            lookup,
            delays,
            atoms,
        }
    }

    pub fn context(&self) -> BudgetContext<'_> {
        BudgetContext::new(&self.db, &self.lookup, &self.delays)
    }

    pub fn terminal(&self) -> TimingNodeId {
        TimingNodeId::new(self.atoms.len())
    }

    pub fn num_nodes(&self) -> usize {
        self.atoms.len() + 1
    }

    /// Every atom sees the same path delay and slack in both modes.
    pub fn uniform_snapshot(&self, path_delay: f64, slack: f64) -> MockSnapshot {
        let mut snap = MockSnapshot::new(self.num_nodes());
        let terminal = self.terminal();
        for mode in [AnalysisMode::Setup, AnalysisMode::Hold] {
            snap.set_required(
                terminal,
                mode,
                vec![TimingTag::new(TERMINAL_REQUIRED, Some(terminal))],
            );
            for &atom in &self.atoms {
                let node = self.lookup.tnode(atom);
                snap.set_arrival(node, mode, vec![TimingTag::new(path_delay, None)]);
                snap.set_required(
                    node,
                    mode,
                    vec![TimingTag::new(TERMINAL_REQUIRED, Some(terminal))],
                );
                snap.set_slack(atom, mode, slack);
            }
        }
        snap
    }
}

pub fn single_sink_fixture(atoms_per_sink: usize) -> Fixture {
    Fixture::new(&[1], atoms_per_sink)
}

/// Asserts both ordering invariants on every sink of the store.
pub fn assert_windows_ordered(store: &crate::store::BudgetStore) {
    if let Err(e) = store.check_invariants() {
        panic!("{e}");
    }
}
