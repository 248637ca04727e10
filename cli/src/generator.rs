use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tdr_common::db::core::NetlistDB;
use tdr_common::db::indices::{PinId, TimingNodeId};
use tdr_common::db::lookup::PinLookup;
use tdr_common::db::table::NetPinTable;
use tdr_common::timing::NS;
use tdr_common::util::config::GeneratorConfig;
use tdr_timing::{EdgeDelay, TimingGraph};

/// A synthetic routed design: netlist, pin resolution, timing graph and the
/// router's delay estimate for every connection.
pub struct Benchmark {
    pub db: NetlistDB,
    pub lookup: PinLookup,
    pub graph: TimingGraph,
    pub delays: NetPinTable,
}

/// Builds a levelized pipeline of nets.
///
/// Level 0 nets are driven by input flops. Every sink pin of a level `l` net
/// belongs to a fresh LUT whose output drives a level `l + 1` net, except on
/// the last level where sinks are capture flops. Each sink pin resolves to
/// between one and `max_atoms_per_pin` atom pins.
pub fn generate(config: &GeneratorConfig) -> anyhow::Result<Benchmark> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let levels = config.levels.max(1);
    let per_level = (config.nets / levels).max(1);
    let max_fanout = config.max_fanout.max(1);
    let max_atoms = config.max_atoms_per_pin.max(1);

    log::info!(
        "Generating benchmark: {} levels x {} nets, fanout <= {}, seed {}",
        levels,
        per_level,
        max_fanout,
        config.seed
    );

    let mut db = NetlistDB::new();
    let mut graph = TimingGraph::new();
    let mut atoms: Vec<(PinId, TimingNodeId)> = Vec::new();

    let mut drivers: Vec<TimingNodeId> = (0..per_level)
        .map(|i| graph.add_node(format!("ff_in{i}/Q")))
        .collect();
    let mut cell = 0usize;

    for level in 0..levels {
        let last = level + 1 == levels;
        let mut outputs = Vec::new();

        for k in 0..per_level {
            let driver = if level == 0 {
                drivers[k]
            } else {
                drivers[rng.gen_range(0..drivers.len())]
            };
            let net = db.add_net(format!("n{level}_{k}"));
            db.add_pin(net, graph.name(driver).to_string());

            let fanout = rng.gen_range(1..=max_fanout);
            for ipin in 1..=fanout {
                let prefix = if last { "ff" } else { "lut" };
                let pin = db.add_pin(net, format!("{prefix}{cell}/I"));
                let out = (!last).then(|| graph.add_node(format!("lut{cell}/O")));

                for a in 0..rng.gen_range(1..=max_atoms) {
                    let atom = graph.add_node(format!("{prefix}{cell}/I{a}"));
                    graph.add_edge(driver, atom, EdgeDelay::Routing { net, ipin })?;
                    if let Some(out) = out {
                        let d = config.cell_delay_ns * rng.gen_range(0.5..1.5) * NS;
                        graph.add_edge(atom, out, EdgeDelay::Fixed(d))?;
                    }
                    atoms.push((pin, atom));
                }
                outputs.extend(out);
                cell += 1;
            }
        }
        drivers = outputs;
    }

    graph.levelize()?;

    let mut lookup = PinLookup::new(db.num_pins());
    for (pin, node) in atoms {
        lookup.add_atom_pin(pin, node);
    }

    let mut delays = NetPinTable::zeroed(&db);
    for row in delays.rows_mut() {
        for v in row.iter_mut().skip(1) {
            *v = rng.gen_range(0.1..=1.0) * config.max_net_delay_ns * NS;
        }
    }

    log::info!(
        "Benchmark: {} nets, {} sinks, {} atom pins, {} timing nodes, {} edges",
        db.num_nets(),
        db.total_sinks(),
        lookup.num_atom_pins(),
        graph.node_count(),
        graph.edge_count()
    );

    Ok(Benchmark {
        db,
        lookup,
        graph,
        delays,
    })
}
