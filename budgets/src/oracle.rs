//! Queries the budget allocators make against a timing snapshot, lifted from
//! atom pins and timing nodes to clustered net sinks.

use crate::BudgetContext;
use tdr_common::db::indices::{AtomPinId, NetId, TimingNodeId};
use tdr_common::timing::{AnalysisMode, CriticalitySnapshot, TimingSnapshot, max_tag, min_tag};

/// Atom pins behind sink `ipin` of `net`. Empty for unknown pins.
pub(crate) fn sink_atoms<'c>(
    ctx: &'c BudgetContext<'_>,
    net: NetId,
    ipin: usize,
) -> &'c [AtomPinId] {
    match ctx.db.net_pin(net, ipin) {
        Some(pin) => ctx.lookup.atom_pins(pin),
        None => &[],
    }
}

/// Full delay of the most constraining path through `node`.
///
/// Earliest arrival at the node plus the delay still ahead of it, where the
/// delay ahead is the terminal node's required time minus the node's latest
/// required time. The terminal node is the origin of that latest required tag.
/// `None` when any of the tags involved is missing.
pub fn total_path_delay<S: TimingSnapshot + ?Sized>(
    snapshot: &S,
    node: TimingNodeId,
    mode: AnalysisMode,
) -> Option<f64> {
    let arrival = min_tag(snapshot.arrival_tags(node, mode))?;
    let required = max_tag(snapshot.required_tags(node, mode))?;
    let terminal = required.origin?;
    let final_required = min_tag(snapshot.required_tags(terminal, mode))?;

    let past = arrival.time;
    let future = final_required.time - required.time;
    Some(past + future)
}

/// Largest path delay over the atom pins of a sink. Untimed atoms contribute nothing.
pub fn sink_path_delay<S: TimingSnapshot + ?Sized>(
    snapshot: &S,
    ctx: &BudgetContext<'_>,
    net: NetId,
    ipin: usize,
    mode: AnalysisMode,
) -> f64 {
    sink_atoms(ctx, net, ipin)
        .iter()
        .filter_map(|&atom| total_path_delay(snapshot, ctx.lookup.tnode(atom), mode))
        .fold(0.0, f64::max)
}

/// Worst finite slack over the atom pins of a sink, or `None` if every atom is untimed.
pub fn sink_slack<S: TimingSnapshot + ?Sized>(
    snapshot: &S,
    ctx: &BudgetContext<'_>,
    net: NetId,
    ipin: usize,
    mode: AnalysisMode,
) -> Option<f64> {
    sink_atoms(ctx, net, ipin)
        .iter()
        .map(|&atom| snapshot.slack(atom, mode))
        .filter(|s| *s != f64::INFINITY)
        .min_by(f64::total_cmp)
}

/// Clustered pin criticality: the most critical atom pin behind the sink.
pub fn sink_criticality<C: CriticalitySnapshot + ?Sized>(
    criticalities: &C,
    ctx: &BudgetContext<'_>,
    net: NetId,
    ipin: usize,
) -> f64 {
    sink_atoms(ctx, net, ipin)
        .iter()
        .map(|&atom| criticalities.criticality(atom))
        .fold(0.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{MockSnapshot, single_sink_fixture};
    use tdr_common::timing::{NS, TimingTag};

    #[test]
    fn path_delay_adds_past_and_future() {
        let mut snap = MockSnapshot::new(3);
        let (node, terminal) = (TimingNodeId::new(1), TimingNodeId::new(2));
        snap.set_arrival(
            node,
            AnalysisMode::Setup,
            vec![
                TimingTag::new(3.0 * NS, None),
                TimingTag::new(2.0 * NS, None),
            ],
        );
        snap.set_required(
            node,
            AnalysisMode::Setup,
            vec![
                TimingTag::new(6.0 * NS, Some(terminal)),
                TimingTag::new(5.0 * NS, Some(TimingNodeId::new(0))),
            ],
        );
        snap.set_required(
            terminal,
            AnalysisMode::Setup,
            vec![TimingTag::new(10.0 * NS, Some(terminal))],
        );

        // earliest arrival 2ns + (10ns - latest required 6ns)
        let d = total_path_delay(&snap, node, AnalysisMode::Setup).unwrap();
        assert!((d - 6.0 * NS).abs() < 1e-18);
        assert!(total_path_delay(&snap, node, AnalysisMode::Hold).is_none());
    }

    #[test]
    fn missing_origin_or_terminal_tags_skip_the_node() {
        let mut snap = MockSnapshot::new(3);
        let node = TimingNodeId::new(0);
        snap.set_arrival(
            node,
            AnalysisMode::Setup,
            vec![TimingTag::new(1.0 * NS, None)],
        );
        snap.set_required(
            node,
            AnalysisMode::Setup,
            vec![TimingTag::new(4.0 * NS, None)],
        );
        assert!(total_path_delay(&snap, node, AnalysisMode::Setup).is_none());

        snap.set_required(
            node,
            AnalysisMode::Setup,
            vec![TimingTag::new(4.0 * NS, Some(TimingNodeId::new(2)))],
        );
        assert!(total_path_delay(&snap, node, AnalysisMode::Setup).is_none());
    }

    #[test]
    fn sink_slack_ignores_untimed_atoms() {
        let fx = single_sink_fixture(2);
        let mut snap = MockSnapshot::new(fx.num_nodes());
        snap.set_slack(fx.atoms[0], AnalysisMode::Setup, f64::INFINITY);
        snap.set_slack(fx.atoms[1], AnalysisMode::Setup, 2.0 * NS);
        let ctx = fx.context();
        assert_eq!(
            sink_slack(&snap, &ctx, NetId::new(0), 1, AnalysisMode::Setup),
            Some(2.0 * NS)
        );

        snap.set_slack(fx.atoms[1], AnalysisMode::Setup, f64::INFINITY);
        assert_eq!(
            sink_slack(&snap, &ctx, NetId::new(0), 1, AnalysisMode::Setup),
            None
        );
    }

    #[test]
    fn unknown_sink_has_no_atoms() {
        let fx = single_sink_fixture(1);
        let ctx = fx.context();
        assert!(sink_atoms(&ctx, NetId::new(0), 7).is_empty());
        let snap = MockSnapshot::new(fx.num_nodes());
        assert_eq!(
            sink_path_delay(&snap, &ctx, NetId::new(0), 7, AnalysisMode::Setup),
            0.0
        );
    }
}
