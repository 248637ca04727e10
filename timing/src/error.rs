use tdr_common::db::indices::TimingNodeId;

#[derive(Debug, thiserror::Error)]
pub enum TimingError {
    /// The graph has a cycle through combinational edges, so it cannot be levelized.
    #[error("combinational loop: {unvisited} timing nodes could not be levelized")]
    CombinationalLoop { unvisited: usize },

    #[error("edge references unknown timing node {node:?}")]
    DanglingEdge { node: TimingNodeId },
}
