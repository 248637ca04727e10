//! Timing graph used by the reference STA engine.
//!
//! Nodes are atom-level pins. Edges carry either a fixed intra-cell delay or a
//! reference to a routing connection `(net, ipin)` whose delay is read from the
//! table handed to each refresh.

use crate::error::TimingError;
use std::collections::VecDeque;
use tdr_common::db::indices::{NetId, TimingNodeId};
use tdr_common::db::table::NetPinTable;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EdgeDelay {
    Fixed(f64),
    Routing { net: NetId, ipin: usize },
}

impl EdgeDelay {
    #[inline]
    pub fn resolve(&self, delays: &NetPinTable) -> f64 {
        match *self {
            EdgeDelay::Fixed(d) => d,
            EdgeDelay::Routing { net, ipin } => delays.get(net, ipin).unwrap_or(0.0),
        }
    }
}

#[derive(Clone, Debug)]
pub struct TimingEdge {
    pub from: TimingNodeId,
    pub to: TimingNodeId,
    pub delay: EdgeDelay,
}

#[derive(Debug, Default)]
pub struct TimingGraph {
    names: Vec<String>,
    edges: Vec<TimingEdge>,
    fanin: Vec<Vec<usize>>,
    fanout: Vec<Vec<usize>>,
    order: Vec<TimingNodeId>,
}

impl TimingGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, name: String) -> TimingNodeId {
        let id = TimingNodeId::new(self.names.len());
        self.names.push(name);
        self.fanin.push(Vec::new());
        self.fanout.push(Vec::new());
        self.order.clear();
        id
    }

    pub fn add_edge(
        &mut self,
        from: TimingNodeId,
        to: TimingNodeId,
        delay: EdgeDelay,
    ) -> Result<(), TimingError> {
        for node in [from, to] {
            if node.index() >= self.names.len() {
                return Err(TimingError::DanglingEdge { node });
            }
        }
        let idx = self.edges.len();
        self.edges.push(TimingEdge { from, to, delay });
        self.fanout[from.index()].push(idx);
        self.fanin[to.index()].push(idx);
        self.order.clear();
        Ok(())
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn name(&self, node: TimingNodeId) -> &str {
        &self.names[node.index()]
    }

    pub fn fanin(&self, node: TimingNodeId) -> impl Iterator<Item = &TimingEdge> {
        self.fanin[node.index()].iter().map(|&e| &self.edges[e])
    }

    pub fn fanout(&self, node: TimingNodeId) -> impl Iterator<Item = &TimingEdge> {
        self.fanout[node.index()].iter().map(|&e| &self.edges[e])
    }

    pub fn is_source(&self, node: TimingNodeId) -> bool {
        self.fanin[node.index()].is_empty()
    }

    pub fn is_endpoint(&self, node: TimingNodeId) -> bool {
        self.fanout[node.index()].is_empty()
    }

    /// Computes the topological order (Kahn's algorithm). Must be called after
    /// the last edit and before [`order`](Self::order) is used.
    pub fn levelize(&mut self) -> Result<(), TimingError> {
        let n = self.names.len();
        let mut indegree: Vec<usize> = self.fanin.iter().map(Vec::len).collect();
        let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
        let mut order = Vec::with_capacity(n);

        while let Some(u) = queue.pop_front() {
            order.push(TimingNodeId::new(u));
            for &e in &self.fanout[u] {
                let v = self.edges[e].to.index();
                indegree[v] -= 1;
                if indegree[v] == 0 {
                    queue.push_back(v);
                }
            }
        }

        if order.len() != n {
            return Err(TimingError::CombinationalLoop {
                unvisited: n - order.len(),
            });
        }
        log::debug!("Levelized timing graph: {} nodes, {} edges", n, self.edges.len());
        self.order = order;
        Ok(())
    }

    pub fn order(&self) -> &[TimingNodeId] {
        &self.order
    }

    pub fn is_levelized(&self) -> bool {
        self.order.len() == self.names.len()
    }
}
