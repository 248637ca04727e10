//! Reference static timing analysis used to drive the budget engine outside a
//! full place-and-route flow.

pub mod error;
pub mod graph;
pub mod sta;

pub use error::TimingError;
pub use graph::{EdgeDelay, TimingGraph};
pub use sta::{StaEngine, StaSnapshot};
