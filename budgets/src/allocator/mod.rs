//! Budget allocation strategies.
//!
//! `pert` iterates against the timing analyser until slack stops moving;
//! `criticality` derives windows from one criticality snapshot in a single pass.

pub mod criticality;
pub mod pert;
