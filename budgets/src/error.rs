use std::path::PathBuf;
use tdr_common::db::indices::NetId;

#[derive(Debug, thiserror::Error)]
pub enum BudgetError {
    /// The caller asked for something the budget set cannot answer: a driver
    /// pin, an unknown net or pin, or any query while budgets are disabled.
    #[error("precondition violated: {0}")]
    PreconditionViolation(String),

    /// An allocator left a pin with a window outside its bounds.
    #[error("budget invariant broken at {net:?} pin {ipin}: {detail}")]
    InvariantViolation {
        net: NetId,
        ipin: usize,
        detail: String,
    },

    #[error("could not write budget report to {path:?}: {source}")]
    Resource {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl BudgetError {
    pub(crate) fn precondition(msg: impl Into<String>) -> Self {
        BudgetError::PreconditionViolation(msg.into())
    }
}
