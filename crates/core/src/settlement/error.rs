//! Settlement state machine errors.

use thiserror::Error;

use super::types::{Party, SettlementAction, SettlementStatus};

/// Errors raised by the settlement state machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// The caller stands on the wrong side of the settlement for the action.
    #[error("Action {action:?} requires the {required:?}")]
    WrongParty {
        /// The attempted action.
        action: SettlementAction,
        /// The party entitled to trigger it.
        required: Party,
    },

    /// The action is not legal from the current status.
    #[error("Cannot apply {action:?} to a settlement in status {from:?}")]
    InvalidTransition {
        /// Status the settlement is currently in.
        from: SettlementStatus,
        /// The attempted action.
        action: SettlementAction,
    },

    /// A batch transition was requested with no settlement ids.
    #[error("Batch transition requires at least one settlement")]
    EmptyBatch,

    /// The rows of a batch do not share the caller as their single authority.
    #[error("Batch rows do not all share the caller as {required:?}")]
    MixedBatchAuthority {
        /// The party the caller must be on every row.
        required: Party,
    },
}
