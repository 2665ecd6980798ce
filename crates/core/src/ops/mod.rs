//! Placement operations.
//!
//! All inventory mutation flows through the methods defined in these
//! modules, implemented on [`crate::state::StorageState`] so cross-inventory
//! moves and swaps can touch both sides under one borrow:
//! - [`place`]: generic find/put/remove and the explicit-index entry point
//! - [`resolve`]: typed (character) slot resolution
//! - [`swap`]: the all-or-nothing exchange of occupants between slots

pub mod place;
pub mod resolve;
pub mod swap;

use crate::error::{ErrorSeverity, StorageError};
use crate::state::{InventoryId, ItemId, StackError};

/// Errors surfaced by placement operations.
///
/// `Rejected` and `SwapFailed` are expected gameplay outcomes (no room,
/// wrong slot type, occupants not relocatable) and leave no observable side
/// effect. The remaining variants are structural: the caller supplied input
/// that should never occur, and the offending operation halts without
/// corrupting state established before the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlacementError {
    /// Slot index outside `[0, capacity)`. Never silently clamped.
    #[error("slot index {index} out of range (capacity {capacity})")]
    IndexOutOfRange { index: usize, capacity: usize },

    /// A stack mutation violated the stacking invariant after validation
    /// should have caught it.
    #[error("invalid stack operation: {0}")]
    InvalidStackOperation(#[from] StackError),

    /// The item would become its own (transitive) container.
    #[error("{item} cannot be placed inside an inventory it owns")]
    SelfContainment { item: ItemId },

    /// No compatible slot; ordinary placement failure.
    #[error("no compatible slot for the item")]
    Rejected,

    /// Mid-swap relocation was impossible; the swap was rolled back.
    #[error("swap failed and was rolled back")]
    SwapFailed,

    /// No record for the given item id.
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    /// No record for the given inventory id.
    #[error("unknown inventory {0}")]
    UnknownInventory(InventoryId),
}

impl StorageError for PlacementError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Rejected | Self::SwapFailed => ErrorSeverity::Recoverable,
            Self::IndexOutOfRange { .. }
            | Self::SelfContainment { .. }
            | Self::UnknownItem(_)
            | Self::UnknownInventory(_) => ErrorSeverity::Validation,
            Self::InvalidStackOperation(_) => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::IndexOutOfRange { .. } => "PLACEMENT_INDEX_OUT_OF_RANGE",
            Self::InvalidStackOperation(_) => "PLACEMENT_INVALID_STACK_OPERATION",
            Self::SelfContainment { .. } => "PLACEMENT_SELF_CONTAINMENT",
            Self::Rejected => "PLACEMENT_REJECTED",
            Self::SwapFailed => "PLACEMENT_SWAP_FAILED",
            Self::UnknownItem(_) => "PLACEMENT_UNKNOWN_ITEM",
            Self::UnknownInventory(_) => "PLACEMENT_UNKNOWN_INVENTORY",
        }
    }
}
