//! Deterministic inventory placement engine.
//!
//! Tracks which items sit in which slots of which inventories and applies
//! the placement rules shared by every peer in a networked simulation:
//! stacking, typed character slots, container filters, swapping with
//! rollback, and self-containment prevention. The engine owns slot
//! bookkeeping only; physics, equip effects, AI notifications, and
//! replication are reached through the optional collaborator hooks in
//! [`env`].
//!
//! All mutation flows through [`state::StorageState`] methods, so peers
//! replaying the same operations derive bit-identical state (see
//! `StorageState::state_root`).

pub mod config;
pub mod env;
pub mod error;
pub mod ops;
pub mod state;

pub use config::StorageConfig;
pub use env::{
    CombineHook, CombineOutcome, Env, EquipHook, ItemPrefab, PhysicsHook, PrefabOracle, SyncHook,
    TelemetryHook,
};
pub use error::{ErrorSeverity, StorageError};
pub use ops::PlacementError;
pub use state::{
    CharacterSpec, ConditionBucket, ContainerSlotRule, ContainerSpec, EntityId, Inventory,
    InventoryId, InventoryKind, ItemCaps, ItemCategory, ItemId, ItemRecord, ItemSlot, Owner,
    PrefabHandle, Quality, RegistryError, SlotTag, StackError, StackKey, StorageState,
};

#[cfg(test)]
pub(crate) mod testkit;
