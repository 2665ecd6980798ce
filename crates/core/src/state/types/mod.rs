pub mod common;
pub mod inventory;
pub mod item;
pub mod slot;
pub mod tags;

// Re-export common identifiers
pub use common::{EntityId, InventoryId, ItemId, PrefabHandle, Quality};

// Re-export inventory types
pub use inventory::{
    CharacterSpec, ContainerSlotRule, ContainerSpec, Inventory, InventoryKind, Owner,
};

// Re-export item types
pub use item::{ConditionBucket, ItemCaps, ItemRecord, StackKey};

// Re-export slot types
pub use slot::{ItemSlot, StackError};

// Re-export tag bitflags
pub use tags::{ItemCategory, SlotTag};
