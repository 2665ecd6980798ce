//! Item-related state types.
//!
//! The engine never creates or destroys items; it tracks the placement facet
//! of items owned by the surrounding simulation:
//! - `ItemCaps`: the fixed capability record computed at item construction
//! - `ItemRecord`: instance state including the `parent` back-reference

use arrayvec::ArrayVec;

use super::{InventoryId, ItemId, PrefabHandle, Quality};
use crate::config::StorageConfig;
use crate::state::types::tags::{ItemCategory, SlotTag};

/// Coarse classification of an item's durability used to decide stack
/// compatibility: items stack only when both are `Full` or both are `Zero`.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ConditionBucket {
    /// 100% condition.
    #[default]
    Full,
    /// Exactly 0% condition (spent/broken but still an object).
    Zero,
    /// Any other condition state; never stackable with anything.
    Partial,
}

/// Stack identity: two items may share a slot only if their keys match and
/// the condition-bucket rule holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StackKey {
    pub prefab: PrefabHandle,
    pub quality: Quality,
}

/// Read-only capability record consumed by the placement engine.
///
/// Computed once when the item is constructed (from its prefab and attached
/// capabilities) rather than re-derived by component inspection on every
/// call, so resolution is cheap and deterministic.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemCaps {
    /// Slot-tag combinations the item's pickable capability may occupy, in
    /// declaration order. Each entry is a set of jointly-required tags.
    pub combinations: ArrayVec<SlotTag, { StorageConfig::MAX_SLOT_COMBINATIONS }>,
    /// Categories consumed by container acceptance filters.
    pub categories: ItemCategory,
    /// Per-prefab stack ceiling, clamped to `StorageConfig::MAX_STACK_SIZE`.
    pub max_stack: u8,
    /// Whether the item may be dropped to the world as a last resort when a
    /// swap cannot relocate it anywhere else.
    pub allow_drop_on_swap: bool,
}

impl ItemCaps {
    pub fn new(combinations: &[SlotTag], categories: ItemCategory, max_stack: u8) -> Self {
        let mut combos = ArrayVec::new();
        for combination in combinations {
            combos.push(*combination);
        }
        Self {
            combinations: combos,
            categories,
            max_stack: max_stack.min(StorageConfig::MAX_STACK_SIZE as u8),
            allow_drop_on_swap: false,
        }
    }

    pub fn with_drop_on_swap(mut self) -> Self {
        self.allow_drop_on_swap = true;
        self
    }

    /// True if any declared combination is exactly the generic ANY slot.
    pub fn allows_any(&self) -> bool {
        self.combinations.iter().any(|combo| *combo == SlotTag::ANY)
    }

    /// True if any declared combination intersects the given slot tag.
    pub fn intersects(&self, tag: SlotTag) -> bool {
        self.combinations.iter().any(|combo| combo.intersects(tag))
    }
}

/// Placement-relevant state of one item instance.
///
/// `parent` is set exactly when the item is inserted into an inventory and
/// cleared exactly when removed; at most one live parent at a time. The
/// inventory's slot contents and this back-reference must always agree.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemRecord {
    pub id: ItemId,
    pub handle: PrefabHandle,
    pub quality: Quality,
    pub condition: ConditionBucket,
    pub caps: ItemCaps,
    /// Inventory currently holding this item, if any.
    pub parent: Option<InventoryId>,
    /// Set when the surrounding simulation has despawned the item; a removed
    /// item is never placeable.
    pub removed: bool,
}

impl ItemRecord {
    pub fn new(id: ItemId, handle: PrefabHandle, quality: Quality, caps: ItemCaps) -> Self {
        Self {
            id,
            handle,
            quality,
            condition: ConditionBucket::Full,
            caps,
            parent: None,
            removed: false,
        }
    }

    pub fn with_condition(mut self, condition: ConditionBucket) -> Self {
        self.condition = condition;
        self
    }

    pub fn stack_key(&self) -> StackKey {
        StackKey {
            prefab: self.handle,
            quality: self.quality,
        }
    }

    /// Stacking predicate against an item already occupying a slot.
    ///
    /// Both must share the stack key, and unless `ignore_condition` is set,
    /// both must sit in the same non-`Partial` condition bucket.
    pub fn stackable_with(&self, occupant: &ItemRecord, ignore_condition: bool) -> bool {
        if self.stack_key() != occupant.stack_key() {
            return false;
        }
        if ignore_condition {
            return true;
        }
        match (self.condition, occupant.condition) {
            (ConditionBucket::Full, ConditionBucket::Full) => true,
            (ConditionBucket::Zero, ConditionBucket::Zero) => true,
            _ => false,
        }
    }
}
