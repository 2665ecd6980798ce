//! Item prefab definitions.
//!
//! Prefabs live outside the engine (in content catalogs); the placement code
//! itself only reads the [`crate::state::ItemCaps`] record cached on each
//! item at construction time. The oracle exists for the factory layer that
//! builds those records.

use arrayvec::ArrayVec;

use crate::config::StorageConfig;
use crate::state::{ItemCaps, ItemCategory, PrefabHandle, SlotTag};

/// Static definition shared by all instances of one item type.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemPrefab {
    pub handle: PrefabHandle,
    /// Slot-tag combinations instances may occupy, in priority order.
    pub combinations: ArrayVec<SlotTag, { StorageConfig::MAX_SLOT_COMBINATIONS }>,
    pub categories: ItemCategory,
    pub max_stack: u8,
    pub allow_drop_on_swap: bool,
}

impl ItemPrefab {
    pub fn new(handle: PrefabHandle, combinations: &[SlotTag], max_stack: u8) -> Self {
        let mut combos = ArrayVec::new();
        for combination in combinations {
            combos.push(*combination);
        }
        Self {
            handle,
            combinations: combos,
            categories: ItemCategory::MISC,
            max_stack,
            allow_drop_on_swap: false,
        }
    }

    pub fn with_categories(mut self, categories: ItemCategory) -> Self {
        self.categories = categories;
        self
    }

    /// Capability record for a new instance of this prefab.
    pub fn caps(&self) -> ItemCaps {
        let mut caps = ItemCaps::new(&self.combinations, self.categories, self.max_stack);
        caps.allow_drop_on_swap = self.allow_drop_on_swap;
        caps
    }
}

/// Read-only catalog of prefab definitions.
pub trait PrefabOracle: Send + Sync {
    fn prefab(&self, handle: PrefabHandle) -> Option<ItemPrefab>;

    /// All definitions available in this oracle.
    #[cfg(feature = "std")]
    fn all_prefabs(&self) -> Vec<ItemPrefab>;
}
