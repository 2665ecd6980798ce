//! Authoritative inventory state.
//!
//! This module owns the item and inventory registries. Collaborating systems
//! query this state but mutate it exclusively through the placement
//! operations in [`crate::ops`], so every peer replaying the same operations
//! derives bit-identical contents.

pub mod types;

pub use bounded_vector::BoundedVec;
pub use types::{
    CharacterSpec, ConditionBucket, ContainerSlotRule, ContainerSpec, EntityId, Inventory,
    InventoryId, InventoryKind, ItemCaps, ItemCategory, ItemId, ItemRecord, ItemSlot, Owner,
    PrefabHandle, Quality, SlotTag, StackError, StackKey,
};

use crate::config::StorageConfig;
use crate::error::{ErrorSeverity, StorageError};

/// Errors raised by registry bookkeeping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RegistryError {
    /// Item registry is at capacity.
    #[error("item registry full ({capacity} records)")]
    ItemsFull { capacity: usize },

    /// Inventory registry is at capacity.
    #[error("inventory registry full ({capacity} inventories)")]
    InventoriesFull { capacity: usize },

    /// No record for the given item id.
    #[error("unknown item {0}")]
    UnknownItem(ItemId),

    /// No record for the given inventory id.
    #[error("unknown inventory {0}")]
    UnknownInventory(InventoryId),
}

impl StorageError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ItemsFull { .. } | Self::InventoriesFull { .. } => ErrorSeverity::Fatal,
            Self::UnknownItem(_) | Self::UnknownInventory(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ItemsFull { .. } => "REGISTRY_ITEMS_FULL",
            Self::InventoriesFull { .. } => "REGISTRY_INVENTORIES_FULL",
            Self::UnknownItem(_) => "REGISTRY_UNKNOWN_ITEM",
            Self::UnknownInventory(_) => "REGISTRY_UNKNOWN_INVENTORY",
        }
    }
}

/// Registry of live item records, keyed by monotonically allocated ids.
///
/// Records are appended in id order and never shrink, so lookups can rely on
/// a deterministic scan and released items keep their slot in the table with
/// `removed` set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemTable {
    records: BoundedVec<ItemRecord, 0, { StorageConfig::MAX_ITEMS }>,
}

impl ItemTable {
    pub fn record(&self, id: ItemId) -> Option<&ItemRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn record_mut(&mut self, id: ItemId) -> Option<&mut ItemRecord> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Canonical snapshot of all tracked inventories and item placement state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StorageState {
    pub config: StorageConfig,
    /// Sequential item id allocator (monotonically increasing, never reused).
    next_item_id: u32,
    /// Sequential inventory id allocator.
    next_inventory_id: u32,
    pub(crate) items: ItemTable,
    pub(crate) inventories: BoundedVec<Inventory, 0, { StorageConfig::MAX_INVENTORIES }>,
}

impl StorageState {
    pub fn new() -> Self {
        Self::with_config(StorageConfig::default())
    }

    pub fn with_config(config: StorageConfig) -> Self {
        Self {
            config,
            next_item_id: 0,
            next_inventory_id: 0,
            items: ItemTable::default(),
            inventories: BoundedVec::new(),
        }
    }

    pub fn items(&self) -> &ItemTable {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&ItemRecord> {
        self.items.record(id)
    }

    pub fn item_mut(&mut self, id: ItemId) -> Option<&mut ItemRecord> {
        self.items.record_mut(id)
    }

    pub fn inventory(&self, id: InventoryId) -> Option<&Inventory> {
        self.inventories.iter().find(|inventory| inventory.id == id)
    }

    pub fn inventory_mut(&mut self, id: InventoryId) -> Option<&mut Inventory> {
        self.inventories
            .iter_mut()
            .find(|inventory| inventory.id == id)
    }

    pub fn inventories(&self) -> impl Iterator<Item = &Inventory> {
        self.inventories.iter()
    }

    /// The container inventory owned by the given item, if it has one.
    pub fn inventory_of_item(&self, item: ItemId) -> Option<InventoryId> {
        self.inventories
            .iter()
            .find(|inventory| inventory.owner == Owner::Item(item))
            .map(|inventory| inventory.id)
    }

    fn allocate_item_id(&mut self) -> ItemId {
        let id = ItemId(self.next_item_id);
        self.next_item_id = self.next_item_id.checked_add(1).expect("ItemId overflow");
        id
    }

    fn allocate_inventory_id(&mut self) -> InventoryId {
        let id = InventoryId(self.next_inventory_id);
        self.next_inventory_id = self
            .next_inventory_id
            .checked_add(1)
            .expect("InventoryId overflow");
        id
    }

    /// Registers an item spawned by the surrounding simulation.
    pub fn add_item(
        &mut self,
        handle: PrefabHandle,
        quality: Quality,
        caps: ItemCaps,
    ) -> Result<ItemId, RegistryError> {
        let id = self.allocate_item_id();
        self.items
            .records
            .push(ItemRecord::new(id, handle, quality, caps))
            .map_err(|_| RegistryError::ItemsFull {
                capacity: StorageConfig::MAX_ITEMS,
            })?;
        Ok(id)
    }

    /// Registers a generic inventory with no per-slot restrictions.
    pub fn add_plain_inventory(
        &mut self,
        owner: Owner,
        capacity: usize,
    ) -> Result<InventoryId, RegistryError> {
        let id = self.allocate_inventory_id();
        self.push_inventory(Inventory::new(id, owner, capacity))
    }

    /// Registers a character inventory with per-slot type tags.
    pub fn add_character_inventory(
        &mut self,
        owner: EntityId,
        spec: CharacterSpec,
    ) -> Result<InventoryId, RegistryError> {
        let id = self.allocate_inventory_id();
        self.push_inventory(Inventory::character(id, owner, spec))
    }

    /// Registers a container inventory owned by an item.
    pub fn add_container_inventory(
        &mut self,
        owner: ItemId,
        spec: ContainerSpec,
    ) -> Result<InventoryId, RegistryError> {
        let id = self.allocate_inventory_id();
        self.push_inventory(Inventory::container(id, owner, spec))
    }

    fn push_inventory(&mut self, inventory: Inventory) -> Result<InventoryId, RegistryError> {
        let id = inventory.id;
        self.inventories
            .push(inventory)
            .map_err(|_| RegistryError::InventoriesFull {
                capacity: StorageConfig::MAX_INVENTORIES,
            })?;
        Ok(id)
    }

    /// Detaches a despawned item from its inventory and marks the record
    /// removed. The record stays in the table so ids remain stable.
    pub fn release_item(&mut self, id: ItemId) -> Result<(), RegistryError> {
        let parent = self
            .items
            .record(id)
            .ok_or(RegistryError::UnknownItem(id))?
            .parent;
        if let Some(parent) = parent
            && let Some(inventory) = self.inventory_mut(parent)
        {
            for index in 0..inventory.capacity() {
                if let Some(slot) = inventory.slot_mut(index) {
                    slot.remove(id);
                }
            }
            let delay = self.config.sync_delay_ticks;
            if let Some(inventory) = self.inventory_mut(parent) {
                inventory.mark_dirty(delay);
            }
        }
        let record = self
            .items
            .record_mut(id)
            .ok_or(RegistryError::UnknownItem(id))?;
        record.parent = None;
        record.removed = true;
        Ok(())
    }

    /// All items contained in the inventory, in slot order. Stacked items are
    /// yielded as individual instances; multi-slot items (two-handed weapons)
    /// are de-duplicated to their first occurrence.
    pub fn all_items(&self, inv: InventoryId) -> impl Iterator<Item = ItemId> + '_ {
        let slots = self
            .inventory(inv)
            .map(|inventory| inventory.slots())
            .unwrap_or(&[]);
        slots.iter().enumerate().flat_map(move |(index, slot)| {
            slot.items().iter().copied().filter(move |item| {
                !slots[..index]
                    .iter()
                    .any(|earlier| earlier.contains(*item))
            })
        })
    }

    /// Snapshot copy of [`Self::all_items`], safe to hold while mutating the
    /// inventory.
    pub fn all_items_snapshot(&self, inv: InventoryId) -> Vec<ItemId> {
        self.all_items(inv).collect()
    }

    /// Advances the replication debounce one tick, reporting every inventory
    /// whose dirty window just expired to the sync hook.
    pub fn tick_replication(&mut self, env: &crate::env::Env<'_>) {
        let mut due = Vec::new();
        for inventory in self.inventories.iter_mut() {
            if inventory.tick_sync() {
                due.push(inventory.id);
            }
        }
        if let Some(sync) = env.sync() {
            for id in due {
                sync.mark_dirty(id);
            }
        }
    }

    /// Deterministic digest of the full placement state.
    ///
    /// Uses bincode for deterministic serialization; peers that applied the
    /// same operations from replicated intents must produce identical roots.
    #[cfg(feature = "serde")]
    pub fn state_root(&self) -> [u8; 32] {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        let bytes = bincode::serialize(self).expect("state serialization is infallible");
        hasher.update(&bytes);
        hasher.finalize().into()
    }
}

impl Default for StorageState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps() -> ItemCaps {
        ItemCaps::new(&[SlotTag::ANY], ItemCategory::MISC, 4)
    }

    #[test]
    fn ids_are_monotonic_and_stable() {
        let mut state = StorageState::new();
        let a = state.add_item(PrefabHandle(1), Quality(0), caps()).unwrap();
        let b = state.add_item(PrefabHandle(1), Quality(0), caps()).unwrap();
        assert_eq!(a, ItemId(0));
        assert_eq!(b, ItemId(1));
        state.release_item(a).unwrap();
        assert!(state.item(a).unwrap().removed);
        assert_eq!(state.item(b).unwrap().id, b);
    }

    #[test]
    fn inventory_of_item_finds_owned_container() {
        let mut state = StorageState::new();
        let item = state.add_item(PrefabHandle(1), Quality(0), caps()).unwrap();
        let inv = state
            .add_container_inventory(
                item,
                ContainerSpec::new(&[ContainerSlotRule::accepting(ItemCategory::all())]),
            )
            .unwrap();
        assert_eq!(state.inventory_of_item(item), Some(inv));
        assert_eq!(state.inventory_of_item(ItemId(999)), None);
    }

    #[test]
    fn replication_reports_due_inventories_once() {
        use crate::env::Env;
        use crate::testkit::Recorder;

        let mut state = StorageState::with_config(StorageConfig::with_sync_delay(2));
        let recorder = Recorder::default();
        let env = Env::empty().with_sync(&recorder);
        let inv = state.add_plain_inventory(Owner::World, 2).unwrap();
        let item = state.add_item(PrefabHandle(1), Quality(0), caps()).unwrap();
        state.put(inv, item, 0, None, true, true, &env).unwrap();

        // The two-tick window is still open.
        state.tick_replication(&env);
        state.tick_replication(&env);
        assert!(recorder.synced().is_empty());

        state.tick_replication(&env);
        assert_eq!(recorder.synced(), vec![inv]);
        assert!(!state.inventory(inv).unwrap().dirty);

        // A clean inventory is not reported again.
        state.tick_replication(&env);
        assert_eq!(recorder.synced(), vec![inv]);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn state_root_is_deterministic() {
        let build = || {
            let mut state = StorageState::new();
            state.add_item(PrefabHandle(1), Quality(0), caps()).unwrap();
            state.add_plain_inventory(Owner::World, 4).unwrap();
            state
        };
        assert_eq!(hex::encode(build().state_root()), hex::encode(build().state_root()));

        let mut other = build();
        other.add_item(PrefabHandle(2), Quality(0), caps()).unwrap();
        assert_ne!(build().state_root(), other.state_root());
    }
}
