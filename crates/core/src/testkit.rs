//! Shared helpers for the operation tests.

use std::sync::Mutex;

use crate::env::{
    CombineHook, CombineOutcome, EquipHook, PhysicsHook, SyncHook, TelemetryHook,
};
use crate::state::{
    EntityId, InventoryId, ItemCaps, ItemCategory, ItemId, PrefabHandle, Quality, SlotTag,
    StorageState,
};

/// Caps for a plain stackable item that only goes in generic slots.
pub fn caps_any(max_stack: u8) -> ItemCaps {
    ItemCaps::new(&[SlotTag::ANY], ItemCategory::MISC, max_stack)
}

pub fn spawn(state: &mut StorageState, prefab: u32, caps: ItemCaps) -> ItemId {
    state
        .add_item(PrefabHandle(prefab), Quality(0), caps)
        .unwrap()
}

/// Collaborator that records every hook invocation.
#[derive(Default)]
pub struct Recorder {
    bodies: Mutex<Vec<(ItemId, bool)>>,
    equips: Mutex<Vec<(ItemId, EntityId, bool)>>,
    taken: Mutex<Vec<ItemId>>,
    rejections: Mutex<Vec<(InventoryId, usize)>>,
    synced: Mutex<Vec<InventoryId>>,
}

impl Recorder {
    pub fn bodies(&self) -> Vec<(ItemId, bool)> {
        self.bodies.lock().unwrap().clone()
    }

    /// `(item, character, equipped)` tuples in firing order.
    pub fn equips(&self) -> Vec<(ItemId, EntityId, bool)> {
        self.equips.lock().unwrap().clone()
    }

    pub fn taken(&self) -> Vec<ItemId> {
        self.taken.lock().unwrap().clone()
    }

    pub fn rejections(&self) -> Vec<(InventoryId, usize)> {
        self.rejections.lock().unwrap().clone()
    }

    pub fn synced(&self) -> Vec<InventoryId> {
        self.synced.lock().unwrap().clone()
    }
}

impl PhysicsHook for Recorder {
    fn set_body_enabled(&self, item: ItemId, enabled: bool) {
        self.bodies.lock().unwrap().push((item, enabled));
    }
}

impl EquipHook for Recorder {
    fn on_equip(&self, item: ItemId, character: EntityId) {
        self.equips.lock().unwrap().push((item, character, true));
    }

    fn on_unequip(&self, item: ItemId, character: EntityId) {
        self.equips.lock().unwrap().push((item, character, false));
    }
}

impl TelemetryHook for Recorder {
    fn on_item_taken(&self, item: ItemId, _user: Option<EntityId>) {
        self.taken.lock().unwrap().push(item);
    }

    fn on_rejected(&self, inventory: InventoryId, index: usize) {
        self.rejections.lock().unwrap().push((inventory, index));
    }
}

impl SyncHook for Recorder {
    fn mark_dirty(&self, inventory: InventoryId) {
        self.synced.lock().unwrap().push(inventory);
    }
}

/// Combine hook returning a fixed outcome, recording the pairs consulted.
pub struct Combiner {
    pub outcome: CombineOutcome,
    pub calls: Mutex<Vec<(ItemId, ItemId)>>,
}

impl Combiner {
    pub fn new(outcome: CombineOutcome) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl CombineHook for Combiner {
    fn combine(
        &self,
        existing: ItemId,
        incoming: ItemId,
        _user: Option<EntityId>,
    ) -> CombineOutcome {
        self.calls.lock().unwrap().push((existing, incoming));
        self.outcome
    }
}
