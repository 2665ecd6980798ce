//! Inventory storage: a fixed-size array of slots owned by an entity.
//!
//! Three shapes share one representation, selected by [`InventoryKind`]:
//! - `Plain`: generic storage, every slot behaves like an ANY slot
//! - `Character`: per-slot type tags with dedicated (equipment) slots
//! - `Container`: item-owned storage with per-slot acceptance filters
//!
//! The kind is plain data rather than a trait object so that state stays
//! cloneable, serializable, and bit-identical across peers.

use arrayvec::ArrayVec;

use super::item::ItemRecord;
use super::slot::ItemSlot;
use super::tags::{ItemCategory, SlotTag};
use super::{EntityId, InventoryId, ItemId};
use crate::config::StorageConfig;
use crate::state::ItemTable;

/// Entity holding an inventory. Used to disambiguate ownership cycles: the
/// self-containment guard walks `Item` owners upward.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Owner {
    Character(EntityId),
    Item(ItemId),
    /// Free-standing storage (e.g. a wreck cache) not owned by any entity.
    World,
}

/// Character slot metadata: one type tag per slot index, fixed at
/// construction from configuration data.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CharacterSpec {
    pub slot_tags: ArrayVec<SlotTag, { StorageConfig::MAX_INVENTORY_SLOTS }>,
    /// Tags of limb slots this character physically lacks (e.g. a severed
    /// right hand). Combinations referencing them are skipped.
    pub missing_limbs: SlotTag,
}

impl CharacterSpec {
    pub fn new(slot_tags: &[SlotTag]) -> Self {
        let mut tags = ArrayVec::new();
        for tag in slot_tags {
            tags.push(*tag);
        }
        Self {
            slot_tags: tags,
            missing_limbs: SlotTag::empty(),
        }
    }

    pub fn with_missing_limbs(mut self, missing: SlotTag) -> Self {
        self.missing_limbs = missing;
        self
    }
}

/// Container-defined acceptance rule for one slot index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerSlotRule {
    /// Categories accepted in this slot; an item qualifies if any of its
    /// categories intersect.
    pub accepts: ItemCategory,
    /// Container override for the stack ceiling in this slot (still capped
    /// by the item's own `max_stack`).
    pub max_stack_override: Option<u8>,
}

impl ContainerSlotRule {
    pub fn accepting(accepts: ItemCategory) -> Self {
        Self {
            accepts,
            max_stack_override: None,
        }
    }

    pub fn with_max_stack(mut self, max_stack: u8) -> Self {
        self.max_stack_override = Some(max_stack);
        self
    }
}

/// Container slot metadata, one rule per slot index.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContainerSpec {
    pub rules: ArrayVec<ContainerSlotRule, { StorageConfig::MAX_INVENTORY_SLOTS }>,
}

impl ContainerSpec {
    pub fn new(rules: &[ContainerSlotRule]) -> Self {
        let mut out = ArrayVec::new();
        for rule in rules {
            out.push(*rule);
        }
        Self { rules: out }
    }
}

/// Placement-rule specialization of an inventory.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InventoryKind {
    Plain,
    Character(CharacterSpec),
    Container(ContainerSpec),
}

/// Fixed-capacity array of slots with network-dirty bookkeeping.
///
/// Created once with its owner and capacity; slots never resize. Items are
/// never created or destroyed here, only referenced.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Inventory {
    pub id: InventoryId,
    pub owner: Owner,
    pub kind: InventoryKind,
    slots: ArrayVec<ItemSlot, { StorageConfig::MAX_INVENTORY_SLOTS }>,
    /// Contents changed since the last replication sync.
    pub dirty: bool,
    /// Debounce window in ticks before a dirty inventory is synced.
    pub sync_delay: u32,
}

impl Inventory {
    pub fn new(id: InventoryId, owner: Owner, capacity: usize) -> Self {
        let mut slots = ArrayVec::new();
        for _ in 0..capacity {
            slots.push(ItemSlot::new());
        }
        Self {
            id,
            owner,
            kind: InventoryKind::Plain,
            slots,
            dirty: false,
            sync_delay: 0,
        }
    }

    /// Character inventory: one slot per declared tag.
    pub fn character(id: InventoryId, owner: EntityId, spec: CharacterSpec) -> Self {
        let mut inventory = Self::new(id, Owner::Character(owner), spec.slot_tags.len());
        inventory.kind = InventoryKind::Character(spec);
        inventory
    }

    /// Container inventory owned by an item: one slot per declared rule.
    pub fn container(id: InventoryId, owner: ItemId, spec: ContainerSpec) -> Self {
        let mut inventory = Self::new(id, Owner::Item(owner), spec.rules.len());
        inventory.kind = InventoryKind::Container(spec);
        inventory
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn slot(&self, index: usize) -> Option<&ItemSlot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut ItemSlot> {
        self.slots.get_mut(index)
    }

    pub fn slots(&self) -> &[ItemSlot] {
        &self.slots
    }

    /// Is the item contained in this inventory. Does not recursively check
    /// items inside items.
    pub fn contains(&self, item: ItemId) -> bool {
        self.slots.iter().any(|slot| slot.contains(item))
    }

    /// Index of the first slot the item is contained in.
    pub fn find_index(&self, item: ItemId) -> Option<usize> {
        self.slots.iter().position(|slot| slot.contains(item))
    }

    /// Indices of all slots the item is contained in (two-handed items can
    /// occupy more than one).
    pub fn find_indices(&self, item: ItemId) -> ArrayVec<usize, { StorageConfig::MAX_INVENTORY_SLOTS }> {
        let mut indices = ArrayVec::new();
        for (index, slot) in self.slots.iter().enumerate() {
            if slot.contains(item) {
                indices.push(index);
            }
        }
        indices
    }

    /// First item of the stack in the given slot, if any.
    pub fn item_at(&self, index: usize) -> Option<ItemId> {
        self.slots.get(index).and_then(|slot| slot.first())
    }

    /// Whole stack in the given slot.
    pub fn items_at(&self, index: usize) -> &[ItemId] {
        self.slots
            .get(index)
            .map(|slot| slot.items())
            .unwrap_or(&[])
    }

    /// First item anywhere in the inventory, in slot order.
    pub fn first_item(&self) -> Option<ItemId> {
        self.slots.iter().find_map(|slot| slot.first())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_empty())
    }

    /// Is there room for more items. With `take_stacks_into_account`, the
    /// inventory only counts as full when every stack is at its ceiling.
    pub fn is_full(&self, items: &ItemTable, take_stacks_into_account: bool) -> bool {
        for slot in &self.slots {
            let Some(first) = slot.first() else {
                return false;
            };
            if take_stacks_into_account {
                let max_stack = items
                    .record(first)
                    .map(|record| record.caps.max_stack as usize)
                    .unwrap_or(0);
                if slot.len() < max_stack {
                    return false;
                }
            }
        }
        true
    }

    /// Type tag of the slot at `index`. Non-character inventories behave as
    /// all-ANY storage.
    pub fn slot_tag(&self, index: usize) -> SlotTag {
        match &self.kind {
            InventoryKind::Character(spec) => {
                spec.slot_tags.get(index).copied().unwrap_or(SlotTag::ANY)
            }
            _ => SlotTag::ANY,
        }
    }

    /// First slot index whose tag intersects the given limb tag.
    pub fn find_limb_slot(&self, tag: SlotTag) -> Option<usize> {
        let InventoryKind::Character(spec) = &self.kind else {
            return None;
        };
        spec.slot_tags.iter().position(|slot| slot.intersects(tag))
    }

    /// Effective stack ceiling for placing `record` into slot `index`:
    /// the item's own ceiling, narrowed by a container override. Dedicated
    /// character slots never stack.
    pub fn slot_max_stack(&self, index: usize, record: &ItemRecord) -> u8 {
        match &self.kind {
            InventoryKind::Container(spec) => spec
                .rules
                .get(index)
                .and_then(|rule| rule.max_stack_override)
                .map(|cap| cap.min(record.caps.max_stack))
                .unwrap_or(record.caps.max_stack),
            InventoryKind::Character(_) if self.slot_tag(index).is_dedicated() => 1,
            _ => record.caps.max_stack,
        }
    }

    /// Container acceptance filter for slot `index`; non-container
    /// inventories accept everything.
    pub fn slot_accepts(&self, index: usize, record: &ItemRecord) -> bool {
        match &self.kind {
            InventoryKind::Container(spec) => spec
                .rules
                .get(index)
                .is_some_and(|rule| rule.accepts.intersects(record.caps.categories)),
            _ => true,
        }
    }

    /// Flags the contents as changed and (re)arms the sync debounce window.
    pub fn mark_dirty(&mut self, delay_ticks: u32) {
        self.dirty = true;
        self.sync_delay = delay_ticks;
    }

    /// Advances the debounce window one tick; returns true when a dirty
    /// inventory is due for sync, clearing the flag.
    pub fn tick_sync(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        if self.sync_delay > 0 {
            self.sync_delay -= 1;
            return false;
        }
        self.dirty = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_tags_default_to_any_outside_characters() {
        let inventory = Inventory::new(InventoryId(0), Owner::World, 3);
        assert_eq!(inventory.slot_tag(0), SlotTag::ANY);
        assert_eq!(inventory.capacity(), 3);
    }

    #[test]
    fn character_slot_metadata() {
        let spec = CharacterSpec::new(&[SlotTag::RIGHT_HAND, SlotTag::LEFT_HAND, SlotTag::ANY])
            .with_missing_limbs(SlotTag::LEFT_HAND);
        let inventory = Inventory::character(InventoryId(0), EntityId(1), spec);
        assert_eq!(inventory.capacity(), 3);
        assert_eq!(inventory.slot_tag(0), SlotTag::RIGHT_HAND);
        assert_eq!(inventory.find_limb_slot(SlotTag::LEFT_HAND), Some(1));
        assert_eq!(inventory.find_limb_slot(SlotTag::HEAD), None);
    }

    #[test]
    fn is_full_accounts_for_stack_headroom() {
        use crate::env::Env;
        use crate::state::StorageState;
        use crate::testkit::{caps_any, spawn};

        let mut state = StorageState::new();
        let inv = state.add_plain_inventory(Owner::World, 1).unwrap();
        let env = Env::empty();

        assert_eq!(state.inventory(inv).unwrap().first_item(), None);

        let first = spawn(&mut state, 1, caps_any(2));
        state.put(inv, first, 0, None, true, true, &env).unwrap();

        let inventory = state.inventory(inv).unwrap();
        assert_eq!(inventory.first_item(), Some(first));
        // Every slot is occupied, but the stack still has headroom.
        assert!(inventory.is_full(state.items(), false));
        assert!(!inventory.is_full(state.items(), true));

        let second = spawn(&mut state, 1, caps_any(2));
        state.put(inv, second, 0, None, true, true, &env).unwrap();
        assert!(state.inventory(inv).unwrap().is_full(state.items(), true));
    }

    #[test]
    fn sync_debounce_expires_after_delay() {
        let mut inventory = Inventory::new(InventoryId(0), Owner::World, 1);
        inventory.mark_dirty(2);
        assert!(!inventory.tick_sync());
        assert!(!inventory.tick_sync());
        assert!(inventory.tick_sync());
        assert!(!inventory.dirty);
    }
}
