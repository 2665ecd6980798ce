//! All-or-nothing exchange of a slot's occupants with an incoming item.
//!
//! The swap snapshots both sides, removes them, and replays placement
//! through the ordinary entry points; if any forward placement fails, the
//! snapshots are restored at their exact original indices. Transition hooks
//! (equip, taken) fire once from the net before/after difference, so a
//! rolled-back swap is observationally silent.

use arrayvec::ArrayVec;

use crate::config::StorageConfig;
use crate::env::Env;
use crate::state::{
    EntityId, InventoryId, InventoryKind, ItemId, Owner, SlotTag, StorageState,
};

type SlotIndices = ArrayVec<usize, { StorageConfig::MAX_INVENTORY_SLOTS }>;

/// Pre-swap placement of one item: where it sat, whether it was equipped,
/// and which character owned it.
struct SwapEntry {
    item: ItemId,
    inventory: InventoryId,
    indices: SlotIndices,
    equipped: Option<EntityId>,
    owner: Option<EntityId>,
}

impl StorageState {
    /// Exchanges the stack at `inv[index]` with the item (or its whole
    /// stack, per `whole_stack`). Returns false and restores the pre-swap
    /// placement exactly when either side cannot be placed.
    #[allow(clippy::too_many_arguments)]
    pub fn try_swapping(
        &mut self,
        inv: InventoryId,
        index: usize,
        item: ItemId,
        user: Option<EntityId>,
        create_sync_event: bool,
        whole_stack: bool,
        env: &Env<'_>,
    ) -> bool {
        let Some(other_inv) = self.item(item).and_then(|record| record.parent) else {
            return false;
        };
        let Some(inventory) = self.inventory(inv) else {
            return false;
        };
        let Some(slot) = inventory.slot(index) else {
            return false;
        };
        if slot.is_empty() || slot.contains(item) {
            return false;
        }
        let Some(other_inventory) = self.inventory(other_inv) else {
            return false;
        };

        // Route the displaced occupants toward the slot the item came from.
        // When the item only sits in dedicated (equipment) slots, the
        // occupants likely cannot take its place directly, so the placement
        // order below flips and a generic-slot fallback applies.
        let mut other_is_equipped = false;
        let mut routed_index = None;
        for i in 0..other_inventory.capacity() {
            let Some(other_slot) = other_inventory.slot(i) else {
                continue;
            };
            if !other_slot.contains(item) {
                continue;
            }
            if other_inventory.slot_tag(i) == SlotTag::ANY {
                routed_index = Some(i);
                break;
            }
            other_is_equipped = true;
        }
        let Some(other_index) = routed_index.or_else(|| other_inventory.find_index(item)) else {
            return false;
        };

        let existing_items: Vec<ItemId> = if whole_stack {
            slot.items().to_vec()
        } else {
            slot.first().into_iter().collect()
        };
        let stacked_items: Vec<ItemId> = if whole_stack {
            let mut stacked = Vec::new();
            for i in 0..other_inventory.capacity() {
                let Some(other_slot) = other_inventory.slot(i) else {
                    continue;
                };
                if !other_slot.contains(item) {
                    continue;
                }
                for &instance in other_slot.items() {
                    if !stacked.contains(&instance) {
                        stacked.push(instance);
                    }
                }
            }
            stacked
        } else {
            vec![item]
        };

        let snapshot = |items: &[ItemId], holder: &crate::state::Inventory| -> Vec<SwapEntry> {
            items
                .iter()
                .map(|&entry| SwapEntry {
                    item: entry,
                    inventory: holder.id,
                    indices: holder.find_indices(entry),
                    equipped: self.equipped_character(entry),
                    owner: self.owning_character(holder.id),
                })
                .collect()
        };
        let existing_origin = snapshot(&existing_items, inventory);
        let stacked_origin = snapshot(&stacked_items, other_inventory);

        for entry in existing_origin.iter().chain(stacked_origin.iter()) {
            self.detach(entry.item);
        }

        // Intermediate placements run silenced; net transitions fire below.
        let muted = env.silenced();
        let mut success;
        if other_is_equipped {
            // The occupants head for the vacated equipment slot last, with a
            // generic-slot fallback for a single displaced item.
            success = self.place_all(inv, &stacked_items, index, user, create_sync_event, &muted);
            if success {
                success = self
                    .place_all(other_inv, &existing_items, other_index, user, create_sync_event, &muted)
                    || self.place_single_generic(
                        other_inv,
                        &existing_items,
                        user,
                        create_sync_event,
                        &muted,
                    );
            }
        } else {
            success = self
                .place_all(other_inv, &existing_items, other_index, user, create_sync_event, &muted)
                || self.place_single_generic(
                    other_inv,
                    &existing_items,
                    user,
                    create_sync_event,
                    &muted,
                );
            if success {
                success =
                    self.place_all(inv, &stacked_items, index, user, create_sync_event, &muted);
            }
            // Last resort: a single displaced item flagged droppable moves
            // to the holding character's generic slots, or to the world.
            if !success
                && let &[displaced] = existing_items.as_slice()
                && self
                    .item(displaced)
                    .is_some_and(|record| record.caps.allow_drop_on_swap)
            {
                if !self.relocate_blocker(displaced, inv, user, create_sync_event, &muted) {
                    self.drop_item(displaced, &muted);
                }
                success =
                    self.place_all(inv, &stacked_items, index, user, create_sync_event, &muted);
            }
        }

        if !success {
            for entry in existing_origin.iter().chain(stacked_origin.iter()) {
                self.detach(entry.item);
            }
            for entry in existing_origin.iter().chain(stacked_origin.iter()) {
                self.restore(entry, user, create_sync_event, &muted);
            }
        }

        // Net transitions: a rolled-back swap restores every placement, so
        // nothing fires.
        for entry in existing_origin.iter().chain(stacked_origin.iter()) {
            let now_equipped = self.equipped_character(entry.item);
            if let Some(equip) = env.equip() {
                match (entry.equipped, now_equipped) {
                    (None, Some(character)) => equip.on_equip(entry.item, character),
                    (Some(character), None) => equip.on_unequip(entry.item, character),
                    (Some(previous), Some(current)) if previous != current => {
                        equip.on_unequip(entry.item, previous);
                        equip.on_equip(entry.item, current);
                    }
                    _ => {}
                }
            }
            let now_owner = self
                .item(entry.item)
                .and_then(|record| record.parent)
                .and_then(|parent| self.owning_character(parent));
            if now_owner.is_some()
                && now_owner != entry.owner
                && let Some(telemetry) = env.telemetry()
            {
                telemetry.on_item_taken(entry.item, user);
            }
        }
        success
    }

    fn place_all(
        &mut self,
        inv: InventoryId,
        items: &[ItemId],
        index: usize,
        user: Option<EntityId>,
        create_sync_event: bool,
        env: &Env<'_>,
    ) -> bool {
        items.iter().all(|&item| {
            self.try_put_at(inv, item, index, false, false, user, create_sync_event, false, env)
                .is_ok()
        })
    }

    /// Generic-slot fallback for exactly one displaced item.
    fn place_single_generic(
        &mut self,
        inv: InventoryId,
        items: &[ItemId],
        user: Option<EntityId>,
        create_sync_event: bool,
        env: &Env<'_>,
    ) -> bool {
        let &[item] = items else {
            return false;
        };
        self.try_put(inv, item, user, &[SlotTag::ANY], create_sync_event, false, env)
            .is_ok()
    }

    /// Moves a displaced item into the generic slots of the character
    /// holding the container the swap targets, if there is one.
    fn relocate_blocker(
        &mut self,
        displaced: ItemId,
        origin: InventoryId,
        user: Option<EntityId>,
        create_sync_event: bool,
        env: &Env<'_>,
    ) -> bool {
        let Some(inventory) = self.inventory(origin) else {
            return false;
        };
        let Owner::Item(container_item) = inventory.owner else {
            return false;
        };
        let Some(parent) = self.item(container_item).and_then(|record| record.parent) else {
            return false;
        };
        if !matches!(
            self.inventory(parent).map(|inventory| &inventory.kind),
            Some(InventoryKind::Character(_))
        ) {
            return false;
        }
        self.try_put(parent, displaced, user, &[SlotTag::ANY], create_sync_event, false, env)
            .is_ok()
    }

    /// Puts an item back at its exact pre-swap indices.
    fn restore(
        &mut self,
        entry: &SwapEntry,
        user: Option<EntityId>,
        create_sync_event: bool,
        env: &Env<'_>,
    ) {
        let Some((&first, rest)) = entry.indices.split_first() else {
            return;
        };
        let _ = self.put(entry.inventory, entry.item, first, user, true, create_sync_event, env);
        for &extra in rest {
            let _ = self.force_add(entry.inventory, entry.item, extra);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::PlacementError;
    use crate::state::{
        CharacterSpec, ContainerSlotRule, ContainerSpec, ItemCaps, ItemCategory, PrefabHandle,
        Quality,
    };
    use crate::testkit::{caps_any, spawn, Recorder};

    #[test]
    fn swap_exchanges_occupants_between_inventories() {
        let mut state = StorageState::new();
        let env = Env::empty();
        let a = state.add_plain_inventory(Owner::World, 1).unwrap();
        let b = state.add_plain_inventory(Owner::World, 1).unwrap();
        let x = spawn(&mut state, 1, caps_any(1));
        let y = spawn(&mut state, 2, caps_any(1));
        state.put(a, x, 0, None, true, true, &env).unwrap();
        state.put(b, y, 0, None, true, true, &env).unwrap();

        state
            .try_put_at(a, y, 0, true, false, None, true, false, &env)
            .unwrap();
        assert_eq!(state.inventory(a).unwrap().item_at(0), Some(y));
        assert_eq!(state.inventory(b).unwrap().item_at(0), Some(x));
        assert_eq!(state.item(x).unwrap().parent, Some(b));
        assert_eq!(state.item(y).unwrap().parent, Some(a));
    }

    #[test]
    fn whole_stack_swap_moves_every_instance() {
        let mut state = StorageState::new();
        let env = Env::empty();
        let a = state.add_plain_inventory(Owner::World, 1).unwrap();
        let b = state.add_plain_inventory(Owner::World, 1).unwrap();
        let bullets: Vec<_> = (0..3).map(|_| spawn(&mut state, 1, caps_any(4))).collect();
        for &bullet in &bullets {
            state.put(a, bullet, 0, None, true, true, &env).unwrap();
        }
        let grenade = spawn(&mut state, 2, caps_any(4));
        state.put(b, grenade, 0, None, true, true, &env).unwrap();

        state
            .try_put_at(a, grenade, 0, true, false, None, true, false, &env)
            .unwrap();
        assert_eq!(state.inventory(a).unwrap().items_at(0), &[grenade]);
        assert_eq!(state.inventory(b).unwrap().items_at(0), bullets.as_slice());
    }

    #[test]
    fn failed_swap_restores_both_sides_exactly() {
        let mut state = StorageState::new();
        let env = Env::empty();
        // The container only accepts ammunition, so the displaced weapon has
        // nowhere to go and the swap must roll back.
        let a = state.add_plain_inventory(Owner::World, 1).unwrap();
        let holder = spawn(&mut state, 9, caps_any(1));
        let b = state
            .add_container_inventory(
                holder,
                ContainerSpec::new(&[ContainerSlotRule::accepting(ItemCategory::AMMUNITION)]),
            )
            .unwrap();
        let weapon = state
            .add_item(
                PrefabHandle(1),
                Quality(0),
                ItemCaps::new(&[SlotTag::ANY], ItemCategory::WEAPON, 1),
            )
            .unwrap();
        let ammo = state
            .add_item(
                PrefabHandle(2),
                Quality(0),
                ItemCaps::new(&[SlotTag::ANY], ItemCategory::AMMUNITION, 1),
            )
            .unwrap();
        state.put(a, weapon, 0, None, true, true, &env).unwrap();
        state.put(b, ammo, 0, None, true, true, &env).unwrap();

        let before = state.clone();
        assert_eq!(
            state.try_put_at(a, ammo, 0, true, false, None, true, false, &env),
            Err(PlacementError::SwapFailed)
        );
        assert_eq!(state, before);
    }

    #[test]
    fn rolled_back_swap_fires_no_transitions() {
        let mut state = StorageState::new();
        let recorder = Recorder::default();
        let env = Env::empty().with_equip(&recorder).with_telemetry(&recorder);
        let a = state.add_plain_inventory(Owner::World, 1).unwrap();
        let holder = spawn(&mut state, 9, caps_any(1));
        let b = state
            .add_container_inventory(
                holder,
                ContainerSpec::new(&[ContainerSlotRule::accepting(ItemCategory::AMMUNITION)]),
            )
            .unwrap();
        let weapon = state
            .add_item(
                PrefabHandle(1),
                Quality(0),
                ItemCaps::new(&[SlotTag::ANY], ItemCategory::WEAPON, 1),
            )
            .unwrap();
        let ammo = state
            .add_item(
                PrefabHandle(2),
                Quality(0),
                ItemCaps::new(&[SlotTag::ANY], ItemCategory::AMMUNITION, 1),
            )
            .unwrap();
        state.put(a, weapon, 0, None, true, true, &env).unwrap();
        state.put(b, ammo, 0, None, true, true, &env).unwrap();

        let taken_before = recorder.taken();
        let equips_before = recorder.equips();
        assert!(!state.try_swapping(a, 0, ammo, None, true, true, &env));
        assert_eq!(recorder.taken(), taken_before);
        assert_eq!(recorder.equips(), equips_before);
    }

    #[test]
    fn swapping_into_an_equipment_slot_reroutes_the_occupant() {
        let mut state = StorageState::new();
        let recorder = Recorder::default();
        let env = Env::empty().with_equip(&recorder);
        let character = EntityId(3);
        let char_inv = state
            .add_character_inventory(
                character,
                CharacterSpec::new(&[SlotTag::RIGHT_HAND, SlotTag::ANY]),
            )
            .unwrap();
        let chest = state.add_plain_inventory(Owner::World, 2).unwrap();

        let weapon_caps =
            ItemCaps::new(&[SlotTag::RIGHT_HAND, SlotTag::ANY], ItemCategory::WEAPON, 1);
        let held = state
            .add_item(PrefabHandle(1), Quality(0), weapon_caps.clone())
            .unwrap();
        state
            .resolve_slots(char_inv, held, &[SlotTag::RIGHT_HAND], None, true, false, &env)
            .unwrap();
        let incoming = state
            .add_item(PrefabHandle(2), Quality(0), weapon_caps)
            .unwrap();
        state.put(chest, incoming, 0, None, true, true, &env).unwrap();

        state
            .try_put_at(char_inv, incoming, 0, true, false, Some(character), true, false, &env)
            .unwrap();
        assert_eq!(state.inventory(char_inv).unwrap().item_at(0), Some(incoming));
        assert_eq!(state.inventory(chest).unwrap().item_at(0), Some(held));
        // Net transitions: the held weapon unequips, the incoming one equips.
        assert_eq!(
            recorder.equips(),
            vec![
                (held, character, true),
                (held, character, false),
                (incoming, character, true),
            ]
        );
    }

    #[test]
    fn equipped_source_falls_back_to_generic_slots() {
        let mut state = StorageState::new();
        let recorder = Recorder::default();
        let env = Env::empty().with_equip(&recorder);
        let character = EntityId(3);
        let char_inv = state
            .add_character_inventory(
                character,
                CharacterSpec::new(&[SlotTag::RIGHT_HAND, SlotTag::ANY]),
            )
            .unwrap();
        let chest = state.add_plain_inventory(Owner::World, 1).unwrap();

        let weapon = state
            .add_item(
                PrefabHandle(1),
                Quality(0),
                ItemCaps::new(&[SlotTag::RIGHT_HAND, SlotTag::ANY], ItemCategory::WEAPON, 1),
            )
            .unwrap();
        state
            .resolve_slots(char_inv, weapon, &[SlotTag::RIGHT_HAND], None, true, false, &env)
            .unwrap();
        // The rock cannot take the vacated hand slot, so it lands in the
        // character's generic slot instead.
        let rock = spawn(&mut state, 2, caps_any(1));
        state.put(chest, rock, 0, None, true, true, &env).unwrap();

        assert!(state.try_swapping(chest, 0, weapon, Some(character), true, false, &env));
        assert_eq!(state.inventory(chest).unwrap().item_at(0), Some(weapon));
        assert_eq!(state.inventory(char_inv).unwrap().item_at(1), Some(rock));
        assert!(state.inventory(char_inv).unwrap().slot(0).unwrap().is_empty());
        assert_eq!(state.equipped_character(weapon), None);
    }

    #[test]
    fn droppable_blocker_is_dropped_as_a_last_resort() {
        let mut state = StorageState::new();
        let recorder = Recorder::default();
        let env = Env::empty().with_physics(&recorder);
        // The chest only accepts ammunition, so the displaced weapon cannot
        // go where the incoming ammo came from; the drop flag lets the swap
        // finish by releasing it to the world.
        let a = state.add_plain_inventory(Owner::World, 1).unwrap();
        let holder = spawn(&mut state, 9, caps_any(1));
        let b = state
            .add_container_inventory(
                holder,
                ContainerSpec::new(&[ContainerSlotRule::accepting(ItemCategory::AMMUNITION)]),
            )
            .unwrap();
        let weapon = state
            .add_item(
                PrefabHandle(1),
                Quality(0),
                ItemCaps::new(&[SlotTag::ANY], ItemCategory::WEAPON, 1).with_drop_on_swap(),
            )
            .unwrap();
        let ammo = state
            .add_item(
                PrefabHandle(2),
                Quality(0),
                ItemCaps::new(&[SlotTag::ANY], ItemCategory::AMMUNITION, 1),
            )
            .unwrap();
        state.put(a, weapon, 0, None, true, true, &env).unwrap();
        state.put(b, ammo, 0, None, true, true, &env).unwrap();

        assert!(state.try_swapping(a, 0, ammo, None, true, true, &env));
        assert_eq!(state.inventory(a).unwrap().item_at(0), Some(ammo));
        assert_eq!(state.item(weapon).unwrap().parent, None);
        // The dropped weapon's body comes back.
        assert!(recorder.bodies().contains(&(weapon, true)));
    }
}
