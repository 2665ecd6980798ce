//! Generic inventory placement: find-allowed-slot, put, remove, and the
//! explicit-index entry point with its combine/swap fallbacks.
//!
//! Operations are deterministic: slot candidates are always scanned in
//! ascending index order, so peers replaying the same intents pick the same
//! slots.

use crate::env::{CombineOutcome, Env};
use crate::ops::PlacementError;
use crate::state::{
    EntityId, InventoryId, InventoryKind, ItemId, SlotTag, StorageState,
};

impl StorageState {
    /// Returns true if the item (transitively) owns this inventory, i.e.
    /// placing it here would make it its own container.
    pub fn item_owns_self(&self, inv: InventoryId, item: ItemId) -> bool {
        use crate::state::Owner;

        let mut current = inv;
        // Bounded by the registry size; a longer chain means a cycle, which
        // the guard itself exists to prevent.
        for _ in 0..crate::config::StorageConfig::MAX_INVENTORIES {
            let Some(inventory) = self.inventory(current) else {
                return false;
            };
            let Owner::Item(owner_item) = inventory.owner else {
                return false;
            };
            if owner_item == item {
                return true;
            }
            match self.item(owner_item).and_then(|record| record.parent) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
        false
    }

    /// First slot index that can take the item: a stack-preferring pass over
    /// occupied slots, then the first free compatible slot. `None` when the
    /// item already occupies this inventory or would contain itself.
    pub fn find_allowed_slot(
        &self,
        inv: InventoryId,
        item: ItemId,
        ignore_condition: bool,
    ) -> Option<usize> {
        if self.item_owns_self(inv, item) {
            return None;
        }
        let inventory = self.inventory(inv)?;
        if inventory.contains(item) {
            return None;
        }
        let capacity = inventory.capacity();
        for index in 0..capacity {
            let occupied = inventory.slot(index).is_some_and(|slot| !slot.is_empty());
            if occupied && self.can_be_put_in_slot(inv, item, index, ignore_condition) {
                return Some(index);
            }
        }
        (0..capacity).find(|&index| self.can_be_put_in_slot(inv, item, index, ignore_condition))
    }

    /// Is there any suitable slot for the item in this inventory.
    pub fn can_be_put(&self, inv: InventoryId, item: ItemId) -> bool {
        let Some(inventory) = self.inventory(inv) else {
            return false;
        };
        (0..inventory.capacity()).any(|index| self.can_be_put_in_slot(inv, item, index, false))
    }

    /// Can the item be put in the specified slot. For character inventories
    /// this additionally requires a capability matching the slot's tag, and
    /// dedicated slots never stack; for containers the slot's acceptance
    /// filter applies.
    pub fn can_be_put_in_slot(
        &self,
        inv: InventoryId,
        item: ItemId,
        index: usize,
        ignore_condition: bool,
    ) -> bool {
        if self.item_owns_self(inv, item) {
            return false;
        }
        let Some(record) = self.item(item) else {
            return false;
        };
        if record.removed {
            return false;
        }
        let Some(inventory) = self.inventory(inv) else {
            return false;
        };
        let Some(slot) = inventory.slot(index) else {
            return false;
        };
        if !inventory.slot_accepts(index, record) {
            return false;
        }
        if let InventoryKind::Character(_) = inventory.kind {
            let tag = inventory.slot_tag(index);
            if !record.caps.intersects(tag) {
                return false;
            }
            if tag.is_dedicated() && !slot.is_empty() {
                return false;
            }
        }
        let max_stack = inventory.slot_max_stack(index, record);
        slot.can_accept(record, &self.items, max_stack, ignore_condition)
    }

    /// True if the item sits in a dedicated slot whose tag intersects `tag`.
    pub fn is_in_dedicated_slot(&self, inv: InventoryId, item: ItemId, tag: SlotTag) -> bool {
        let Some(inventory) = self.inventory(inv) else {
            return false;
        };
        inventory.find_indices(item).iter().any(|&index| {
            let slot_tag = inventory.slot_tag(index);
            slot_tag.is_dedicated() && slot_tag.intersects(tag)
        })
    }

    /// Character ultimately holding this inventory, walking item-owner
    /// chains upward (a toolbox in a cabinet in a character's bag belongs to
    /// that character).
    pub fn owning_character(&self, inv: InventoryId) -> Option<EntityId> {
        use crate::state::Owner;

        let mut current = inv;
        for _ in 0..crate::config::StorageConfig::MAX_INVENTORIES {
            let inventory = self.inventory(current)?;
            match inventory.owner {
                Owner::Character(character) => return Some(character),
                Owner::Item(owner_item) => {
                    current = self.item(owner_item).and_then(|record| record.parent)?;
                }
                Owner::World => return None,
            }
        }
        None
    }

    /// Character whose dedicated slot currently holds the item, if any.
    pub fn equipped_character(&self, item: ItemId) -> Option<EntityId> {
        use crate::state::Owner;

        let parent = self.item(item)?.parent?;
        let inventory = self.inventory(parent)?;
        let Owner::Character(character) = inventory.owner else {
            return None;
        };
        let equipped = inventory
            .find_indices(item)
            .iter()
            .any(|&index| inventory.slot_tag(index).is_dedicated());
        equipped.then_some(character)
    }

    /// Puts the item in the first allowed slot, or resolves typed slots for
    /// character inventories. No observable side effect on failure.
    #[allow(clippy::too_many_arguments)]
    pub fn try_put(
        &mut self,
        inv: InventoryId,
        item: ItemId,
        user: Option<EntityId>,
        allowed: &[SlotTag],
        create_sync_event: bool,
        ignore_condition: bool,
        env: &Env<'_>,
    ) -> Result<(), PlacementError> {
        let inventory = self
            .inventory(inv)
            .ok_or(PlacementError::UnknownInventory(inv))?;
        if matches!(inventory.kind, InventoryKind::Character(_)) {
            return self.resolve_slots(
                inv,
                item,
                allowed,
                user,
                create_sync_event,
                ignore_condition,
                env,
            );
        }
        if self.item_owns_self(inv, item) {
            return Err(PlacementError::SelfContainment { item });
        }
        match self.find_allowed_slot(inv, item, ignore_condition) {
            Some(index) => self.put(inv, item, index, user, true, create_sync_event, env),
            None => Err(PlacementError::Rejected),
        }
    }

    /// Explicit-index entry point: combine with the occupant if possible,
    /// place directly, or fall back to swapping. Failure leaves no side
    /// effect and emits the rejection signal.
    #[allow(clippy::too_many_arguments)]
    pub fn try_put_at(
        &mut self,
        inv: InventoryId,
        item: ItemId,
        index: usize,
        allow_swap: bool,
        allow_combine: bool,
        user: Option<EntityId>,
        create_sync_event: bool,
        ignore_condition: bool,
        env: &Env<'_>,
    ) -> Result<(), PlacementError> {
        let inventory = self
            .inventory(inv)
            .ok_or(PlacementError::UnknownInventory(inv))?;
        let capacity = inventory.capacity();
        if index >= capacity {
            return Err(PlacementError::IndexOutOfRange { index, capacity });
        }
        let occupant = inventory.item_at(index);

        // Combine interaction first: the occupant may absorb the incoming
        // item (done) or be consumed by it (retry into the freed slot).
        if allow_combine
            && let Some(existing) = occupant
            && let Some(combine) = env.combine()
            && let CombineOutcome::Combined { consumed_existing } =
                combine.combine(existing, item, user)
        {
            if consumed_existing {
                self.remove(existing, env);
                let emptied = self
                    .inventory(inv)
                    .is_some_and(|inventory| inventory.item_at(index).is_none());
                if emptied {
                    return self.try_put_at(
                        inv,
                        item,
                        index,
                        allow_swap,
                        false,
                        user,
                        create_sync_event,
                        ignore_condition,
                        env,
                    );
                }
            }
            return Ok(());
        }

        if self.can_be_put_in_slot(inv, item, index, ignore_condition) {
            return self.put(inv, item, index, user, true, create_sync_event, env);
        }

        let has_parent = self
            .item(item)
            .ok_or(PlacementError::UnknownItem(item))?
            .parent
            .is_some();
        if let Some(existing) = occupant
            && has_parent
            && allow_swap
        {
            // If the occupant is itself a single-slot container (e.g. a
            // holstered tool with one battery bay), try exchanging with its
            // contents before displacing the occupant.
            if let Some(own) = self.inventory_of_item(existing)
                && self
                    .inventory(own)
                    .is_some_and(|inventory| !inventory.contains(item))
                && self.container_slot_is_single(own)
                && self.try_swapping(own, 0, item, user, create_sync_event, false, env)
            {
                return Ok(());
            }
            if self.try_swapping(inv, index, item, user, create_sync_event, true, env)
                || self.try_swapping(inv, index, item, user, create_sync_event, false, env)
            {
                return Ok(());
            }
            return Err(PlacementError::SwapFailed);
        }

        if let Some(telemetry) = env.telemetry() {
            telemetry.on_rejected(inv, index);
        }
        Err(PlacementError::Rejected)
    }

    fn container_slot_is_single(&self, inv: InventoryId) -> bool {
        self.inventory(inv).is_some_and(|inventory| {
            matches!(
                &inventory.kind,
                InventoryKind::Container(spec)
                    if spec.rules.first().is_some_and(|rule| rule.max_stack_override == Some(1))
            )
        })
    }

    /// Unconditional placement, assuming validation already passed. Detaches
    /// the item from its previous inventory, appends it to the slot, updates
    /// the back-reference, disables the physics body, marks both inventories
    /// dirty, and fires ownership/equip transitions — one logical step.
    #[allow(clippy::too_many_arguments)]
    pub fn put(
        &mut self,
        inv: InventoryId,
        item: ItemId,
        index: usize,
        user: Option<EntityId>,
        remove_from_previous: bool,
        create_sync_event: bool,
        env: &Env<'_>,
    ) -> Result<(), PlacementError> {
        let capacity = self
            .inventory(inv)
            .ok_or(PlacementError::UnknownInventory(inv))?
            .capacity();
        if index >= capacity {
            return Err(PlacementError::IndexOutOfRange { index, capacity });
        }

        let record = self
            .item(item)
            .ok_or(PlacementError::UnknownItem(item))?
            .clone();
        let prev_parent = record.parent;
        let prev_owner = prev_parent.and_then(|parent| self.owning_character(parent));
        let was_equipped = self.equipped_character(item);

        if remove_from_previous && prev_parent.is_some() {
            self.detach(item);
        }

        {
            let items = &self.items;
            let inventory = self
                .inventories
                .iter_mut()
                .find(|inventory| inventory.id == inv)
                .ok_or(PlacementError::UnknownInventory(inv))?;
            let max_stack = inventory.slot_max_stack(index, &record);
            let slot = inventory
                .slot_mut(index)
                .ok_or(PlacementError::IndexOutOfRange { index, capacity })?;
            slot.add(&record, items, max_stack)?;
        }
        if let Some(record) = self.items.record_mut(item) {
            record.parent = Some(inv);
        }

        if create_sync_event {
            let delay = self.config.sync_delay_ticks;
            if let Some(inventory) = self.inventory_mut(inv) {
                inventory.mark_dirty(delay);
            }
            // Also delay syncing the inventory the item came from.
            if let Some(prev) = prev_parent
                && prev != inv
                && let Some(inventory) = self.inventory_mut(prev)
            {
                inventory.mark_dirty(delay);
            }
        }

        if let Some(physics) = env.physics() {
            physics.set_body_enabled(item, false);
        }

        // Ownership-change notification: exactly once per real transfer,
        // never on re-stacking within the same owner.
        let new_owner = self.owning_character(inv);
        if new_owner.is_some()
            && new_owner != prev_owner
            && let Some(telemetry) = env.telemetry()
        {
            telemetry.on_item_taken(item, user);
        }

        let now_equipped = self.equipped_character(item);
        if let Some(equip) = env.equip() {
            match (was_equipped, now_equipped) {
                (None, Some(character)) => equip.on_equip(item, character),
                (Some(character), None) => equip.on_unequip(item, character),
                (Some(previous), Some(current)) if previous != current => {
                    equip.on_unequip(item, previous);
                    equip.on_equip(item, current);
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Removes the item from every slot of its parent inventory (multi-slot
    /// items occupy several), clears the back-reference, re-enables the
    /// physics body, and fires the unequip transition if it was equipped.
    pub fn remove(&mut self, item: ItemId, env: &Env<'_>) {
        let was_equipped = self.equipped_character(item);
        let Some(prev) = self.detach(item) else {
            return;
        };
        let delay = self.config.sync_delay_ticks;
        if let Some(inventory) = self.inventory_mut(prev) {
            inventory.mark_dirty(delay);
        }
        if let Some(physics) = env.physics() {
            physics.set_body_enabled(item, true);
        }
        if let Some(character) = was_equipped
            && let Some(equip) = env.equip()
        {
            equip.on_unequip(item, character);
        }
    }

    /// Places the item back into the world (the ballistic part of dropping
    /// is the physics collaborator's concern). Unlike [`Self::remove`], this
    /// also applies to items already outside any inventory — a compound
    /// operation may have detached the item before deciding to drop it, and
    /// its body still needs re-enabling.
    pub fn drop_item(&mut self, item: ItemId, env: &Env<'_>) {
        let was_equipped = self.equipped_character(item);
        if let Some(prev) = self.detach(item) {
            let delay = self.config.sync_delay_ticks;
            if let Some(inventory) = self.inventory_mut(prev) {
                inventory.mark_dirty(delay);
            }
        }
        if let Some(physics) = env.physics() {
            physics.set_body_enabled(item, true);
        }
        if let Some(character) = was_equipped
            && let Some(equip) = env.equip()
        {
            equip.on_unequip(item, character);
        }
    }

    /// Slot and back-reference bookkeeping shared by removal paths; fires no
    /// hooks. Returns the inventory the item was detached from.
    pub(crate) fn detach(&mut self, item: ItemId) -> Option<InventoryId> {
        let prev = self.items.record(item)?.parent?;
        if let Some(inventory) = self
            .inventories
            .iter_mut()
            .find(|inventory| inventory.id == prev)
        {
            for index in 0..inventory.capacity() {
                if let Some(slot) = inventory.slot_mut(index) {
                    slot.remove(item);
                }
            }
        }
        if let Some(record) = self.items.record_mut(item) {
            record.parent = None;
        }
        Some(prev)
    }

    /// Appends an already-placed item to an additional slot of the same
    /// inventory (two-handed items span two indices). The back-reference is
    /// unchanged.
    pub(crate) fn force_add(
        &mut self,
        inv: InventoryId,
        item: ItemId,
        index: usize,
    ) -> Result<(), PlacementError> {
        let record = self
            .item(item)
            .ok_or(PlacementError::UnknownItem(item))?
            .clone();
        let items = &self.items;
        let inventory = self
            .inventories
            .iter_mut()
            .find(|inventory| inventory.id == inv)
            .ok_or(PlacementError::UnknownInventory(inv))?;
        let capacity = inventory.capacity();
        let max_stack = inventory.slot_max_stack(index, &record);
        let slot = inventory
            .slot_mut(index)
            .ok_or(PlacementError::IndexOutOfRange { index, capacity })?;
        slot.add(&record, items, max_stack)?;
        Ok(())
    }
}
