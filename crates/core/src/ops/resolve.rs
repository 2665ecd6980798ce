//! Typed slot resolution for character inventories.
//!
//! Given an item and its allowed tag-combinations in priority order, decide
//! where it lands: keep a compatible placement as-is, prefer generic slots
//! when both sides allow them, or claim dedicated slots — relocating current
//! occupants to their own generic slots, one eviction level deep, with
//! explicit undo when a combination cannot be completed.

use arrayvec::ArrayVec;

use crate::config::StorageConfig;
use crate::env::Env;
use crate::ops::PlacementError;
use crate::state::{EntityId, InventoryId, InventoryKind, ItemId, Owner, SlotTag, StorageState};

type SlotIndices = ArrayVec<usize, { StorageConfig::MAX_INVENTORY_SLOTS }>;

impl StorageState {
    /// Places the item according to its allowed tag-combinations.
    ///
    /// Combinations are tried in caller-supplied order and short-circuit.
    /// On failure the inventory holds exactly what it held before the call.
    #[allow(clippy::too_many_arguments)]
    pub fn resolve_slots(
        &mut self,
        inv: InventoryId,
        item: ItemId,
        requested: &[SlotTag],
        user: Option<EntityId>,
        create_sync_event: bool,
        ignore_condition: bool,
        env: &Env<'_>,
    ) -> Result<(), PlacementError> {
        let record = self.item(item).ok_or(PlacementError::UnknownItem(item))?;
        if record.removed {
            return Err(PlacementError::Rejected);
        }
        let caps = record.caps.clone();
        let inventory = self
            .inventory(inv)
            .ok_or(PlacementError::UnknownInventory(inv))?;
        let InventoryKind::Character(spec) = &inventory.kind else {
            // Tag-combinations only mean something on character inventories.
            return match self.find_allowed_slot(inv, item, ignore_condition) {
                Some(index) => self.put(inv, item, index, user, true, create_sync_event, env),
                None => Err(PlacementError::Rejected),
            };
        };
        let missing_limbs = spec.missing_limbs;

        // Every slot the item already occupies that is compatible with some
        // requested combination means there is nothing to do. The paired
        // hands combination counts as compatible only when the item occupies
        // both hand slots.
        let occupied = inventory.find_indices(item);
        let mut in_wrong_slot = false;
        if !occupied.is_empty() {
            let all_compatible = occupied.iter().all(|&index| {
                let tag = inventory.slot_tag(index);
                requested.iter().any(|&combo| {
                    if !tag.intersects(combo) {
                        return false;
                    }
                    if combo.is_both_hands() {
                        let holds = |limb: SlotTag| {
                            occupied
                                .iter()
                                .any(|&i| inventory.slot_tag(i).intersects(limb))
                        };
                        holds(SlotTag::RIGHT_HAND) && holds(SlotTag::LEFT_HAND)
                    } else {
                        true
                    }
                })
            });
            if all_compatible {
                return Ok(());
            }
            in_wrong_slot = true;
        }

        // Generic fast path.
        if requested.contains(&SlotTag::ANY)
            && caps.allows_any()
            && let Some(index) = self.find_generic_slot(inv, item, ignore_condition, in_wrong_slot)
        {
            return self.put(inv, item, index, user, true, create_sync_event, env);
        }

        // Dedicated path: claim every slot index the combination covers.
        for &combo in requested {
            if combo == SlotTag::ANY || combo.is_empty() {
                continue;
            }
            if combo.intersects(missing_limbs) {
                continue;
            }
            if self.try_claim_combination(
                inv,
                item,
                combo,
                user,
                create_sync_event,
                env,
            )? {
                return Ok(());
            }
        }
        Err(PlacementError::Rejected)
    }

    /// Generic-slot candidate search, in priority order: top up a compatible
    /// stack, reuse a slot already holding the item, take an empty slot
    /// (visible before hidden), or — for items dislodged from an
    /// incompatible dedicated slot — any generic slot not holding a
    /// different item.
    fn find_generic_slot(
        &self,
        inv: InventoryId,
        item: ItemId,
        ignore_condition: bool,
        dislodged: bool,
    ) -> Option<usize> {
        let inventory = self.inventory(inv)?;
        let generic: SlotIndices = (0..inventory.capacity())
            .filter(|&index| inventory.slot_tag(index) == SlotTag::ANY)
            .collect();

        for &index in &generic {
            let slot = inventory.slot(index)?;
            if !slot.is_empty()
                && !slot.contains(item)
                && self.can_be_put_in_slot(inv, item, index, ignore_condition)
            {
                return Some(index);
            }
        }
        for &index in &generic {
            if inventory.slot(index)?.contains(item) {
                return Some(index);
            }
        }
        for hidden in [false, true] {
            for &index in &generic {
                let slot = inventory.slot(index)?;
                if slot.is_empty()
                    && slot.hide_if_empty == hidden
                    && self.can_be_put_in_slot(inv, item, index, ignore_condition)
                {
                    return Some(index);
                }
            }
        }
        if dislodged {
            for &index in &generic {
                let slot = inventory.slot(index)?;
                if slot.is_empty() || slot.contains(item) {
                    return Some(index);
                }
            }
        }
        None
    }

    /// Attempts one tag-combination: relocate occupants of every covered
    /// slot to their own generic slots (one eviction level, never deeper),
    /// then place the item into all covered indices. Returns Ok(false) and
    /// restores any relocated occupant when the combination cannot be
    /// completed.
    fn try_claim_combination(
        &mut self,
        inv: InventoryId,
        item: ItemId,
        combo: SlotTag,
        user: Option<EntityId>,
        create_sync_event: bool,
        env: &Env<'_>,
    ) -> Result<bool, PlacementError> {
        let caps = self
            .item(item)
            .ok_or(PlacementError::UnknownItem(item))?
            .caps
            .clone();
        let inventory = self
            .inventory(inv)
            .ok_or(PlacementError::UnknownInventory(inv))?;
        let owner = inventory.owner;

        let targets: SlotIndices = (0..inventory.capacity())
            .filter(|&index| {
                let tag = inventory.slot_tag(index);
                tag.is_dedicated() && tag.intersects(combo) && caps.intersects(tag)
            })
            .collect();
        if targets.is_empty() {
            return Ok(false);
        }
        // The paired hands combination needs both named slots to exist.
        if combo.is_both_hands()
            && !(targets.iter().any(|&i| inventory.slot_tag(i).intersects(SlotTag::RIGHT_HAND))
                && targets.iter().any(|&i| inventory.slot_tag(i).intersects(SlotTag::LEFT_HAND)))
        {
            return Ok(false);
        }

        let mut evictees: ArrayVec<ItemId, { StorageConfig::MAX_INVENTORY_SLOTS }> =
            ArrayVec::new();
        for &index in &targets {
            for &occupant in inventory.items_at(index) {
                if occupant != item && !evictees.contains(&occupant) {
                    evictees.push(occupant);
                }
            }
        }

        // Intermediate moves run silenced; net transitions fire once below.
        let muted = env.silenced();
        let mut relocated: Vec<(ItemId, SlotIndices)> = Vec::new();
        let mut failed = false;
        for &evictee in &evictees {
            let origin = self
                .inventory(inv)
                .map(|inventory| inventory.find_indices(evictee))
                .unwrap_or_default();
            if self
                .resolve_slots(inv, evictee, &[SlotTag::ANY], user, create_sync_event, false, &muted)
                .is_ok()
            {
                relocated.push((evictee, origin));
            } else {
                failed = true;
                break;
            }
        }

        let all_clear = !failed
            && self.inventory(inv).is_some_and(|inventory| {
                targets.iter().all(|&index| {
                    inventory
                        .slot(index)
                        .is_some_and(|slot| slot.is_empty() || slot.contains(item))
                })
            });
        if !all_clear {
            // Undo every relocation, restoring the exact slot indices.
            for (evictee, origin) in relocated.into_iter().rev() {
                if let Some((&first, rest)) = origin.split_first() {
                    let _ = self.put(inv, evictee, first, user, true, create_sync_event, &muted);
                    for &extra in rest {
                        let _ = self.force_add(inv, evictee, extra);
                    }
                }
            }
            return Ok(false);
        }

        self.put(inv, item, targets[0], user, true, create_sync_event, env)?;
        for &extra in &targets[1..] {
            self.force_add(inv, item, extra)?;
        }
        if let (Owner::Character(character), Some(equip)) = (owner, env.equip()) {
            for (evictee, _) in &relocated {
                equip.on_unequip(*evictee, character);
            }
        }
        Ok(true)
    }
}
