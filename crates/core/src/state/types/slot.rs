//! A single storage position holding one stack of identical items.
//!
//! Slots know nothing about inventories: the stacking-compatibility test and
//! the ordered stack are the whole surface. Slots reference items by id; the
//! records live in the state's item table.

use arrayvec::ArrayVec;

use super::item::ItemRecord;
use super::{ItemId, StackKey};
use crate::config::StorageConfig;
use crate::error::{ErrorSeverity, StorageError};
use crate::state::ItemTable;

/// Errors signalled by direct stack mutation.
///
/// These are programming errors: callers are expected to check `can_accept`
/// first, so a violation indicates a bug rather than an expected gameplay
/// failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StackError {
    /// Tried to stack an item with a mismatched stack identity.
    #[error("tried to stack {item} onto an incompatible stack")]
    MismatchedStack { item: ItemId },

    /// Tried to add to a stack already at its ceiling.
    #[error("tried to add {item} to a full stack")]
    StackFull { item: ItemId },
}

impl StorageError for StackError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MismatchedStack { .. } => "SLOT_MISMATCHED_STACK",
            Self::StackFull { .. } => "SLOT_STACK_FULL",
        }
    }
}

/// Ordered stack of co-stacked item references (insertion order = stack
/// order), bounded by the global stack ceiling.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemSlot {
    items: ArrayVec<ItemId, { StorageConfig::MAX_STACK_SIZE }>,
    /// Presentation hint: the slot is not shown while empty. Also makes the
    /// slot a lower-priority candidate when several generic slots are free.
    pub hide_if_empty: bool,
}

impl ItemSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hidden_if_empty() -> Self {
        Self {
            items: ArrayVec::new(),
            hide_if_empty: true,
        }
    }

    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn first(&self) -> Option<ItemId> {
        self.items.first().copied()
    }

    pub fn last(&self) -> Option<ItemId> {
        self.items.last().copied()
    }

    pub fn contains(&self, item: ItemId) -> bool {
        self.items.contains(&item)
    }

    /// Stacking-compatibility test: true if the slot is empty, or the item
    /// shares the occupants' stack identity and condition bucket (unless
    /// `ignore_condition`) and one more fits under `max_stack`.
    pub fn can_accept(
        &self,
        record: &ItemRecord,
        items: &ItemTable,
        max_stack: u8,
        ignore_condition: bool,
    ) -> bool {
        if self.items.is_empty() {
            return true;
        }
        if self.items.len() + 1 > max_stack as usize {
            return false;
        }
        self.items.iter().all(|occupant| {
            items
                .record(*occupant)
                .is_some_and(|occupant| record.stackable_with(occupant, ignore_condition))
        })
    }

    /// How many more instances with this stack identity fit in the slot.
    pub fn how_many_fit(&self, key: StackKey, items: &ItemTable, max_stack: u8) -> usize {
        let max_stack = max_stack as usize;
        if self.items.is_empty() {
            return max_stack;
        }
        let matches = self.items.iter().all(|occupant| {
            items
                .record(*occupant)
                .is_some_and(|occupant| occupant.stack_key() == key)
        });
        if !matches {
            return 0;
        }
        max_stack.saturating_sub(self.items.len())
    }

    /// Appends the item to the stack. No-op if already present (idempotent).
    ///
    /// The stack identity must have been validated with `can_accept`;
    /// violations are reported as [`StackError`], and the slot is left
    /// unchanged.
    pub fn add(
        &mut self,
        record: &ItemRecord,
        items: &ItemTable,
        max_stack: u8,
    ) -> Result<(), StackError> {
        if self.items.contains(&record.id) {
            return Ok(());
        }
        if let Some(first) = self.first() {
            let occupant = items.record(first);
            if !occupant.is_some_and(|occupant| occupant.stack_key() == record.stack_key()) {
                return Err(StackError::MismatchedStack { item: record.id });
            }
            if self.items.len() + 1 > max_stack as usize {
                return Err(StackError::StackFull { item: record.id });
            }
        }
        // Capacity is bounded by MAX_STACK_SIZE, which max_stack is clamped to.
        self.items.push(record.id);
        Ok(())
    }

    /// Removes and returns the head of the stack (FIFO).
    pub fn remove_one(&mut self) -> Option<ItemId> {
        if self.items.is_empty() {
            return None;
        }
        Some(self.items.remove(0))
    }

    /// Removes a specific instance from the stack, if present.
    pub fn remove(&mut self, item: ItemId) {
        if let Some(pos) = self.items.iter().position(|occupant| *occupant == item) {
            self.items.remove(pos);
        }
    }

    /// Removes all items from the stack.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StorageState;
    use crate::state::types::item::{ConditionBucket, ItemCaps};
    use crate::state::types::tags::{ItemCategory, SlotTag};
    use crate::state::types::{PrefabHandle, Quality};

    const BULLET: PrefabHandle = PrefabHandle(1);
    const GRENADE: PrefabHandle = PrefabHandle(2);

    fn stackable_caps(max_stack: u8) -> ItemCaps {
        ItemCaps::new(&[SlotTag::ANY], ItemCategory::AMMUNITION, max_stack)
    }

    fn spawn(
        state: &mut StorageState,
        prefab: PrefabHandle,
        condition: ConditionBucket,
        max_stack: u8,
    ) -> ItemId {
        state
            .add_item(prefab, Quality(0), stackable_caps(max_stack))
            .map(|id| {
                state.item_mut(id).unwrap().condition = condition;
                id
            })
            .unwrap()
    }

    #[test]
    fn stacking_example_bullets_and_grenades() {
        // Slot with max_stack 5 holding 3 full-condition bullets.
        let mut state = StorageState::new();
        let mut slot = ItemSlot::new();
        for _ in 0..3 {
            let id = spawn(&mut state, BULLET, ConditionBucket::Full, 5);
            let record = state.item(id).unwrap().clone();
            slot.add(&record, state.items(), 5).unwrap();
        }
        assert_eq!(slot.len(), 3);

        // A 4th full-condition bullet fits.
        let fourth = spawn(&mut state, BULLET, ConditionBucket::Full, 5);
        let record = state.item(fourth).unwrap().clone();
        assert!(slot.can_accept(&record, state.items(), 5, false));
        slot.add(&record, state.items(), 5).unwrap();
        assert_eq!(slot.len(), 4);

        // A 50%-condition bullet does not.
        let worn = spawn(&mut state, BULLET, ConditionBucket::Partial, 5);
        let record = state.item(worn).unwrap().clone();
        assert!(!slot.can_accept(&record, state.items(), 5, false));

        // Neither does a full-condition grenade.
        let grenade = spawn(&mut state, GRENADE, ConditionBucket::Full, 5);
        let record = state.item(grenade).unwrap().clone();
        assert!(!slot.can_accept(&record, state.items(), 5, false));
        assert_eq!(
            slot.add(&record, state.items(), 5),
            Err(StackError::MismatchedStack { item: grenade })
        );
        assert_eq!(slot.len(), 4);
    }

    #[test]
    fn add_is_idempotent() {
        let mut state = StorageState::new();
        let mut slot = ItemSlot::new();
        let id = spawn(&mut state, BULLET, ConditionBucket::Full, 5);
        let record = state.item(id).unwrap().clone();
        slot.add(&record, state.items(), 5).unwrap();
        slot.add(&record, state.items(), 5).unwrap();
        assert_eq!(slot.len(), 1);
    }

    #[test]
    fn full_stack_rejects_more() {
        let mut state = StorageState::new();
        let mut slot = ItemSlot::new();
        for _ in 0..2 {
            let id = spawn(&mut state, BULLET, ConditionBucket::Full, 2);
            let record = state.item(id).unwrap().clone();
            slot.add(&record, state.items(), 2).unwrap();
        }
        let overflow = spawn(&mut state, BULLET, ConditionBucket::Full, 2);
        let record = state.item(overflow).unwrap().clone();
        assert!(!slot.can_accept(&record, state.items(), 2, false));
        assert_eq!(
            slot.add(&record, state.items(), 2),
            Err(StackError::StackFull { item: overflow })
        );
    }

    #[test]
    fn remove_one_is_fifo() {
        let mut state = StorageState::new();
        let mut slot = ItemSlot::new();
        let first = spawn(&mut state, BULLET, ConditionBucket::Full, 5);
        let second = spawn(&mut state, BULLET, ConditionBucket::Full, 5);
        for id in [first, second] {
            let record = state.item(id).unwrap().clone();
            slot.add(&record, state.items(), 5).unwrap();
        }
        assert_eq!(slot.first(), Some(first));
        assert_eq!(slot.last(), Some(second));
        assert_eq!(slot.remove_one(), Some(first));
        assert_eq!(slot.remove_one(), Some(second));
        assert_eq!(slot.remove_one(), None);
        assert_eq!(slot.last(), None);
    }

    #[test]
    fn how_many_fit_counts_remaining_room() {
        let mut state = StorageState::new();
        let mut slot = ItemSlot::new();
        let id = spawn(&mut state, BULLET, ConditionBucket::Full, 5);
        let record = state.item(id).unwrap().clone();
        let key = record.stack_key();
        assert_eq!(slot.how_many_fit(key, state.items(), 5), 5);
        slot.add(&record, state.items(), 5).unwrap();
        assert_eq!(slot.how_many_fit(key, state.items(), 5), 4);

        let grenade = spawn(&mut state, GRENADE, ConditionBucket::Full, 5);
        let other_key = state.item(grenade).unwrap().stack_key();
        assert_eq!(slot.how_many_fit(other_key, state.items(), 5), 0);
    }
}
