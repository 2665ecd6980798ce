//! Slot tags and container acceptance categories.
//!
//! A `SlotTag` value is a set of flags: a slot index carries exactly one
//! flag (or `ANY`), while an item capability declares *combinations* of
//! flags that are jointly required (e.g. `RIGHT_HAND | LEFT_HAND` for a
//! two-handed weapon).

use bitflags::bitflags;

bitflags! {
    /// Per-slot type tag of a character inventory, and the building block of
    /// item capability combinations.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SlotTag: u16 {
        /// Generic stack-friendly storage; accepts any item declaring ANY.
        const ANY        = 1 << 0;
        const RIGHT_HAND = 1 << 1;
        const LEFT_HAND  = 1 << 2;
        const HEAD       = 1 << 3;
        const TORSO      = 1 << 4;
        const LEGS       = 1 << 5;
        const WAIST      = 1 << 6;
        const CARD       = 1 << 7;
        const HEADSET    = 1 << 8;
        const BAG        = 1 << 9;
    }
}

impl SlotTag {
    /// The paired combination requiring both hand slots simultaneously.
    pub const BOTH_HANDS: Self = Self::RIGHT_HAND.union(Self::LEFT_HAND);

    /// True for exclusive single-item-identity slot tags (everything except
    /// `ANY`). Dedicated slots never stack.
    pub fn is_dedicated(self) -> bool {
        !self.contains(Self::ANY) && !self.is_empty()
    }

    /// True if this combination names both hand slots, which requires the
    /// item to occupy both simultaneously rather than either one.
    pub fn is_both_hands(self) -> bool {
        self.contains(Self::BOTH_HANDS)
    }
}

bitflags! {
    /// Coarse item classification consumed by container per-slot acceptance
    /// filters (e.g. a reactor accepting only FUEL in slot 0).
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ItemCategory: u16 {
        const EQUIPMENT  = 1 << 0;
        const WEAPON     = 1 << 1;
        const AMMUNITION = 1 << 2;
        const FUEL       = 1 << 3;
        const MEDICAL    = 1 << 4;
        const MATERIAL   = 1 << 5;
        const TOOL       = 1 << 6;
        const MISC       = 1 << 7;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedicated_excludes_any() {
        assert!(SlotTag::RIGHT_HAND.is_dedicated());
        assert!(SlotTag::BOTH_HANDS.is_dedicated());
        assert!(!SlotTag::ANY.is_dedicated());
        assert!(!SlotTag::empty().is_dedicated());
    }

    #[test]
    fn both_hands_detection() {
        assert!(SlotTag::BOTH_HANDS.is_both_hands());
        assert!(!SlotTag::RIGHT_HAND.is_both_hands());
        assert!((SlotTag::BOTH_HANDS | SlotTag::HEAD).is_both_hands());
    }
}
