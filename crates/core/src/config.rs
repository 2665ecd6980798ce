/// Engine configuration constants and tunable parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StorageConfig {
    /// Number of ticks an inventory stays in the "dirty" debounce window
    /// before its contents are synced to remote peers.
    pub sync_delay_ticks: u32,
}

impl StorageConfig {
    // ===== compile-time constants used as type parameters =====
    /// Global ceiling for items co-stacked in one slot. Per-prefab
    /// `max_stack` values are clamped to this.
    pub const MAX_STACK_SIZE: usize = 32;
    /// Maximum slots a single inventory may declare at construction.
    pub const MAX_INVENTORY_SLOTS: usize = 24;
    /// Maximum live item records tracked by one `StorageState`.
    pub const MAX_ITEMS: usize = 512;
    /// Maximum live inventories tracked by one `StorageState`.
    pub const MAX_INVENTORIES: usize = 128;
    /// Maximum independent slot-tag combinations one item capability may
    /// declare (e.g. {RightHand}, {RightHand|LeftHand}, {Any}).
    pub const MAX_SLOT_COMBINATIONS: usize = 6;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_SYNC_DELAY_TICKS: u32 = 60;

    pub fn new() -> Self {
        Self {
            sync_delay_ticks: Self::DEFAULT_SYNC_DELAY_TICKS,
        }
    }

    pub fn with_sync_delay(sync_delay_ticks: u32) -> Self {
        Self { sync_delay_ticks }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new()
    }
}
