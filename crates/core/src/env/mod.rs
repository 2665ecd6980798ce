//! Contracts with external collaborators.
//!
//! The engine does authoritative slot bookkeeping only; physics bodies,
//! equip effects, AI notifications, replication, and the item combine
//! interaction live outside and are reached through the narrow traits here.
//! [`Env`] bundles them so operations can access everything they need
//! without hard coupling to concrete implementations; every hook is optional
//! so tests and headless peers can run against [`Env::empty`].

mod prefabs;

pub use prefabs::{ItemPrefab, PrefabOracle};

use crate::state::{EntityId, InventoryId, ItemId};

/// Physics collaborator: items inside an inventory have their independent
/// body representation disabled.
pub trait PhysicsHook: Send + Sync {
    fn set_body_enabled(&self, item: ItemId, enabled: bool);
}

/// Equip/unequip side effects, fired exactly once per transition into or out
/// of a dedicated character slot.
pub trait EquipHook: Send + Sync {
    fn on_equip(&self, item: ItemId, character: EntityId);
    fn on_unequip(&self, item: ItemId, character: EntityId);
}

/// AI/telemetry notifications.
pub trait TelemetryHook: Send + Sync {
    /// Fired on genuine ownership transfer only, never on re-stacking within
    /// the same owner.
    fn on_item_taken(&self, item: ItemId, user: Option<EntityId>);

    /// User-facing rejection signal for an explicit-index placement that
    /// could not be satisfied.
    fn on_rejected(&self, inventory: InventoryId, index: usize);
}

/// Replication collaborator: flags "this inventory's contents changed since
/// the last sync". Debounced by the engine; the hook never serializes.
pub trait SyncHook: Send + Sync {
    fn mark_dirty(&self, inventory: InventoryId);
}

/// Result of the domain combine interaction between an occupant and an
/// incoming item (e.g. loading a magazine into a gun).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CombineOutcome {
    /// The pair does not combine; placement continues normally.
    NotApplicable,
    /// The items combined. When `consumed_existing` is set, the occupant was
    /// used up and the engine retries placement into the freed slot;
    /// otherwise the incoming item was absorbed and the operation is done.
    Combined { consumed_existing: bool },
}

/// Domain combine interaction, consulted by explicit-index placement before
/// any swap is attempted.
pub trait CombineHook: Send + Sync {
    fn combine(&self, existing: ItemId, incoming: ItemId, user: Option<EntityId>)
    -> CombineOutcome;
}

/// Aggregates the collaborator hooks required by placement operations.
#[derive(Clone, Copy, Default)]
pub struct Env<'a> {
    physics: Option<&'a dyn PhysicsHook>,
    equip: Option<&'a dyn EquipHook>,
    telemetry: Option<&'a dyn TelemetryHook>,
    sync: Option<&'a dyn SyncHook>,
    combine: Option<&'a dyn CombineHook>,
}

impl<'a> Env<'a> {
    /// No collaborators at all; every side effect becomes a no-op.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_physics(mut self, physics: &'a dyn PhysicsHook) -> Self {
        self.physics = Some(physics);
        self
    }

    pub fn with_equip(mut self, equip: &'a dyn EquipHook) -> Self {
        self.equip = Some(equip);
        self
    }

    pub fn with_telemetry(mut self, telemetry: &'a dyn TelemetryHook) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn with_sync(mut self, sync: &'a dyn SyncHook) -> Self {
        self.sync = Some(sync);
        self
    }

    pub fn with_combine(mut self, combine: &'a dyn CombineHook) -> Self {
        self.combine = Some(combine);
        self
    }

    /// Copy with the transition hooks (equip, telemetry) removed.
    ///
    /// Compound operations (swaps, evictions) move items through
    /// intermediate states; they run the intermediate steps against a
    /// silenced env and fire the net transitions once at the end, so
    /// observers never see a transition that the operation as a whole did
    /// not make.
    pub fn silenced(&self) -> Self {
        Self {
            equip: None,
            telemetry: None,
            ..*self
        }
    }

    pub fn physics(&self) -> Option<&'a dyn PhysicsHook> {
        self.physics
    }

    pub fn equip(&self) -> Option<&'a dyn EquipHook> {
        self.equip
    }

    pub fn telemetry(&self) -> Option<&'a dyn TelemetryHook> {
        self.telemetry
    }

    pub fn sync(&self) -> Option<&'a dyn SyncHook> {
        self.sync
    }

    pub fn combine(&self) -> Option<&'a dyn CombineHook> {
        self.combine
    }
}

impl core::fmt::Debug for Env<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Env")
            .field("physics", &self.physics.is_some())
            .field("equip", &self.equip.is_some())
            .field("telemetry", &self.telemetry.is_some())
            .field("sync", &self.sync.is_some())
            .field("combine", &self.combine.is_some())
            .finish()
    }
}
