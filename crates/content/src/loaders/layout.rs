//! Inventory layout loaders.
//!
//! Layouts describe the slot structure of an inventory (tags for character
//! inventories, acceptance rules for containers); the engine fixes the
//! structure at construction time, so layouts are validated against the
//! engine's slot ceiling here.

use std::path::Path;

use stowage_core::{CharacterSpec, ContainerSlotRule, ContainerSpec, SlotTag, StorageConfig};

use crate::loaders::{LoadResult, read_file};

/// Character inventory layout structure for RON files.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CharacterLayout {
    /// One type tag per slot index.
    pub slots: Vec<SlotTag>,
    /// Limb slots this character physically lacks.
    #[serde(default)]
    pub missing_limbs: Option<SlotTag>,
}

impl CharacterLayout {
    pub fn spec(&self) -> CharacterSpec {
        let spec = CharacterSpec::new(&self.slots);
        match self.missing_limbs {
            Some(missing) => spec.with_missing_limbs(missing),
            None => spec,
        }
    }
}

/// Container inventory layout structure for RON files.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ContainerLayout {
    /// One acceptance rule per slot index.
    pub slots: Vec<ContainerSlotRule>,
}

impl ContainerLayout {
    pub fn spec(&self) -> ContainerSpec {
        ContainerSpec::new(&self.slots)
    }
}

/// Loader for inventory layouts from RON files.
pub struct LayoutLoader;

impl LayoutLoader {
    /// Load a character inventory layout from a RON file.
    pub fn load_character(path: &Path) -> LoadResult<CharacterSpec> {
        let content = read_file(path)?;
        let layout: CharacterLayout = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse character layout RON: {}", e))?;
        Self::check_capacity(layout.slots.len())?;
        Ok(layout.spec())
    }

    /// Load a container inventory layout from a RON file.
    pub fn load_container(path: &Path) -> LoadResult<ContainerSpec> {
        let content = read_file(path)?;
        let layout: ContainerLayout = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse container layout RON: {}", e))?;
        Self::check_capacity(layout.slots.len())?;
        Ok(layout.spec())
    }

    fn check_capacity(slots: usize) -> LoadResult<()> {
        anyhow::ensure!(
            slots <= StorageConfig::MAX_INVENTORY_SLOTS,
            "Layout declares {} slots, engine maximum is {}",
            slots,
            StorageConfig::MAX_INVENTORY_SLOTS
        );
        Ok(())
    }
}
