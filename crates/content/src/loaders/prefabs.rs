//! Item prefab catalog loader.

use std::path::Path;

use stowage_core::{ItemPrefab, PrefabHandle, PrefabOracle};

use crate::loaders::{LoadResult, read_file};

/// Prefab catalog structure for RON files.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PrefabCatalog {
    pub prefabs: Vec<ItemPrefab>,
}

/// Loader for prefab catalogs from RON files.
pub struct PrefabLoader;

impl PrefabLoader {
    /// Load a prefab catalog from a RON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the RON file containing a PrefabCatalog
    ///
    /// # Returns
    ///
    /// Returns a Vec of ItemPrefabs. Fails when two entries share a handle.
    pub fn load(path: &Path) -> LoadResult<Vec<ItemPrefab>> {
        let content = read_file(path)?;
        let catalog: PrefabCatalog = ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse prefab catalog RON: {}", e))?;

        for (index, prefab) in catalog.prefabs.iter().enumerate() {
            if catalog.prefabs[..index]
                .iter()
                .any(|earlier| earlier.handle == prefab.handle)
            {
                anyhow::bail!("Duplicate prefab handle {:?} in catalog", prefab.handle);
            }
        }
        Ok(catalog.prefabs)
    }
}

/// Prefab oracle backed by a loaded catalog.
pub struct CatalogOracle {
    prefabs: Vec<ItemPrefab>,
}

impl CatalogOracle {
    pub fn new(prefabs: Vec<ItemPrefab>) -> Self {
        Self { prefabs }
    }

    /// Load the backing catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<Self> {
        Ok(Self::new(PrefabLoader::load(path)?))
    }
}

impl PrefabOracle for CatalogOracle {
    fn prefab(&self, handle: PrefabHandle) -> Option<ItemPrefab> {
        self.prefabs
            .iter()
            .find(|prefab| prefab.handle == handle)
            .cloned()
    }

    fn all_prefabs(&self) -> Vec<ItemPrefab> {
        self.prefabs.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use stowage_core::SlotTag;

    const CATALOG: &str = r#"(
        prefabs: [
            (
                handle: 1,
                combinations: ["RIGHT_HAND | LEFT_HAND", "ANY"],
                categories: "WEAPON",
                max_stack: 1,
                allow_drop_on_swap: true,
            ),
            (
                handle: 2,
                combinations: ["ANY"],
                categories: "AMMUNITION",
                max_stack: 12,
                allow_drop_on_swap: false,
            ),
        ],
    )"#;

    fn write_catalog(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_catalog_and_answers_lookups() {
        let file = write_catalog(CATALOG);
        let oracle = CatalogOracle::load(file.path()).unwrap();

        let rifle = oracle.prefab(PrefabHandle(1)).unwrap();
        assert_eq!(rifle.combinations[0], SlotTag::BOTH_HANDS);
        assert!(rifle.allow_drop_on_swap);
        let caps = rifle.caps();
        assert_eq!(caps.max_stack, 1);
        assert!(caps.allows_any());

        assert_eq!(
            oracle.prefab(PrefabHandle(2)).unwrap().max_stack,
            12
        );
        assert!(oracle.prefab(PrefabHandle(9)).is_none());
        assert_eq!(oracle.all_prefabs().len(), 2);
    }

    #[test]
    fn duplicate_handles_are_rejected() {
        let file = write_catalog(
            r#"(
            prefabs: [
                (handle: 1, combinations: ["ANY"], categories: "MISC", max_stack: 1, allow_drop_on_swap: false),
                (handle: 1, combinations: ["ANY"], categories: "MISC", max_stack: 4, allow_drop_on_swap: false),
            ],
        )"#,
        );
        assert!(PrefabLoader::load(file.path()).is_err());
    }
}
