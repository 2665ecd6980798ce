//! Content loaders for reading storage data from files.
//!
//! This module provides loaders that convert RON/TOML files into the
//! catalogs, layouts, and configuration used to construct engine state.

pub mod config;
pub mod layout;
pub mod prefabs;

pub use config::ConfigLoader;
pub use layout::{CharacterLayout, ContainerLayout, LayoutLoader};
pub use prefabs::{CatalogOracle, PrefabCatalog, PrefabLoader};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
