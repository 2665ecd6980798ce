//! Data-driven storage content and loaders.
//!
//! This crate provides loaders that turn RON/TOML data files into the
//! catalogs and layouts the placement engine consumes:
//! - Item prefab catalogs (data-driven via RON)
//! - Character and container inventory layouts (data-driven via RON)
//! - Engine configuration (data-driven via TOML)
//!
//! Content is consumed when constructing items and inventories and never
//! appears in placement state; the engine only reads the capability records
//! cached on each item.
//!
//! All loaders use stowage-core types directly with serde for RON/TOML
//! deserialization.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{
    CatalogOracle, CharacterLayout, ConfigLoader, ContainerLayout, LayoutLoader, PrefabCatalog,
    PrefabLoader,
};
