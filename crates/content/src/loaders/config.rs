//! Engine configuration loader.

use std::path::Path;

use stowage_core::StorageConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing a StorageConfig
    ///
    /// # Returns
    ///
    /// Returns a StorageConfig.
    pub fn load(path: &Path) -> LoadResult<StorageConfig> {
        let content = read_file(path)?;
        let config: StorageConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_config_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"sync_delay_ticks = 30\n").unwrap();
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.sync_delay_ticks, 30);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(ConfigLoader::load(Path::new("/nonexistent/config.toml")).is_err());
    }
}
