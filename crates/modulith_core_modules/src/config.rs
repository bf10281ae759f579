//! Per-module JSON configuration files.
//!
//! Provides [`ConfigModule`], which stores one JSON file per module and
//! config type:
//!
//! ```text
//! <base>/<module name>/<config type>.json
//! ```
//!
//! The module name is the owner's [`Module::name`] without its path,
//! lowercased, with spaces replaced by underscores. The config type is the
//! type's name without its path, lowercased. `UsersModule` storing a
//! `CacheSettings` ends up in `configs/usersmodule/cachesettings.json`.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Serialize, Deserialize)]
//! struct BotListConfig {
//!     token: String,
//!     interval_minutes: u64,
//! }
//!
//! impl Module for BotListModule {
//!     fn dependencies(&self) -> Vec<ModuleId> {
//!         vec![ModuleId::of::<ConfigModule>()]
//!     }
//!
//!     fn on_initialize(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
//!         let configs = ctx.get_module_or_err::<ConfigModule>()?;
//!         let config = configs
//!             .register_and_get_config(self, BotListConfig::default())
//!             .map_err(ModuleError::other)?;
//!         *self.config.lock() = Some(config);
//!         Ok(())
//!     }
//! }
//! ```

use modulith_system::error::ModuleError;
use modulith_system::manager::ModuleContext;
use modulith_system::module::{Module, short_type_name};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default directory for configuration files.
pub const DEFAULT_CONFIG_DIR: &str = "./configs";

/// Errors from reading or writing configuration files.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file or its directory could not be accessed.
    #[error("failed to access config file {}: {source}", .path.display())]
    Io {
        /// The path that was accessed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file does not hold valid JSON for the config type.
    #[error("invalid config file {}: {source}", .path.display())]
    Serialization {
        /// The path that was parsed or written.
        path: PathBuf,
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },
}

impl ConfigError {
    fn io(path: &Path) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn serialization(path: &Path) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| Self::Serialization {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Module that persists per-module configuration as pretty-printed JSON.
///
/// # Dependencies
///
/// None. Modules that read configuration declare a dependency on this one.
#[derive(Debug)]
pub struct ConfigModule {
    base_dir: PathBuf,
    /// Serializes writes so concurrent saves of one file do not interleave.
    write_lock: Mutex<()>,
}

impl Default for ConfigModule {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_DIR)
    }
}

impl ConfigModule {
    /// Stores configuration files under `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// The directory holding every module's configuration.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The directory holding `owner`'s configuration files.
    #[must_use]
    pub fn module_dir(&self, owner: &dyn Module) -> PathBuf {
        self.base_dir.join(module_dir_name(owner.name()))
    }

    /// The file storing `owner`'s configuration of type `C`.
    #[must_use]
    pub fn config_path<C>(&self, owner: &dyn Module) -> PathBuf {
        let file = format!(
            "{}.json",
            short_type_name(core::any::type_name::<C>()).to_lowercase()
        );
        self.module_dir(owner).join(file)
    }

    /// Writes `default` if `owner` has no configuration of type `C` yet.
    ///
    /// An existing file is laid over `default` and written back: fields the
    /// file lacks take their default value, unknown fields are dropped and the
    /// formatting is normalised.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, parsed or written.
    pub fn register_config<C>(&self, owner: &dyn Module, default: &C) -> Result<(), ConfigError>
    where
        C: Serialize + DeserializeOwned,
    {
        let path = self.config_path::<C>(owner);

        if path.exists() {
            let contents = fs::read_to_string(&path).map_err(ConfigError::io(&path))?;
            let stored: Value =
                serde_json::from_str(&contents).map_err(ConfigError::serialization(&path))?;
            let mut merged =
                serde_json::to_value(default).map_err(ConfigError::serialization(&path))?;
            overlay(&mut merged, stored);

            let current: C =
                serde_json::from_value(merged).map_err(ConfigError::serialization(&path))?;
            self.save_config(owner, &current)
        } else {
            self.save_config(owner, default)?;
            tracing::info!(
                module = owner.name(),
                path = %path.display(),
                "created config file"
            );
            Ok(())
        }
    }

    /// Reads `owner`'s configuration of type `C`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or does not parse as `C`.
    pub fn get_config<C>(&self, owner: &dyn Module) -> Result<C, ConfigError>
    where
        C: DeserializeOwned,
    {
        let path = self.config_path::<C>(owner);
        let contents = fs::read_to_string(&path).map_err(ConfigError::io(&path))?;
        let config = serde_json::from_str(&contents).map_err(ConfigError::serialization(&path))?;

        tracing::debug!(module = owner.name(), path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Writes `config` as `owner`'s configuration of type `C`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the directory or file cannot be written.
    pub fn save_config<C>(&self, owner: &dyn Module, config: &C) -> Result<(), ConfigError>
    where
        C: Serialize,
    {
        let dir = self.module_dir(owner);
        let path = self.config_path::<C>(owner);
        let json =
            serde_json::to_string_pretty(config).map_err(ConfigError::serialization(&path))?;

        let _guard = self.write_lock.lock();
        fs::create_dir_all(&dir).map_err(ConfigError::io(&dir))?;
        fs::write(&path, json).map_err(ConfigError::io(&path))
    }

    /// Registers `default` and returns the stored configuration.
    ///
    /// # Errors
    ///
    /// See [`register_config`](Self::register_config).
    pub fn register_and_get_config<C>(
        &self,
        owner: &dyn Module,
        default: C,
    ) -> Result<C, ConfigError>
    where
        C: Serialize + DeserializeOwned,
    {
        self.register_config(owner, &default)?;
        self.get_config(owner)
    }
}

impl Module for ConfigModule {
    fn on_initialize(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        fs::create_dir_all(&self.base_dir)
            .map_err(ConfigError::io(&self.base_dir))
            .map_err(ModuleError::other)?;

        tracing::debug!(base_dir = %self.base_dir.display(), "config directory ready");
        Ok(())
    }
}

/// Replaces the fields of `base` with those of `stored`, recursing into
/// nested objects.
fn overlay(base: &mut Value, stored: Value) {
    match (base, stored) {
        (Value::Object(fields), Value::Object(stored)) => {
            for (key, value) in stored {
                match fields.get_mut(&key) {
                    Some(field) => overlay(field, value),
                    None => {
                        fields.insert(key, value);
                    }
                }
            }
        }
        (base, stored) => *base = stored,
    }
}

fn module_dir_name(name: &str) -> String {
    short_type_name(name).replace(' ', "_").to_lowercase()
}
