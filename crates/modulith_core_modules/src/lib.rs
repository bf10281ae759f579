//! Core infrastructure modules for Modulith.
//!
//! This crate provides foundational modules that most Modulith applications need:
//!
//! - [`AppInfoModule`] - Application metadata
//! - [`TracingModule`] - Logging and observability via the `tracing` crate
//! - [`ConfigModule`] - Per-module JSON configuration files
//! - [`DefaultModules`] - Convenient bundle of all infrastructure modules
//!
//! # Example
//!
//! ```no_run
//! use modulith_system::manager::ModuleManager;
//! use modulith_system::module::ModuleGroup;
//! use modulith_core_modules::DefaultModules;
//!
//! let mut manager = ModuleManager::new();
//! manager.add_modules(DefaultModules.build())?;
//! manager.start_all()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Individual Module Usage
//!
//! For fine-grained control, add modules individually:
//!
//! ```
//! use modulith_system::manager::ModuleManager;
//! use modulith_core_modules::{AppInfoModule, ConfigModule, TracingModule};
//! use tracing::Level;
//!
//! let mut manager = ModuleManager::new();
//! manager
//!     .add_modules(AppInfoModule::default())?
//!     .add_modules(TracingModule::default().with_level(Level::DEBUG))?
//!     .add_modules(ConfigModule::new(std::env::temp_dir().join("modulith-doc")))?;
//! manager.start_all()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod app_info;
mod config;
mod tracing_module;

// Re-export modules
pub use app_info::{AppInfo, AppInfoModule};
pub use config::{ConfigError, ConfigModule, DEFAULT_CONFIG_DIR};
pub use tracing_module::{TracingConfig, TracingFormat, TracingModule};

use modulith_system::module::{ModuleGroup, ModuleGroupBuilder};

/// Default modules for most Modulith applications.
///
/// Includes:
/// - [`AppInfoModule`] - Application metadata
/// - [`TracingModule`] - Logging and observability
/// - [`ConfigModule`] - Configuration files under [`DEFAULT_CONFIG_DIR`]
///
/// # Customization
///
/// Use the builder pattern to customize:
///
/// ```ignore
/// manager.add_modules(
///     DefaultModules
///         .build()
///         .disable::<ConfigModule>()
///         .add(ConfigModule::new("/etc/my-bot")),
/// )?;
/// ```
pub struct DefaultModules;

impl ModuleGroup for DefaultModules {
    fn build(self) -> ModuleGroupBuilder {
        ModuleGroupBuilder::new()
            .add(AppInfoModule::default())
            .add(TracingModule::default())
            .add(ConfigModule::default())
    }
}

/// Minimal modules for headless or testing scenarios.
///
/// Includes only:
/// - [`AppInfoModule`] - Application metadata
///
/// Does not install a subscriber nor touch the file system, making it
/// suitable for unit tests.
pub struct MinimalModules;

impl ModuleGroup for MinimalModules {
    fn build(self) -> ModuleGroupBuilder {
        ModuleGroupBuilder::new().add(AppInfoModule::default())
    }
}
