//! Application information module.
//!
//! Provides [`AppInfoModule`] which exposes build metadata to other modules.
//!
//! # Example
//!
//! ```
//! use modulith_system::manager::ModuleManager;
//! use modulith_core_modules::AppInfoModule;
//!
//! let mut manager = ModuleManager::new();
//! manager.add_modules(AppInfoModule::for_app("my-bot", "2.1.0"))?;
//! manager.start_all()?;
//!
//! let info = manager.get_module_or_err::<AppInfoModule>()?.info().clone();
//! assert_eq!(info.name, "my-bot");
//! assert_eq!(info.version, "2.1.0");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use modulith_system::error::ModuleError;
use modulith_system::manager::ModuleContext;
use modulith_system::module::Module;

/// Application runtime information.
///
/// # Fields
///
/// - `name` - The application name
/// - `version` - The application version
/// - `debug` - Whether the binary was compiled in debug mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    /// Application name.
    pub name: &'static str,
    /// Application version string.
    pub version: &'static str,
    /// Whether running in debug mode.
    pub debug: bool,
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: "modulith",
            version: env!("CARGO_PKG_VERSION"),
            debug: cfg!(debug_assertions),
        }
    }
}

/// Module that provides application metadata.
///
/// A foundational module with no dependencies. Other infrastructure modules,
/// such as [`TracingModule`](crate::TracingModule), depend on it.
#[derive(Debug, Default, Clone)]
pub struct AppInfoModule {
    info: AppInfo,
}

impl AppInfoModule {
    /// Describes the given application instead of the framework itself.
    #[must_use]
    pub fn for_app(name: &'static str, version: &'static str) -> Self {
        Self {
            info: AppInfo {
                name,
                version,
                debug: cfg!(debug_assertions),
            },
        }
    }

    /// The application metadata.
    #[must_use]
    pub fn info(&self) -> &AppInfo {
        &self.info
    }
}

impl Module for AppInfoModule {
    fn on_enable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        tracing::info!(
            app = self.info.name,
            version = self.info.version,
            debug = self.info.debug,
            "application starting"
        );
        Ok(())
    }
}
