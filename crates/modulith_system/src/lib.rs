//! The module lifecycle engine of Modulith.
//!
//! `modulith_system` brings independently developed modules up in dependency
//! order and tears them down in reverse:
//!
//! - [`module`] - The [`Module`](module::Module) contract, identities, states and groups
//! - [`registry`] - Module catalog and dependency resolution
//! - [`lifecycle`] - State transitions, startup policies and reports
//! - [`manager`] - The [`ModuleManager`](manager::ModuleManager) façade and hook context
//! - [`error`] - Error taxonomy
//!
//! # Architecture
//!
//! - **`modulith_graph`**: ordering algorithm
//! - **`modulith_system`**: registry, orchestration, lookups (this crate)
//! - **`modulith_core_modules`**: infrastructure modules (tracing, config)
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use modulith_system::prelude::*;
//!
//! struct Database;
//! impl Module for Database {}
//!
//! struct Users;
//! impl Module for Users {
//!     fn dependencies(&self) -> Vec<ModuleId> {
//!         vec![ModuleId::of::<Database>()]
//!     }
//!
//!     fn on_initialize(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
//!         let _db: Arc<Database> = ctx.get_module_or_err::<Database>()?;
//!         Ok(())
//!     }
//! }
//!
//! let mut manager = ModuleManager::new();
//! manager.add_modules(Users)?.add_modules(Database)?;
//! manager.start_all()?;
//!
//! assert_eq!(
//!     manager.load_order().unwrap(),
//!     &[ModuleId::of::<Database>(), ModuleId::of::<Users>()]
//! );
//!
//! let report = manager.stop_all();
//! assert!(report.is_clean());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Error types for registration, resolution, lookups and hooks.
pub mod error;

/// State transitions, startup policies and reports.
pub mod lifecycle;

/// The manager façade and the context handed to module hooks.
pub mod manager;

/// Module trait, identities, lifecycle states and groups.
pub mod module;

/// Module catalog and dependency resolution.
pub mod registry;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::error::*;
    pub use crate::lifecycle::*;
    pub use crate::manager::*;
    pub use crate::module::*;
    pub use crate::registry::*;
}
