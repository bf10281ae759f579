//! The module contract and module groups.
//!
//! Modules are the unit of composition in Modulith. Every piece of
//! application functionality, from database access to chat commands, is a
//! value implementing [`Module`] that declares what it needs and reacts to
//! lifecycle hooks.
//!
//! # Example
//!
//! ```
//! use modulith_system::manager::{ModuleContext, ModuleManager};
//! use modulith_system::module::{Module, ModuleId};
//! use modulith_system::error::ModuleError;
//!
//! struct ConfigModule;
//! impl Module for ConfigModule {}
//!
//! struct BotListModule {
//!     interval_minutes: u64,
//! }
//!
//! impl Module for BotListModule {
//!     fn dependencies(&self) -> Vec<ModuleId> {
//!         vec![ModuleId::of::<ConfigModule>()]
//!     }
//!
//!     fn on_enable(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
//!         let _config = ctx.get_module_or_err::<ConfigModule>()?;
//!         Ok(())
//!     }
//! }
//!
//! let mut manager = ModuleManager::new();
//! manager
//!     .add_modules(ConfigModule)?
//!     .add_modules(BotListModule { interval_minutes: 30 })?;
//! manager.start_all()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod state;

pub use state::ModuleState;

use crate::error::{ModuleError, RegistryError};
use crate::manager::{ModuleContext, ModuleManager};
use core::any::TypeId;
use core::fmt;
use downcast_rs::{DowncastSync, impl_downcast};
use std::sync::Arc;

// ─────────────────────────────────────────────────────────────────────────────
// ModuleId
// ─────────────────────────────────────────────────────────────────────────────

/// Unique identifier for a module type.
///
/// Used for dependency declarations, duplicate detection and lookups. Based on
/// [`TypeId`], so each module type has exactly one `ModuleId`.
///
/// # Example
///
/// ```ignore
/// fn dependencies(&self) -> Vec<ModuleId> {
///     vec![
///         ModuleId::of::<DatabaseModule>(),
///         ModuleId::of::<PermissionsModule>(),
///     ]
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ModuleId {
    /// Creates a `ModuleId` for the given module type.
    #[must_use]
    pub fn of<M: Module>() -> Self {
        Self {
            type_id: TypeId::of::<M>(),
            type_name: core::any::type_name::<M>(),
        }
    }

    /// Returns the underlying `TypeId`.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the full type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the type name without its module path or generic arguments.
    ///
    /// `my_bot::users::UsersModule` becomes `UsersModule`.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        short_type_name(self.type_name)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}

/// Strips the module path and generic arguments from a type name.
#[must_use]
pub fn short_type_name(type_name: &str) -> &str {
    let base = type_name.split('<').next().unwrap_or(type_name);
    base.rsplit("::").next().unwrap_or(base)
}

// ─────────────────────────────────────────────────────────────────────────────
// Module Trait
// ─────────────────────────────────────────────────────────────────────────────

/// An independently pluggable unit with declared dependencies.
///
/// Modules follow a strict lifecycle driven by the
/// [`ModuleManager`]:
///
/// 1. **Initialize** - `on_initialize()` in dependency order
/// 2. **Enable** - `on_enable()` right after the module's own initialize
/// 3. **Disable** - `on_disable()` in reverse dependency order at shutdown
///
/// Every dependency of a module is enabled before the module's
/// `on_initialize()` runs, so hooks can fetch their declared dependencies with
/// [`ModuleContext::get_module_or_err`].
///
/// Hooks take `&self`. Modules that hold state across hooks keep it behind
/// interior mutability (`parking_lot::Mutex`, atomics, ...).
///
/// # Example
///
/// ```ignore
/// pub struct UsersModule {
///     cache: Mutex<HashMap<u64, User>>,
/// }
///
/// impl Module for UsersModule {
///     fn dependencies(&self) -> Vec<ModuleId> {
///         vec![ModuleId::of::<DatabaseModule>()]
///     }
///
///     fn load_after(&self) -> Vec<ModuleId> {
///         vec![ModuleId::of::<CommandsModule>()]
///     }
///
///     fn on_initialize(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
///         let db = ctx.get_module_or_err::<DatabaseModule>()?;
///         db.register_table("users")?;
///         Ok(())
///     }
/// }
/// ```
pub trait Module: DowncastSync {
    /// Returns the module's name for logs and error messages.
    ///
    /// Default implementation returns the type name.
    fn name(&self) -> &str {
        core::any::type_name::<Self>()
    }

    /// Declares modules that must be registered and enabled before this one.
    ///
    /// Resolution fails if any of them is not registered.
    fn dependencies(&self) -> Vec<ModuleId> {
        Vec::new()
    }

    /// Declares modules that should start before this one when present.
    ///
    /// Unlike [`dependencies()`](Self::dependencies), absent modules are
    /// ignored.
    fn load_after(&self) -> Vec<ModuleId> {
        Vec::new()
    }

    /// Allocates resources and wires up dependencies.
    fn on_initialize(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Starts active behavior such as timers or listeners.
    fn on_enable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Releases what `on_initialize` and `on_enable` acquired.
    ///
    /// Called in **reverse** dependency order. A failure here is recorded but
    /// does not stop the remaining modules from being disabled.
    fn on_disable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        Ok(())
    }
}

impl_downcast!(sync Module);

// ─────────────────────────────────────────────────────────────────────────────
// Modules Trait (for add_modules polymorphism)
// ─────────────────────────────────────────────────────────────────────────────

/// Trait for types that can be added to a manager as modules.
///
/// This trait enables `manager.add_modules()` to accept both:
/// - Single modules implementing [`Module`]
/// - Module groups via [`ModuleGroupBuilder`]
///
/// Users typically don't implement this trait directly.
pub trait Modules {
    /// Registers these modules with the manager.
    ///
    /// # Errors
    ///
    /// Returns the first [`RegistryError`] encountered. Modules of a group
    /// that precede the failing one stay registered.
    fn add_to_manager(self, manager: &mut ModuleManager) -> Result<(), RegistryError>;
}

/// Single modules implement `Modules` directly.
impl<M: Module> Modules for M {
    fn add_to_manager(self, manager: &mut ModuleManager) -> Result<(), RegistryError> {
        // Capture the id while we still have the concrete type
        manager.register_boxed(ModuleId::of::<M>(), Arc::new(self))
    }
}

/// `ModuleGroupBuilder` implements `Modules` to add all contained modules.
impl Modules for ModuleGroupBuilder {
    fn add_to_manager(self, manager: &mut ModuleManager) -> Result<(), RegistryError> {
        for boxed in self.modules {
            manager.register_boxed(boxed.id, boxed.module)?;
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModuleGroup Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A collection of modules that can be added together.
///
/// # Example
///
/// ```ignore
/// pub struct DefaultModules;
///
/// impl ModuleGroup for DefaultModules {
///     fn build(self) -> ModuleGroupBuilder {
///         ModuleGroupBuilder::new()
///             .add(AppInfoModule)
///             .add(TracingModule::default())
///             .add(ConfigModule::default())
///     }
/// }
///
/// manager.add_modules(
///     DefaultModules
///         .build()
///         .disable::<TracingModule>()
///         .add(CustomTracingModule::new()),
/// )?;
/// ```
pub trait ModuleGroup {
    /// Returns the modules in this group.
    fn build(self) -> ModuleGroupBuilder;
}

/// A shared module with its captured [`ModuleId`].
pub(crate) struct BoxedModule {
    pub(crate) id: ModuleId,
    pub(crate) module: Arc<dyn Module>,
}

impl BoxedModule {
    fn new<M: Module>(module: M) -> Self {
        Self {
            id: ModuleId::of::<M>(),
            module: Arc::new(module),
        }
    }
}

/// Builder for customizing module groups.
///
/// Allows adding, removing, and reordering modules within a group. Position
/// within the group only affects tie-breaking between independent modules;
/// declared dependencies always win.
#[derive(Default)]
pub struct ModuleGroupBuilder {
    /// The modules in this group, in order.
    pub(crate) modules: Vec<BoxedModule>,
}

impl ModuleGroupBuilder {
    /// Creates a new empty module group builder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
        }
    }

    /// Adds a module to the end of the group.
    #[must_use]
    #[expect(
        clippy::should_implement_trait,
        reason = "This is a builder method, not std::ops::Add"
    )]
    pub fn add<M: Module>(mut self, module: M) -> Self {
        self.modules.push(BoxedModule::new(module));
        self
    }

    /// Adds a module before `Target` in the group.
    ///
    /// If `Target` is not found, the module is added at the beginning.
    #[must_use]
    pub fn add_before<M: Module, Target: Module>(mut self, module: M) -> Self {
        let position = self.position_of(ModuleId::of::<Target>()).unwrap_or(0);
        self.modules.insert(position, BoxedModule::new(module));
        self
    }

    /// Adds a module after `Target` in the group.
    ///
    /// If `Target` is not found, the module is added at the end.
    #[must_use]
    pub fn add_after<M: Module, Target: Module>(mut self, module: M) -> Self {
        let position = self
            .position_of(ModuleId::of::<Target>())
            .map_or(self.modules.len(), |i| i + 1);
        self.modules.insert(position, BoxedModule::new(module));
        self
    }

    /// Removes a module from the group by type.
    ///
    /// If the module is not found, this is a no-op.
    #[must_use]
    pub fn disable<M: Module>(mut self) -> Self {
        let id = ModuleId::of::<M>();
        self.modules.retain(|m| m.id != id);
        self
    }

    /// Returns true if the group contains a module of type `M`.
    #[must_use]
    pub fn contains<M: Module>(&self) -> bool {
        self.position_of(ModuleId::of::<M>()).is_some()
    }

    /// Returns the ids of the modules in group order.
    #[must_use]
    pub fn ids(&self) -> Vec<ModuleId> {
        self.modules.iter().map(|m| m.id).collect()
    }

    /// Returns the number of modules in the group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Returns true if the group contains no modules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn position_of(&self, id: ModuleId) -> Option<usize> {
        self.modules.iter().position(|m| m.id == id)
    }
}
