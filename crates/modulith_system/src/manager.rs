//! The [`ModuleManager`] façade and the [`ModuleContext`] handed to hooks.
//!
//! # Lifecycle
//!
//! 1. **Registration** - `add_modules()` for single modules and groups
//! 2. **Resolution** - dependencies are validated and sorted on `start_all()`
//! 3. **Startup** - `on_initialize()` then `on_enable()`, module by module
//! 4. **Running** - callers fetch modules with `get_module()`
//! 5. **Shutdown** - `stop_all()` disables modules in reverse order
//!
//! # Example
//!
//! ```
//! use modulith_system::prelude::*;
//!
//! struct Database;
//! impl Module for Database {}
//!
//! let mut manager = ModuleManager::with_config(
//!     LifecycleConfig::default().with_policy(StartupPolicy::BestEffort),
//! );
//! manager.add_modules(Database)?;
//!
//! assert!(manager.get_module::<Database>().is_none());
//! manager.start_all()?;
//! assert!(manager.get_module::<Database>().is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::error::{ModuleNotFound, RegistryError, ResolveError, StartupError};
use crate::lifecycle::{LifecycleConfig, LifecycleOrchestrator, ShutdownReport, StartupReport};
use crate::module::{Module, ModuleId, ModuleState, Modules};
use crate::registry::{ModuleDescriptor, ModuleRegistry};
use std::sync::Arc;
use tracing::{error, warn};

// ─────────────────────────────────────────────────────────────────────────────
// ModuleContext
// ─────────────────────────────────────────────────────────────────────────────

/// The view of the manager available inside lifecycle hooks.
///
/// Lookups only return modules that are currently `Initialized` or `Enabled`.
/// Only declared dependencies and load-after targets are guaranteed to be up
/// when a hook runs; looking up anything else logs a warning.
#[derive(Debug, Clone, Copy)]
pub struct ModuleContext<'a> {
    registry: &'a ModuleRegistry,
    requester: &'a ModuleDescriptor,
}

impl<'a> ModuleContext<'a> {
    pub(crate) fn new(registry: &'a ModuleRegistry, requester: &'a ModuleDescriptor) -> Self {
        Self {
            registry,
            requester,
        }
    }

    /// The module whose hook is running.
    #[must_use]
    pub fn requester(&self) -> &'a ModuleDescriptor {
        self.requester
    }

    /// Returns the live instance of `M`, if any.
    #[must_use]
    pub fn get_module<M: Module>(&self) -> Option<Arc<M>> {
        self.check_declared(ModuleId::of::<M>());
        self.registry.live_as::<M>()
    }

    /// Returns the live instance of `M`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleNotFound`] if `M` is not registered or not live.
    pub fn get_module_or_err<M: Module>(&self) -> Result<Arc<M>, ModuleNotFound> {
        self.get_module::<M>().ok_or(ModuleNotFound {
            id: ModuleId::of::<M>(),
        })
    }

    /// Returns the live module registered under `id`, if any.
    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<Arc<dyn Module>> {
        self.check_declared(id);
        self.registry.live(id)
    }

    /// Returns the state of the module registered under `id`.
    #[must_use]
    pub fn state(&self, id: ModuleId) -> Option<ModuleState> {
        self.registry.get(id).map(ModuleDescriptor::state)
    }

    fn check_declared(&self, id: ModuleId) {
        if id != self.requester.id() && !self.requester.declares(id) {
            warn!(
                module = %self.requester.name(),
                target = id.short_name(),
                "lookup of an undeclared module; its load order is not guaranteed"
            );
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ModuleManager
// ─────────────────────────────────────────────────────────────────────────────

/// Registers modules, starts them in dependency order and hands them out.
///
/// The manager is built once during application assembly and shared
/// explicitly afterwards, for example as an `Arc<ModuleManager>`.
#[derive(Debug, Default)]
pub struct ModuleManager {
    registry: ModuleRegistry,
    orchestrator: LifecycleOrchestrator,
}

impl ModuleManager {
    /// Creates a manager with the default [`LifecycleConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager with the given lifecycle settings.
    #[must_use]
    pub fn with_config(config: LifecycleConfig) -> Self {
        Self {
            registry: ModuleRegistry::new(),
            orchestrator: LifecycleOrchestrator::new(config),
        }
    }

    /// The lifecycle settings of this manager.
    #[must_use]
    pub fn config(&self) -> &LifecycleConfig {
        self.orchestrator.config()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Adds a module or a group of modules.
    ///
    /// # Example
    ///
    /// ```ignore
    /// manager
    ///     .add_modules(DefaultModules.build())?
    ///     .add_modules(DatabaseModule::new(url))?
    ///     .add_modules(UsersModule::default())?;
    /// ```
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Duplicate`] if a module type is added twice
    /// - [`RegistryError::SelfDependency`] if a module names itself
    /// - [`RegistryError::Sealed`] after `start_all()` resolved the modules
    pub fn add_modules<M: Modules>(&mut self, modules: M) -> Result<&mut Self, RegistryError> {
        modules.add_to_manager(self)?;
        Ok(self)
    }

    /// Adds a single module.
    ///
    /// # Errors
    ///
    /// See [`add_modules`](Self::add_modules).
    pub fn register_module<M: Module>(&mut self, module: M) -> Result<(), RegistryError> {
        self.register_boxed(ModuleId::of::<M>(), Arc::new(module))
    }

    pub(crate) fn register_boxed(
        &mut self,
        id: ModuleId,
        module: Arc<dyn Module>,
    ) -> Result<(), RegistryError> {
        self.registry.register(ModuleDescriptor::new(id, module)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lookups
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns true if a module of type `M` is registered.
    #[must_use]
    pub fn has_module<M: Module>(&self) -> bool {
        self.registry.contains(ModuleId::of::<M>())
    }

    /// Returns the live instance of `M`, or `None`.
    ///
    /// Never fails loudly; use [`get_module_or_err`](Self::get_module_or_err)
    /// when the module is required.
    #[must_use]
    pub fn get_module<M: Module>(&self) -> Option<Arc<M>> {
        self.registry.live_as::<M>()
    }

    /// Returns the live instance of `M`.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleNotFound`] naming `M` if it is not registered or not
    /// live. The miss is logged at error level.
    pub fn get_module_or_err<M: Module>(&self) -> Result<Arc<M>, ModuleNotFound> {
        self.get_module::<M>().ok_or_else(|| {
            let id = ModuleId::of::<M>();
            error!(
                module = id.short_name(),
                state = ?self.state(id),
                "required module is not available"
            );
            ModuleNotFound { id }
        })
    }

    /// Returns the live module registered under `id`, if any.
    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<Arc<dyn Module>> {
        self.registry.live(id)
    }

    /// Returns the state of the module registered under `id`.
    #[must_use]
    pub fn state(&self, id: ModuleId) -> Option<ModuleState> {
        self.registry.get(id).map(ModuleDescriptor::state)
    }

    /// Returns every module with its state, in registration order.
    #[must_use]
    pub fn states(&self) -> Vec<(ModuleId, ModuleState)> {
        self.registry.iter().map(|d| (d.id(), d.state())).collect()
    }

    /// The resolved load order, once modules were resolved.
    #[must_use]
    pub fn load_order(&self) -> Option<&[ModuleId]> {
        self.registry.resolved_order()
    }

    /// The underlying registry.
    #[must_use]
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Computes the load order without running any hook.
    ///
    /// # Errors
    ///
    /// See [`ModuleRegistry::resolve`].
    pub fn resolve(&mut self) -> Result<&[ModuleId], ResolveError> {
        self.registry.resolve()
    }

    /// Resolves the modules and brings every one of them up.
    ///
    /// # Errors
    ///
    /// - [`StartupError::Resolve`] if the load order cannot be computed; no
    ///   hook runs in that case
    /// - [`StartupError::AlreadyStarted`] on a second call
    /// - [`StartupError::Aborted`] if a hook fails under fail-fast
    pub fn start_all(&mut self) -> Result<StartupReport, StartupError> {
        self.registry.resolve()?;
        let order = self.registry.resolved_order().unwrap_or_default();
        self.orchestrator.start(&self.registry, order)
    }

    /// Disables every enabled module in reverse load order.
    ///
    /// Failures are collected in the report; every module still gets its
    /// `on_disable` call.
    pub fn stop_all(&self) -> ShutdownReport {
        let order = self.registry.resolved_order().unwrap_or_default();
        self.orchestrator.stop(&self.registry, order)
    }

    /// Returns true between `start_all()` and `stop_all()`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.orchestrator.is_running()
    }
}
