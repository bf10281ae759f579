//! The module catalog.
//!
//! A [`ModuleRegistry`] owns one [`ModuleDescriptor`] per registered module and
//! turns their declarations into a load order with
//! [`resolve`](ModuleRegistry::resolve). Once resolved, the registry is sealed:
//! the order it handed out stays valid for the life of the process.

use crate::error::{RegistryError, ResolveError};
use crate::module::{Module, ModuleId, ModuleState};
use core::fmt;
use hashbrown::{HashMap, HashSet};
use modulith_graph::DependencyGraph;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{debug, info};

// ─────────────────────────────────────────────────────────────────────────────
// ModuleDescriptor
// ─────────────────────────────────────────────────────────────────────────────

/// A registered module together with its declarations and current state.
///
/// Declarations are read from the module exactly once, when the descriptor is
/// built.
pub struct ModuleDescriptor {
    id: ModuleId,
    name: String,
    module: Arc<dyn Module>,
    dependencies: Vec<ModuleId>,
    load_after: Vec<ModuleId>,
    state: RwLock<ModuleState>,
}

impl ModuleDescriptor {
    /// Captures the declarations of `module`, registered under `id`.
    ///
    /// Repeated declarations are collapsed, keeping the first occurrence.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::SelfDependency`] if the module lists `id` as a
    /// dependency or load-after hint.
    pub fn new(id: ModuleId, module: Arc<dyn Module>) -> Result<Self, RegistryError> {
        let dependencies = dedup(module.dependencies());
        let load_after = dedup(module.load_after());

        if dependencies.contains(&id) || load_after.contains(&id) {
            return Err(RegistryError::SelfDependency(id));
        }

        Ok(Self {
            id,
            name: module.name().to_owned(),
            module,
            dependencies,
            load_after,
            state: RwLock::new(ModuleState::Registered),
        })
    }

    /// Builds a descriptor for a concrete module value.
    ///
    /// # Errors
    ///
    /// See [`ModuleDescriptor::new`].
    pub fn of<M: Module>(module: M) -> Result<Self, RegistryError> {
        Self::new(ModuleId::of::<M>(), Arc::new(module))
    }

    /// The module's identity.
    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// The module's display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The module instance.
    #[must_use]
    pub fn module(&self) -> &Arc<dyn Module> {
        &self.module
    }

    /// Hard dependencies, in declaration order.
    #[must_use]
    pub fn dependencies(&self) -> &[ModuleId] {
        &self.dependencies
    }

    /// Load-after hints, in declaration order.
    #[must_use]
    pub fn load_after(&self) -> &[ModuleId] {
        &self.load_after
    }

    /// Returns true if `id` is a dependency or a load-after hint.
    #[must_use]
    pub fn declares(&self, id: ModuleId) -> bool {
        self.dependencies.contains(&id) || self.load_after.contains(&id)
    }

    /// The current lifecycle state.
    #[must_use]
    pub fn state(&self) -> ModuleState {
        *self.state.read()
    }

    pub(crate) fn set_state(&self, next: ModuleState) {
        let mut state = self.state.write();
        debug_assert!(
            state.can_transition_to(next),
            "illegal transition for {}: {} -> {}",
            self.name,
            *state,
            next
        );
        *state = next;
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("load_after", &self.load_after)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

fn dedup(ids: Vec<ModuleId>) -> Vec<ModuleId> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// ModuleRegistry
// ─────────────────────────────────────────────────────────────────────────────

/// Registered modules in registration order, plus the cached load order.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    descriptors: Vec<ModuleDescriptor>,
    index: HashMap<ModuleId, usize>,
    resolved: Option<Vec<ModuleId>>,
}

impl ModuleRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a module.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::Sealed`] if the registry was already resolved
    /// - [`RegistryError::Duplicate`] if the id is already registered
    pub fn register(&mut self, descriptor: ModuleDescriptor) -> Result<(), RegistryError> {
        let id = descriptor.id;
        if self.resolved.is_some() {
            return Err(RegistryError::Sealed(id));
        }
        if self.index.contains_key(&id) {
            return Err(RegistryError::Duplicate(id));
        }

        debug!(module = %descriptor.name, "registered module");
        self.index.insert(id, self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Computes the load order and seals the registry.
    ///
    /// Every dependency comes before its dependents, and every load-after
    /// target that is registered comes before the module naming it. Ties go
    /// to the module registered first. Later calls return the cached order.
    ///
    /// # Errors
    ///
    /// - [`ResolveError::MissingDependency`] for the first hard dependency,
    ///   in registration then declaration order, that is not registered
    /// - [`ResolveError::Cycle`] if the declarations are circular
    ///
    /// A failed resolution caches nothing and leaves the registry open.
    pub fn resolve(&mut self) -> Result<&[ModuleId], ResolveError> {
        if self.resolved.is_none() {
            let order = self.compute_order()?;
            info!(
                modules = order.len(),
                order = ?order.iter().map(ModuleId::short_name).collect::<Vec<_>>(),
                "resolved module load order"
            );
            self.resolved = Some(order);
        }
        Ok(self.resolved.as_deref().unwrap_or_default())
    }

    fn compute_order(&self) -> Result<Vec<ModuleId>, ResolveError> {
        for descriptor in &self.descriptors {
            if let Some(missing) = descriptor
                .dependencies
                .iter()
                .find(|dep| !self.index.contains_key(*dep))
            {
                return Err(ResolveError::MissingDependency {
                    module: descriptor.id,
                    dependency: *missing,
                });
            }
        }

        let mut graph = DependencyGraph::with_capacity(self.descriptors.len());
        graph.add_nodes(self.descriptors.iter().map(|d| d.id))?;

        for descriptor in &self.descriptors {
            for dependency in &descriptor.dependencies {
                graph.add_edge(*dependency, descriptor.id)?;
            }
            for target in &descriptor.load_after {
                if self.index.contains_key(target) {
                    graph.add_edge(*target, descriptor.id)?;
                } else {
                    debug!(
                        module = %descriptor.name,
                        target = target.short_name(),
                        "ignoring load-after hint for unregistered module"
                    );
                }
            }
        }

        Ok(graph.sort()?)
    }

    /// Returns the descriptor for `id`.
    #[must_use]
    pub fn get(&self, id: ModuleId) -> Option<&ModuleDescriptor> {
        self.index.get(&id).map(|&i| &self.descriptors[i])
    }

    /// Returns true if `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ModuleId) -> bool {
        self.index.contains_key(&id)
    }

    /// Number of registered modules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if no module is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterates descriptors in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.descriptors.iter()
    }

    /// The cached load order, if [`resolve`](Self::resolve) succeeded.
    #[must_use]
    pub fn resolved_order(&self) -> Option<&[ModuleId]> {
        self.resolved.as_deref()
    }

    /// Returns true once a load order is cached.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Every module that hard-depends on `id`, directly or transitively, in
    /// registration order.
    #[must_use]
    pub fn dependents_of(&self, id: ModuleId) -> Vec<ModuleId> {
        let mut found = HashSet::new();
        let mut frontier = vec![id];

        while let Some(current) = frontier.pop() {
            for descriptor in &self.descriptors {
                if descriptor.dependencies.contains(&current) && found.insert(descriptor.id) {
                    frontier.push(descriptor.id);
                }
            }
        }

        self.descriptors
            .iter()
            .map(|d| d.id)
            .filter(|d| *d != id && found.contains(d))
            .collect()
    }

    /// Returns the module if it is registered and live.
    #[must_use]
    pub fn live(&self, id: ModuleId) -> Option<Arc<dyn Module>> {
        self.get(id)
            .filter(|d| d.state().is_live())
            .map(|d| Arc::clone(&d.module))
    }

    /// Returns the concrete module if it is registered and live.
    #[must_use]
    pub fn live_as<M: Module>(&self) -> Option<Arc<M>> {
        self.live(ModuleId::of::<M>())?.downcast_arc::<M>().ok()
    }
}
