use crate::lifecycle::{HookFailure, ShutdownReport};
use crate::module::ModuleId;
use modulith_graph::GraphError;

/// A module lookup named a module that is not registered or not live.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("module not found: {}", .id.short_name())]
pub struct ModuleNotFound {
    /// The module that was requested.
    pub id: ModuleId,
}

/// Errors returned by module lifecycle hooks.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    /// The hook reported a failure.
    #[error("{0}")]
    Failed(String),

    /// The hook looked up a module that was not available.
    #[error(transparent)]
    Lookup(#[from] ModuleNotFound),

    /// The hook panicked.
    #[error("hook panicked: {0}")]
    Panicked(String),

    /// The hook failed with a foreign error.
    #[error("{0}")]
    Other(#[source] Box<dyn core::error::Error + Send + Sync>),
}

impl ModuleError {
    /// Creates a [`ModuleError::Failed`] from a message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Wraps any error as a [`ModuleError::Other`].
    pub fn other<E>(error: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::Other(Box::new(error))
    }
}

/// Errors raised while adding modules to a registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// A module with the same identity is already registered.
    #[error("module already registered: {}", .0.short_name())]
    Duplicate(ModuleId),

    /// The module lists itself as a dependency or load-after hint.
    #[error("module {} declares a dependency on itself", .0.short_name())]
    SelfDependency(ModuleId),

    /// The registry was resolved and accepts no further modules.
    #[error("cannot register {}: modules were already resolved", .0.short_name())]
    Sealed(ModuleId),
}

/// Errors raised while computing the load order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// A hard dependency is not registered.
    #[error(
        "module {} depends on {}, which is not registered",
        .module.short_name(),
        .dependency.short_name()
    )]
    MissingDependency {
        /// The module declaring the dependency.
        module: ModuleId,
        /// The missing dependency.
        dependency: ModuleId,
    },

    /// The declarations form a cycle.
    #[error("dependency cycle: {}", format_cycle(cycle))]
    Cycle {
        /// The modules on the cycle, in edge order.
        cycle: Vec<ModuleId>,
    },

    /// An edge referenced a module the graph does not know.
    #[error("unknown module: {}", .0.short_name())]
    UnknownModule(ModuleId),

    /// Any other graph construction failure.
    #[error(transparent)]
    Graph(GraphError<ModuleId>),
}

impl From<GraphError<ModuleId>> for ResolveError {
    fn from(error: GraphError<ModuleId>) -> Self {
        match error {
            GraphError::Cycle(cycle) => Self::Cycle { cycle },
            GraphError::UnknownNode(id) => Self::UnknownModule(id),
            other => Self::Graph(other),
        }
    }
}

fn format_cycle(cycle: &[ModuleId]) -> String {
    let mut names: Vec<&str> = cycle.iter().map(ModuleId::short_name).collect();
    if let Some(first) = names.first().copied() {
        names.push(first);
    }
    names.join(" -> ")
}

/// Errors returned by [`ModuleManager::start_all`](crate::manager::ModuleManager::start_all).
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The load order could not be computed. No hook ran.
    #[error("failed to resolve modules: {0}")]
    Resolve(#[from] ResolveError),

    /// Startup was already attempted on this manager.
    #[error("modules were already started")]
    AlreadyStarted,

    /// A hook failed and the modules started so far were rolled back.
    #[error("startup aborted: {failure}")]
    Aborted {
        /// The failure that stopped startup.
        #[source]
        failure: HookFailure,
        /// The result of disabling the modules enabled before the failure.
        rollback: ShutdownReport,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Module;

    struct Database;
    impl Module for Database {}

    struct Users;
    impl Module for Users {}

    #[test]
    fn cycle_message_closes_the_loop() {
        let error = ResolveError::Cycle {
            cycle: vec![ModuleId::of::<Database>(), ModuleId::of::<Users>()],
        };
        assert_eq!(
            error.to_string(),
            "dependency cycle: Database -> Users -> Database"
        );
    }

    #[test]
    fn graph_errors_map_to_module_variants() {
        let id = ModuleId::of::<Users>();
        assert_eq!(
            ResolveError::from(GraphError::UnknownNode(id)),
            ResolveError::UnknownModule(id)
        );
        assert_eq!(
            ResolveError::from(GraphError::Cycle(vec![id])),
            ResolveError::Cycle { cycle: vec![id] }
        );
        assert!(matches!(
            ResolveError::from(GraphError::SelfLoop(id)),
            ResolveError::Graph(GraphError::SelfLoop(_))
        ));
    }

    #[test]
    fn lookup_converts_into_module_error() {
        let error: ModuleError = ModuleNotFound {
            id: ModuleId::of::<Database>(),
        }
        .into();
        assert!(matches!(error, ModuleError::Lookup(_)));
        assert_eq!(error.to_string(), "module not found: Database");
    }

    #[test]
    fn messages_use_short_names() {
        let error = ResolveError::MissingDependency {
            module: ModuleId::of::<Users>(),
            dependency: ModuleId::of::<Database>(),
        };
        assert_eq!(
            error.to_string(),
            "module Users depends on Database, which is not registered"
        );
        assert_eq!(
            RegistryError::Sealed(ModuleId::of::<Users>()).to_string(),
            "cannot register Users: modules were already resolved"
        );
    }

    #[test]
    fn other_keeps_the_source_message() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.json missing");
        let error = ModuleError::other(io);
        assert_eq!(error.to_string(), "config.json missing");
    }
}
