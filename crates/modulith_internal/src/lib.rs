//! # Modulith Internal Library
//!
//! Re-exports the core Modulith crates for convenience.

/// Deterministic dependency ordering.
pub use modulith_graph;

/// Module registry and lifecycle orchestration.
pub use modulith_system;

/// Infrastructure modules: application info, tracing, configuration files.
pub use modulith_core_modules;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use modulith_core_modules::{
        AppInfoModule, ConfigModule, DefaultModules, MinimalModules, TracingFormat, TracingModule,
    };
    pub use modulith_graph::{DependencyGraph, GraphError};
    pub use modulith_system::prelude::*;
}
