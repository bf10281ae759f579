//! A framework for composing applications out of independently developed
//! modules that are started in dependency order and stopped in reverse.

pub use modulith_internal::*;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use modulith_internal::prelude::*;
}
