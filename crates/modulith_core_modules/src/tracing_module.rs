//! Tracing and observability module.
//!
//! Provides [`TracingModule`] which installs the global `tracing` subscriber.
//!
//! # Lifecycle
//!
//! - **`on_initialize()`** installs the subscriber. Every module that loads
//!   after [`TracingModule`] logs through it, so applications usually register
//!   it first or through [`DefaultModules`](crate::DefaultModules).
//! - **`on_disable()`** logs the shutdown. The subscriber stays installed so
//!   the remaining modules can still log their own shutdown.
//!
//! # Example
//!
//! ```
//! use modulith_system::manager::ModuleManager;
//! use modulith_core_modules::{AppInfoModule, TracingFormat, TracingModule};
//! use tracing::Level;
//!
//! let mut manager = ModuleManager::new();
//! manager
//!     .add_modules(AppInfoModule::default())?
//!     .add_modules(
//!         TracingModule::default()
//!             .with_level(Level::DEBUG)
//!             .with_format(TracingFormat::Compact),
//!     )?;
//! manager.start_all()?;
//!
//! let config = manager.get_module_or_err::<TracingModule>()?.config();
//! assert_eq!(config.level, Level::DEBUG);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use crate::AppInfoModule;
use modulith_system::error::ModuleError;
use modulith_system::manager::ModuleContext;
use modulith_system::module::{Module, ModuleId};
use tracing::Level;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ─────────────────────────────────────────────────────────────────────────────
// TracingFormat
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TracingFormat {
    /// Human-readable colored output (default).
    #[default]
    Pretty,
    /// Compact single-line output.
    Compact,
    /// JSON structured output for log aggregation.
    Json,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingConfig
// ─────────────────────────────────────────────────────────────────────────────

/// The effective tracing configuration.
///
/// Modules can read this to adapt their logging, for example to skip building
/// expensive debug output.
///
/// ```ignore
/// fn on_enable(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
///     let tracing = ctx.get_module_or_err::<TracingModule>()?;
///     if tracing.config().level >= Level::DEBUG {
///         tracing::debug!(commands = ?self.dump(), "registered commands");
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// The configured log level.
    pub level: Level,
    /// The configured output format.
    pub format: TracingFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// TracingModule
// ─────────────────────────────────────────────────────────────────────────────

/// Tracing and logging module.
///
/// Configures the `tracing` subscriber using [`tracing_subscriber`]. If a
/// global subscriber is already set, for example by a test harness, the
/// existing one is kept.
///
/// # Dependencies
///
/// - [`AppInfoModule`]
///
/// # Configuration Options
///
/// ```
/// use modulith_core_modules::{TracingModule, TracingFormat};
/// use tracing::Level;
///
/// // Development: Pretty colored output with debug level
/// let dev = TracingModule::default()
///     .with_level(Level::DEBUG)
///     .with_format(TracingFormat::Pretty)
///     .with_span_events(true);  // Show hook span enter/exit
///
/// // Production: JSON output for log aggregation
/// let prod = TracingModule::default()
///     .with_level(Level::INFO)
///     .with_format(TracingFormat::Json)
///     .with_env_filter("modulith_system=info,my_bot=debug");
/// ```
#[derive(Debug, Clone)]
pub struct TracingModule {
    /// Maximum log level.
    level: Level,
    /// Output format.
    format: TracingFormat,
    /// Environment filter (e.g., "`modulith_system=debug,my_bot=info`").
    env_filter: Option<String>,
    /// Whether to include span events (enter/exit).
    span_events: bool,
}

impl Default for TracingModule {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: TracingFormat::Pretty,
            env_filter: None,
            span_events: false,
        }
    }
}

impl TracingModule {
    /// Creates a new `TracingModule` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum log level.
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Sets the output format.
    #[must_use]
    pub fn with_format(mut self, format: TracingFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets a custom environment filter string.
    ///
    /// Format: `target=level,target=level,...`. An invalid filter falls back
    /// to the configured level.
    #[must_use]
    pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
        self.env_filter = Some(filter.into());
        self
    }

    /// Enables span enter/exit events in output.
    #[must_use]
    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    /// The configuration this module installs.
    #[must_use]
    pub fn config(&self) -> TracingConfig {
        TracingConfig {
            level: self.level,
            format: self.format,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        match &self.env_filter {
            Some(filter) => {
                EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new(self.level.as_str()))
            }
            None => EnvFilter::new(self.level.as_str()),
        }
    }

    fn install(&self) {
        let env_filter = self.env_filter();

        let span_events = if self.span_events {
            FmtSpan::ENTER | FmtSpan::EXIT
        } else {
            FmtSpan::NONE
        };

        // try_init().ok() keeps an already installed subscriber
        match self.format {
            TracingFormat::Pretty => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Compact => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
            TracingFormat::Json => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_span_events(span_events),
                    )
                    .try_init()
                    .ok();
            }
        }
    }
}

impl Module for TracingModule {
    fn dependencies(&self) -> Vec<ModuleId> {
        vec![ModuleId::of::<AppInfoModule>()]
    }

    fn on_initialize(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        self.install();

        let app = ctx.get_module_or_err::<AppInfoModule>()?;
        tracing::info!(
            app = app.info().name,
            level = %self.level,
            format = ?self.format,
            "TracingModule initialized"
        );
        Ok(())
    }

    fn on_disable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        tracing::info!("TracingModule shutting down");
        Ok(())
    }
}
