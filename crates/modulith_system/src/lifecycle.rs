//! Driving modules through their lifecycle.
//!
//! The [`LifecycleOrchestrator`] walks a resolved load order, calling
//! `on_initialize` then `on_enable` for each module before moving to the next,
//! and calls `on_disable` in reverse order at shutdown.
//!
//! # Failure handling
//!
//! A failing startup hook is handled according to the [`StartupPolicy`]:
//!
//! - [`FailFast`](StartupPolicy::FailFast) stops at the first failure and
//!   disables everything enabled so far, newest first.
//! - [`BestEffort`](StartupPolicy::BestEffort) marks the module `Failed`, skips
//!   every module that needs it and carries on.
//!
//! Shutdown never stops early: disable failures are collected in the
//! [`ShutdownReport`].

use crate::error::{ModuleError, StartupError};
use crate::manager::ModuleContext;
use crate::module::{ModuleId, ModuleState};
use crate::registry::{ModuleDescriptor, ModuleRegistry};
use core::any::Any;
use core::fmt;
use core::time::Duration;
use hashbrown::HashSet;
use parking_lot::Mutex;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;
use tracing::{debug, error, info, info_span, warn};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// How startup reacts to a failing hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StartupPolicy {
    /// Abort on the first failure and roll back.
    #[default]
    FailFast,
    /// Quarantine the failing module and its dependents, then continue.
    BestEffort,
}

/// Settings applied to every module of a manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleConfig {
    /// Startup failure policy.
    pub policy: StartupPolicy,
    /// Hooks running longer than this are logged as warnings.
    pub slow_hook_threshold: Option<Duration>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            policy: StartupPolicy::default(),
            slow_hook_threshold: Some(Duration::from_secs(5)),
        }
    }
}

impl LifecycleConfig {
    /// Sets the startup failure policy.
    #[must_use]
    pub fn with_policy(mut self, policy: StartupPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the duration after which a hook is reported as slow.
    #[must_use]
    pub fn with_slow_hook_threshold(mut self, threshold: Duration) -> Self {
        self.slow_hook_threshold = Some(threshold);
        self
    }

    /// Disables slow hook warnings.
    #[must_use]
    pub fn without_slow_hook_warning(mut self) -> Self {
        self.slow_hook_threshold = None;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Outcomes
// ─────────────────────────────────────────────────────────────────────────────

/// A lifecycle hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookPhase {
    /// `Module::on_initialize`
    Initialize,
    /// `Module::on_enable`
    Enable,
    /// `Module::on_disable`
    Disable,
}

impl fmt::Display for HookPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookPhase::Initialize => "initialize",
            HookPhase::Enable => "enable",
            HookPhase::Disable => "disable",
        })
    }
}

/// A hook that returned an error or panicked.
#[derive(Debug, thiserror::Error)]
#[error("{} failed to {phase}: {error}", .module.short_name())]
pub struct HookFailure {
    /// The module whose hook failed.
    pub module: ModuleId,
    /// Which hook failed.
    pub phase: HookPhase,
    /// The error the hook produced.
    #[source]
    pub error: ModuleError,
}

/// Result of a startup that was not aborted.
#[derive(Debug, Default)]
pub struct StartupReport {
    /// Modules now `Enabled`, in load order.
    pub enabled: Vec<ModuleId>,
    /// Modules whose startup hooks failed.
    pub failed: Vec<HookFailure>,
    /// Modules left `Registered` because a dependency failed or was skipped.
    pub skipped: Vec<ModuleId>,
}

impl StartupReport {
    /// Returns true if every module was enabled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

/// Result of disabling modules.
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// Modules now `Disabled`, in the order they were disabled.
    pub disabled: Vec<ModuleId>,
    /// Disable hooks that failed. Those modules are `Failed`.
    pub failures: Vec<HookFailure>,
}

impl ShutdownReport {
    /// Returns true if every disable hook succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LifecycleOrchestrator
// ─────────────────────────────────────────────────────────────────────────────

/// Progress of an orchestrator.
///
/// Moves linearly: `Idle` → `Running` → `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LifecyclePhase {
    Idle,
    Running,
    Stopped,
}

/// Runs lifecycle hooks in load order and applies the startup policy.
#[derive(Debug)]
pub struct LifecycleOrchestrator {
    config: LifecycleConfig,
    phase: Mutex<LifecyclePhase>,
}

impl Default for LifecycleOrchestrator {
    fn default() -> Self {
        Self::new(LifecycleConfig::default())
    }
}

impl LifecycleOrchestrator {
    /// Creates an orchestrator that has not started anything yet.
    #[must_use]
    pub fn new(config: LifecycleConfig) -> Self {
        Self {
            config,
            phase: Mutex::new(LifecyclePhase::Idle),
        }
    }

    /// The settings this orchestrator applies.
    #[must_use]
    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Returns true between a successful `start` and `stop`.
    #[must_use]
    pub fn is_running(&self) -> bool {
        *self.phase.lock() == LifecyclePhase::Running
    }

    /// Initializes and enables every module of `order`.
    ///
    /// Each module is enabled before the next one is initialized, so a hook
    /// always sees its dependencies `Enabled`.
    ///
    /// # Errors
    ///
    /// - [`StartupError::AlreadyStarted`] if `start` was called before
    /// - [`StartupError::Aborted`] when a hook fails under
    ///   [`StartupPolicy::FailFast`], after the rollback completed
    pub fn start(
        &self,
        registry: &ModuleRegistry,
        order: &[ModuleId],
    ) -> Result<StartupReport, StartupError> {
        {
            let mut phase = self.phase.lock();
            if *phase != LifecyclePhase::Idle {
                return Err(StartupError::AlreadyStarted);
            }
            *phase = LifecyclePhase::Running;
        }

        info!(modules = order.len(), policy = ?self.config.policy, "starting modules");

        let mut report = StartupReport::default();
        let mut blocked: HashSet<ModuleId> = HashSet::new();

        for &id in order {
            let Some(descriptor) = registry.get(id) else {
                continue;
            };

            if blocked.contains(&id) {
                warn!(module = %descriptor.name(), "skipping module: a dependency is unavailable");
                report.skipped.push(id);
                continue;
            }

            let Err(failure) = self.bring_up(registry, descriptor) else {
                report.enabled.push(id);
                continue;
            };

            match self.config.policy {
                StartupPolicy::FailFast => {
                    warn!(
                        module = %descriptor.name(),
                        enabled = report.enabled.len(),
                        "startup aborted, rolling back"
                    );
                    let rollback = self.disable_enabled(registry, order);
                    *self.phase.lock() = LifecyclePhase::Stopped;
                    return Err(StartupError::Aborted { failure, rollback });
                }
                StartupPolicy::BestEffort => {
                    blocked.extend(registry.dependents_of(id));
                    report.failed.push(failure);
                }
            }
        }

        info!(
            enabled = report.enabled.len(),
            failed = report.failed.len(),
            skipped = report.skipped.len(),
            "module startup finished"
        );
        Ok(report)
    }

    /// Disables every `Enabled` module of `order`, last first.
    ///
    /// Does nothing unless the orchestrator is running.
    pub fn stop(&self, registry: &ModuleRegistry, order: &[ModuleId]) -> ShutdownReport {
        {
            let mut phase = self.phase.lock();
            if *phase != LifecyclePhase::Running {
                debug!(phase = ?*phase, "stop requested while not running");
                return ShutdownReport::default();
            }
            *phase = LifecyclePhase::Stopped;
        }

        info!(modules = order.len(), "stopping modules");
        let report = self.disable_enabled(registry, order);
        info!(
            disabled = report.disabled.len(),
            failures = report.failures.len(),
            "module shutdown finished"
        );
        report
    }

    fn bring_up(
        &self,
        registry: &ModuleRegistry,
        descriptor: &ModuleDescriptor,
    ) -> Result<(), HookFailure> {
        for (phase, next) in [
            (HookPhase::Initialize, ModuleState::Initialized),
            (HookPhase::Enable, ModuleState::Enabled),
        ] {
            if let Err(failure) = self.run_hook(registry, descriptor, phase) {
                transition(descriptor, ModuleState::Failed);
                return Err(failure);
            }
            transition(descriptor, next);
        }
        Ok(())
    }

    fn disable_enabled(&self, registry: &ModuleRegistry, order: &[ModuleId]) -> ShutdownReport {
        let mut report = ShutdownReport::default();

        for &id in order.iter().rev() {
            let Some(descriptor) = registry.get(id) else {
                continue;
            };
            if descriptor.state() != ModuleState::Enabled {
                continue;
            }

            match self.run_hook(registry, descriptor, HookPhase::Disable) {
                Ok(()) => {
                    transition(descriptor, ModuleState::Disabled);
                    report.disabled.push(id);
                }
                Err(failure) => {
                    transition(descriptor, ModuleState::Failed);
                    report.failures.push(failure);
                }
            }
        }

        report
    }

    fn run_hook(
        &self,
        registry: &ModuleRegistry,
        descriptor: &ModuleDescriptor,
        phase: HookPhase,
    ) -> Result<(), HookFailure> {
        let span = info_span!("module_hook", module = %descriptor.name(), %phase);
        let _enter = span.enter();

        let ctx = ModuleContext::new(registry, descriptor);
        let module = descriptor.module();
        let started = Instant::now();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match phase {
            HookPhase::Initialize => module.on_initialize(&ctx),
            HookPhase::Enable => module.on_enable(&ctx),
            HookPhase::Disable => module.on_disable(&ctx),
        }));

        let elapsed = started.elapsed();
        if let Some(threshold) = self.config.slow_hook_threshold
            && elapsed > threshold
        {
            warn!(?elapsed, ?threshold, "slow module hook");
        }

        let result = outcome
            .unwrap_or_else(|payload| Err(ModuleError::Panicked(panic_message(payload.as_ref()))));

        result.map_err(|error| {
            error!(module = %descriptor.name(), %phase, %error, "module hook failed");
            HookFailure {
                module: descriptor.id(),
                phase,
                error,
            }
        })
    }
}

fn transition(descriptor: &ModuleDescriptor, next: ModuleState) {
    descriptor.set_state(next);
    info!(module = %descriptor.name(), state = %next, "module state changed");
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = LifecycleConfig::default();
        assert_eq!(config.policy, StartupPolicy::FailFast);
        assert_eq!(config.slow_hook_threshold, Some(Duration::from_secs(5)));
    }

    #[test]
    fn config_builder() {
        let config = LifecycleConfig::default()
            .with_policy(StartupPolicy::BestEffort)
            .with_slow_hook_threshold(Duration::from_millis(250));
        assert_eq!(config.policy, StartupPolicy::BestEffort);
        assert_eq!(config.slow_hook_threshold, Some(Duration::from_millis(250)));

        let quiet = config.without_slow_hook_warning();
        assert_eq!(quiet.slow_hook_threshold, None);
    }

    #[test]
    fn empty_reports() {
        assert!(StartupReport::default().is_complete());
        assert!(ShutdownReport::default().is_clean());
    }

    #[test]
    fn panic_messages() {
        let from_str: Box<dyn Any + Send> = Box::new("boom");
        let from_string: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let opaque: Box<dyn Any + Send> = Box::new(7_u8);

        assert_eq!(panic_message(from_str.as_ref()), "boom");
        assert_eq!(panic_message(from_string.as_ref()), "bang");
        assert_eq!(panic_message(opaque.as_ref()), "non-string panic payload");
    }

    #[test]
    fn stop_before_start_is_a_no_op() {
        let orchestrator = LifecycleOrchestrator::default();
        let report = orchestrator.stop(&ModuleRegistry::new(), &[]);
        assert!(report.disabled.is_empty());
        assert!(!orchestrator.is_running());
    }

    #[test]
    fn start_twice_is_rejected() {
        let orchestrator = LifecycleOrchestrator::default();
        let registry = ModuleRegistry::new();

        assert!(orchestrator.start(&registry, &[]).is_ok());
        assert!(orchestrator.is_running());
        assert!(matches!(
            orchestrator.start(&registry, &[]),
            Err(StartupError::AlreadyStarted)
        ));
    }

    #[test]
    fn hook_failure_message() {
        struct Users;
        impl crate::module::Module for Users {}

        let failure = HookFailure {
            module: ModuleId::of::<Users>(),
            phase: HookPhase::Initialize,
            error: ModuleError::failed("database offline"),
        };
        assert_eq!(failure.to_string(), "Users failed to initialize: database offline");
    }
}
