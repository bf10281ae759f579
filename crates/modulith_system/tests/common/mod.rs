//! Shared helpers for lifecycle integration tests.
//!
//! Every test module records its hook calls into a shared [`Journal`] and can
//! be told to fail, panic or stall in a given phase.

use core::time::Duration;
use std::sync::Arc;

use modulith_system::prelude::*;
use parking_lot::Mutex;

/// Hook calls in the order they happened, as `"<phase> <module>"`.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Entries for one phase, module names only.
    pub fn phase(&self, phase: HookPhase) -> Vec<String> {
        let prefix = format!("{phase} ");
        self.entries()
            .into_iter()
            .filter_map(|entry| entry.strip_prefix(&prefix).map(str::to_owned))
            .collect()
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.0.lock().iter().any(|e| e == entry)
    }

    fn push(&self, entry: String) {
        self.0.lock().push(entry);
    }
}

/// What a recording module does besides recording.
#[derive(Clone, Default)]
pub struct Behavior {
    journal: Journal,
    fail_on: Option<HookPhase>,
    panic_on: Option<HookPhase>,
    stall: Option<Duration>,
}

impl Behavior {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
            ..Self::default()
        }
    }

    pub fn failing_on(mut self, phase: HookPhase) -> Self {
        self.fail_on = Some(phase);
        self
    }

    pub fn panicking_on(mut self, phase: HookPhase) -> Self {
        self.panic_on = Some(phase);
        self
    }

    pub fn stalling_for(mut self, duration: Duration) -> Self {
        self.stall = Some(duration);
        self
    }

    pub fn record(&self, phase: HookPhase, module: &str) -> Result<(), ModuleError> {
        self.journal.push(format!("{phase} {module}"));

        if let Some(duration) = self.stall {
            std::thread::sleep(duration);
        }
        if self.panic_on == Some(phase) {
            panic!("{module} exploded during {phase}");
        }
        if self.fail_on == Some(phase) {
            return Err(ModuleError::failed(format!("{module} refused to {phase}")));
        }
        Ok(())
    }
}

/// Declares a module that records its hooks and requires its hard
/// dependencies to be live when it initializes.
macro_rules! recording_module {
    ($name:ident, deps: [$($dep:ident),*], after: [$($after:ident),*]) => {
        pub struct $name(pub Behavior);

        impl Module for $name {
            fn name(&self) -> &str {
                stringify!($name)
            }

            fn dependencies(&self) -> Vec<ModuleId> {
                vec![$(ModuleId::of::<$dep>()),*]
            }

            fn load_after(&self) -> Vec<ModuleId> {
                vec![$(ModuleId::of::<$after>()),*]
            }

            fn on_initialize(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
                $( _ctx.get_module_or_err::<$dep>()?; )*
                self.0.record(HookPhase::Initialize, stringify!($name))
            }

            fn on_enable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
                self.0.record(HookPhase::Enable, stringify!($name))
            }

            fn on_disable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
                self.0.record(HookPhase::Disable, stringify!($name))
            }
        }
    };
}

recording_module!(Database, deps: [], after: []);
recording_module!(Users, deps: [Database], after: []);
recording_module!(Commands, deps: [Database], after: [Users]);
recording_module!(Profiles, deps: [Users], after: []);
recording_module!(Badges, deps: [Profiles], after: []);
recording_module!(Metrics, deps: [], after: []);
recording_module!(Orphan, deps: [Ghost], after: []);
recording_module!(Sessions, deps: [Tokens], after: []);
recording_module!(Tokens, deps: [], after: [Sessions]);

/// Never registered by any test.
pub struct Ghost;
impl Module for Ghost {}

/// Shorthand for `ModuleId::of::<M>()`.
pub fn id<M: Module>() -> ModuleId {
    ModuleId::of::<M>()
}

/// Database, Users and Commands registered in reverse dependency order.
pub fn bot_manager(journal: &Journal, config: LifecycleConfig, users: Behavior) -> ModuleManager {
    let mut manager = ModuleManager::with_config(config);
    manager
        .add_modules(Commands(Behavior::new(journal)))
        .unwrap()
        .add_modules(Users(users))
        .unwrap()
        .add_modules(Database(Behavior::new(journal)))
        .unwrap();
    manager
}
