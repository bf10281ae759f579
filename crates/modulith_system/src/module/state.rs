//! Per-module lifecycle state.

use core::fmt;

/// Where a module is in its lifecycle.
///
/// States move forward only:
///
/// ```text
/// Registered ──► Initialized ──► Enabled ──► Disabled
///      │              │             │
///      └──────────────┴─────────────┴──► Failed
/// ```
///
/// `Failed` and `Disabled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModuleState {
    /// Known to the registry; no hook has run yet.
    #[default]
    Registered,
    /// `on_initialize` succeeded.
    Initialized,
    /// `on_enable` succeeded; the module is active.
    Enabled,
    /// `on_disable` succeeded during shutdown.
    Disabled,
    /// A hook failed.
    Failed,
}

impl ModuleState {
    /// Returns true if moving from `self` to `next` is a legal transition.
    #[must_use]
    pub fn can_transition_to(self, next: ModuleState) -> bool {
        use ModuleState::{Disabled, Enabled, Failed, Initialized, Registered};

        matches!(
            (self, next),
            (Registered, Initialized | Failed)
                | (Initialized, Enabled | Failed)
                | (Enabled, Disabled | Failed)
        )
    }

    /// Returns true if lookups may hand out the module in this state.
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, ModuleState::Initialized | ModuleState::Enabled)
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, ModuleState::Disabled | ModuleState::Failed)
    }

    /// Lowercase name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleState::Registered => "registered",
            ModuleState::Initialized => "initialized",
            ModuleState::Enabled => "enabled",
            ModuleState::Disabled => "disabled",
            ModuleState::Failed => "failed",
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::ModuleState::{self, *};

    const ALL: [ModuleState; 5] = [Registered, Initialized, Enabled, Disabled, Failed];

    #[test]
    fn default_is_registered() {
        assert_eq!(ModuleState::default(), Registered);
    }

    #[test]
    fn legal_transitions() {
        let legal = [
            (Registered, Initialized),
            (Registered, Failed),
            (Initialized, Enabled),
            (Initialized, Failed),
            (Enabled, Disabled),
            (Enabled, Failed),
        ];

        for from in ALL {
            for to in ALL {
                assert_eq!(
                    from.can_transition_to(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn cannot_enable_before_initialize() {
        assert!(!Registered.can_transition_to(Enabled));
    }

    #[test]
    fn cannot_disable_unless_enabled() {
        assert!(!Registered.can_transition_to(Disabled));
        assert!(!Initialized.can_transition_to(Disabled));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for from in [Disabled, Failed] {
            assert!(from.is_terminal());
            assert!(ALL.iter().all(|to| !from.can_transition_to(*to)));
        }
    }

    #[test]
    fn only_initialized_and_enabled_are_live() {
        let live: Vec<_> = ALL.into_iter().filter(|s| s.is_live()).collect();
        assert_eq!(live, vec![Initialized, Enabled]);
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Enabled.to_string(), "enabled");
    }
}
