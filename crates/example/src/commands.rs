//! Chat commands.
//!
//! Commands are looked up by name only. Profile commands are registered when
//! [`UsersModule`] is part of the application.

use crate::database::DatabaseModule;
use crate::users::{UserError, UsersModule};
use modulith_system::error::ModuleError;
use modulith_system::manager::ModuleContext;
use modulith_system::module::{Module, ModuleId};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Error returned by [`CommandsModule::dispatch`].
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// No command with that name is registered.
    #[error("unknown command: {0}")]
    Unknown(String),

    /// The command failed while accessing users.
    #[error(transparent)]
    Users(#[from] UserError),
}

/// Who ran a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invoker<'a> {
    /// Platform user id.
    pub id: u64,
    /// Display name.
    pub name: &'a str,
}

type Handler = Box<dyn Fn(Invoker<'_>) -> Result<String, CommandError> + Send + Sync>;

/// Registry and dispatcher of chat commands.
#[derive(Default)]
pub struct CommandsModule {
    handlers: RwLock<BTreeMap<&'static str, Handler>>,
}

impl core::fmt::Debug for CommandsModule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CommandsModule")
            .field("commands", &self.names())
            .finish()
    }
}

impl CommandsModule {
    /// Registers a command, replacing any command with the same name.
    pub fn register<F>(&self, name: &'static str, handler: F)
    where
        F: Fn(Invoker<'_>) -> Result<String, CommandError> + Send + Sync + 'static,
    {
        self.handlers.write().insert(name, Box::new(handler));
    }

    /// Names of the registered commands, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.handlers.read().keys().copied().collect()
    }

    /// Runs a command and returns its reply.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Unknown`] if `name` is not registered, or the
    /// handler's own error.
    pub fn dispatch(&self, name: &str, invoker: Invoker<'_>) -> Result<String, CommandError> {
        let handlers = self.handlers.read();
        let handler = handlers
            .get(name)
            .ok_or_else(|| CommandError::Unknown(name.to_owned()))?;

        tracing::debug!(command = name, user = invoker.id, "dispatching command");
        handler(invoker)
    }

    fn register_profile_commands(&self, users: Arc<UsersModule>) {
        self.register("profile", move |invoker| {
            let user = users.record_command(invoker.id, invoker.name)?;
            Ok(format!(
                "{} has used {} commands",
                user.name, user.commands_used
            ))
        });
    }
}

impl Module for CommandsModule {
    fn dependencies(&self) -> Vec<ModuleId> {
        vec![ModuleId::of::<DatabaseModule>()]
    }

    fn load_after(&self) -> Vec<ModuleId> {
        vec![ModuleId::of::<UsersModule>()]
    }

    fn on_initialize(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        self.register("ping", |_| Ok("pong".to_owned()));

        if let Some(users) = ctx.get_module::<UsersModule>() {
            self.register_profile_commands(users);
        }
        Ok(())
    }

    fn on_enable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        tracing::info!(commands = ?self.names(), "commands ready");
        Ok(())
    }

    fn on_disable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        self.handlers.write().clear();
        Ok(())
    }
}
