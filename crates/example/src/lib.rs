//! Example chat bot assembled from Modulith modules.
//!
//! The bot is made of four application modules on top of
//! [`DefaultModules`]:
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │ ConfigModule │◀────│ BotListModule│
//! └──────────────┘     └──────┬───────┘
//!                             ┆ load after
//! ┌──────────────┐     ┌──────▼───────┐
//! │DatabaseModule│◀────│ UsersModule  │
//! └──────▲───────┘     └──────▲───────┘
//!        │                    ┆ load after
//!        │             ┌──────┴───────┐
//!        └─────────────│CommandsModule│
//!                      └──────────────┘
//! ```
//!
//! Solid arrows are hard dependencies, dotted arrows load-after hints.

mod bot_list;
mod commands;
mod database;
mod users;

pub use bot_list::{BotListConfig, BotListModule};
pub use commands::{CommandError, CommandsModule, Invoker};
pub use database::{DatabaseError, DatabaseModule};
pub use users::{User, UserError, UsersModule};

use modulith_core_modules::{AppInfoModule, ConfigModule, DefaultModules, TracingModule};
use modulith_system::module::{ModuleGroup, ModuleGroupBuilder};
use std::path::PathBuf;

/// Every module of the bot, with configuration files under `config_dir`.
pub struct BotModules {
    /// Directory for per-module configuration files.
    pub config_dir: PathBuf,
}

impl ModuleGroup for BotModules {
    fn build(self) -> ModuleGroupBuilder {
        DefaultModules
            .build()
            .disable::<AppInfoModule>()
            .add_before::<_, TracingModule>(AppInfoModule::for_app(
                "modulith-bot",
                env!("CARGO_PKG_VERSION"),
            ))
            .disable::<ConfigModule>()
            .add(ConfigModule::new(self.config_dir))
            .add(CommandsModule::default())
            .add(BotListModule::default())
            .add(UsersModule::default())
            .add(DatabaseModule::default())
    }
}
