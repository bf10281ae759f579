//! Example bot binary.
//!
//! Starts every module, answers a few commands, keeps running for a while and
//! shuts down in reverse order.
//!
//! # Usage
//!
//! ```bash
//! MODULITH_CONFIG_DIR=./configs MODULITH_RUN_SECONDS=5 modulith-bot
//! ```
//!
//! Both variables can also be set in a `.env` file.

use modulith_example::{BotModules, CommandsModule, Invoker};
use modulith_system::manager::ModuleManager;
use modulith_system::module::ModuleGroup;
use std::path::PathBuf;
use std::time::Duration;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let config_dir = std::env::var("MODULITH_CONFIG_DIR")
        .map_or_else(|_| PathBuf::from("./configs"), PathBuf::from);
    let run_seconds = std::env::var("MODULITH_RUN_SECONDS")
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(5);

    let mut manager = ModuleManager::new();
    if let Err(e) = manager.add_modules(BotModules { config_dir }.build()) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    match manager.start_all() {
        Ok(report) if !report.is_complete() => {
            tracing::warn!(
                failed = report.failed.len(),
                skipped = report.skipped.len(),
                "bot started with missing modules"
            );
        }
        Ok(_) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    if let Ok(commands) = manager.get_module_or_err::<CommandsModule>() {
        let invoker = Invoker { id: 1, name: "ada" };
        for command in ["ping", "profile", "profile", "dance"] {
            match commands.dispatch(command, invoker) {
                Ok(reply) => tracing::info!(command, reply, "command answered"),
                Err(e) => tracing::warn!(command, error = %e, "command failed"),
            }
        }
    }

    tokio::time::sleep(Duration::from_secs(run_seconds)).await;

    let report = manager.stop_all();
    for failure in &report.failures {
        tracing::error!(error = %failure, "module failed to stop");
    }
}
