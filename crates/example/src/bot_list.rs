//! Periodic statistics updates for a public bot list.
//!
//! While enabled, [`BotListModule`] posts the number of known users on a
//! fixed interval. The first post happens right after enabling.

use crate::users::UsersModule;
use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use modulith_core_modules::ConfigModule;
use modulith_system::error::ModuleError;
use modulith_system::manager::ModuleContext;
use modulith_system::module::{Module, ModuleId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Settings stored in `<config dir>/botlist/botlistconfig.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotListConfig {
    /// API token. Updates are disabled while empty.
    pub token: String,
    /// Seconds between two updates.
    pub interval_seconds: u64,
}

impl Default for BotListConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            interval_seconds: 30 * 60,
        }
    }
}

/// Posts user statistics while enabled.
///
/// Must be enabled from within a Tokio runtime.
#[derive(Debug, Default)]
pub struct BotListModule {
    config: Mutex<Option<BotListConfig>>,
    task: Mutex<Option<JoinHandle<()>>>,
    posts: Arc<AtomicU64>,
}

impl BotListModule {
    /// Number of updates posted so far.
    #[must_use]
    pub fn posts(&self) -> u64 {
        self.posts.load(Ordering::Relaxed)
    }

    /// Returns true while the update task is scheduled.
    #[must_use]
    pub fn is_updating(&self) -> bool {
        self.task
            .lock()
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Module for BotListModule {
    fn name(&self) -> &str {
        "BotList"
    }

    fn dependencies(&self) -> Vec<ModuleId> {
        vec![ModuleId::of::<ConfigModule>()]
    }

    fn load_after(&self) -> Vec<ModuleId> {
        vec![ModuleId::of::<UsersModule>()]
    }

    fn on_initialize(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        let configs = ctx.get_module_or_err::<ConfigModule>()?;
        let config = configs
            .register_and_get_config(self, BotListConfig::default())
            .map_err(ModuleError::other)?;

        if config.interval_seconds == 0 {
            return Err(ModuleError::failed("interval_seconds must be positive"));
        }
        *self.config.lock() = Some(config);
        Ok(())
    }

    fn on_enable(&self, ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        let Some(config) = self.config.lock().clone() else {
            return Err(ModuleError::failed("enabled before initialize"));
        };
        if config.token.is_empty() {
            tracing::info!("no bot list token configured, updates disabled");
            return Ok(());
        }

        let runtime = Handle::try_current().map_err(ModuleError::other)?;
        let users = ctx.get_module::<UsersModule>();
        let posts = Arc::clone(&self.posts);
        let period = Duration::from_secs(config.interval_seconds);

        let task = runtime.spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let user_count = users
                    .as_ref()
                    .and_then(|users| users.count().ok())
                    .unwrap_or_default();
                posts.fetch_add(1, Ordering::Relaxed);
                tracing::info!(users = user_count, "posted bot list statistics");
            }
        });

        *self.task.lock() = Some(task);
        tracing::info!(?period, "bot list updates scheduled");
        Ok(())
    }

    fn on_disable(&self, _ctx: &ModuleContext<'_>) -> Result<(), ModuleError> {
        if let Some(task) = self.task.lock().take() {
            task.abort();
            tracing::info!(posts = self.posts(), "bot list updates cancelled");
        }
        Ok(())
    }
}
