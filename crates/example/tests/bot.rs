use modulith_core_modules::{AppInfoModule, ConfigModule, TracingModule};
use modulith_example::{
    BotListConfig, BotListModule, BotModules, CommandsModule, DatabaseModule, Invoker, UsersModule,
};
use modulith_system::manager::ModuleManager;
use modulith_system::module::{ModuleGroup, ModuleId, ModuleState};
use std::path::Path;
use std::time::Duration;

fn bot(config_dir: &Path) -> ModuleManager {
    let mut manager = ModuleManager::new();
    manager
        .add_modules(
            BotModules {
                config_dir: config_dir.to_path_buf(),
            }
            .build(),
        )
        .unwrap();
    manager
}

fn write_bot_list_config(config_dir: &Path, config: &BotListConfig) {
    let path =
        ConfigModule::new(config_dir).config_path::<BotListConfig>(&BotListModule::default());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, serde_json::to_string_pretty(config).unwrap()).unwrap();
}

#[tokio::test]
async fn bot_starts_in_dependency_order() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = bot(dir.path());

    let report = manager.start_all().unwrap();
    assert!(report.is_complete());
    assert_eq!(
        report.enabled,
        vec![
            ModuleId::of::<AppInfoModule>(),
            ModuleId::of::<TracingModule>(),
            ModuleId::of::<ConfigModule>(),
            ModuleId::of::<DatabaseModule>(),
            ModuleId::of::<UsersModule>(),
            ModuleId::of::<CommandsModule>(),
            ModuleId::of::<BotListModule>(),
        ]
    );

    let written = dir.path().join("botlist").join("botlistconfig.json");
    assert!(written.exists());

    let report = manager.stop_all();
    assert!(report.is_clean());
    assert_eq!(report.disabled.first(), Some(&ModuleId::of::<BotListModule>()));
    assert_eq!(report.disabled.last(), Some(&ModuleId::of::<AppInfoModule>()));
    assert!(
        manager
            .states()
            .iter()
            .all(|(_, state)| *state == ModuleState::Disabled)
    );
}

#[tokio::test]
async fn profile_command_counts_usage() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = bot(dir.path());
    manager.start_all().unwrap();

    let commands = manager.get_module_or_err::<CommandsModule>().unwrap();
    let ada = Invoker { id: 7, name: "ada" };

    assert_eq!(commands.dispatch("ping", ada).unwrap(), "pong");
    assert_eq!(
        commands.dispatch("profile", ada).unwrap(),
        "ada has used 1 commands"
    );
    assert_eq!(
        commands.dispatch("profile", ada).unwrap(),
        "ada has used 2 commands"
    );

    let users = manager.get_module_or_err::<UsersModule>().unwrap();
    assert_eq!(users.find(7).unwrap().unwrap().commands_used, 2);

    manager.stop_all();
    assert!(commands.names().is_empty());
}

#[tokio::test]
async fn bot_list_posts_while_enabled() {
    let dir = tempfile::tempdir().unwrap();
    write_bot_list_config(
        dir.path(),
        &BotListConfig {
            token: "secret".to_owned(),
            interval_seconds: 1,
        },
    );

    let mut manager = bot(dir.path());
    manager.start_all().unwrap();

    let bot_list = manager.get_module_or_err::<BotListModule>().unwrap();
    assert!(bot_list.is_updating());

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(bot_list.posts() >= 1);

    manager.stop_all();
    assert!(!bot_list.is_updating());
}

#[tokio::test]
async fn bot_list_without_token_stays_idle() {
    let dir = tempfile::tempdir().unwrap();
    let mut manager = bot(dir.path());
    manager.start_all().unwrap();

    let bot_list = manager.get_module_or_err::<BotListModule>().unwrap();
    assert!(!bot_list.is_updating());
    assert_eq!(bot_list.posts(), 0);

    manager.stop_all();
}

#[tokio::test]
async fn zero_interval_aborts_startup() {
    let dir = tempfile::tempdir().unwrap();
    write_bot_list_config(
        dir.path(),
        &BotListConfig {
            token: String::new(),
            interval_seconds: 0,
        },
    );

    let mut manager = bot(dir.path());
    let error = manager.start_all().unwrap_err();

    assert!(error.to_string().contains("interval_seconds must be positive"));
    assert!(!manager.is_running());
    assert_eq!(
        manager.state(ModuleId::of::<UsersModule>()),
        Some(ModuleState::Disabled)
    );
}

#[tokio::test]
async fn older_bot_list_config_is_upgraded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("botlist").join("botlistconfig.json");
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, r#"{ "token": "" }"#).unwrap();

    let mut manager = bot(dir.path());
    assert!(manager.start_all().unwrap().is_complete());

    let stored: BotListConfig =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(stored, BotListConfig::default());

    manager.stop_all();
}
