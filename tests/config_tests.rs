use chaos_engine::config::Config;
use serial_test::serial;
use std::env;

mod common;

const VARS: [&str; 7] = [
    "DATABASE_URL",
    "DB_MAX_CONNECTIONS",
    "HOST",
    "PORT",
    "ENVIRONMENT",
    "APP_SECRET",
    "NOTIFY_WEBHOOK_URL",
];

fn snapshot() -> Vec<(&'static str, Option<String>)> {
    VARS.iter().map(|k| (*k, env::var(k).ok())).collect()
}

fn restore(original: Vec<(&'static str, Option<String>)>) {
    unsafe {
        for (key, value) in original {
            match value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn config(environment: &str, app_secret: Option<&str>) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        db_max_connections: 1,
        host: "192.168.1.1".to_string(),
        port: 9000,
        environment: environment.to_string(),
        app_secret: app_secret.map(str::to_string),
        notify_webhook_url: None,
    }
}

#[test]
#[serial]
fn test_config_defaults() {
    common::setup_test_env();
    let original = snapshot();
    for key in VARS {
        unsafe { env::remove_var(key) };
    }

    let config = Config::from_env_only().unwrap();

    assert_eq!(config.database_url, "sqlite:./chaos_engine.db");
    assert_eq!(config.db_max_connections, 5);
    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 3000);
    assert_eq!(config.environment, "development");
    assert_eq!(config.app_secret, None);
    assert_eq!(config.notify_webhook_url, None);

    restore(original);
}

#[test]
#[serial]
fn test_config_custom_values() {
    common::setup_test_env();
    let original = snapshot();

    unsafe {
        env::set_var("DATABASE_URL", "postgres://localhost/chaos");
        env::set_var("DB_MAX_CONNECTIONS", "12");
        env::set_var("HOST", "0.0.0.0");
        env::set_var("PORT", "8088");
        env::set_var("ENVIRONMENT", "production");
        env::set_var("APP_SECRET", "s3cret");
        env::set_var("NOTIFY_WEBHOOK_URL", "http://chat.local/hooks/abc");
    }

    let config = Config::from_env_only().unwrap();

    assert_eq!(config.database_url, "postgres://localhost/chaos");
    assert_eq!(config.db_max_connections, 12);
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.port, 8088);
    assert!(config.is_production());
    assert_eq!(config.app_secret.as_deref(), Some("s3cret"));
    assert_eq!(
        config.notify_webhook_url.as_deref(),
        Some("http://chat.local/hooks/abc")
    );

    restore(original);
}

#[test]
#[serial]
fn test_unparseable_numbers_fall_back_to_defaults() {
    let original = snapshot();

    unsafe {
        env::set_var("PORT", "not-a-port");
        env::set_var("DB_MAX_CONNECTIONS", "-3");
        env::set_var("APP_SECRET", "   ");
    }

    let config = Config::from_env_only().unwrap();
    assert_eq!(config.port, 3000);
    assert_eq!(config.db_max_connections, 5);
    assert!(config.is_local_mode(), "blank secret means local mode");

    restore(original);
}

#[test]
fn test_config_environment_detection() {
    assert!(config("production", None).is_production());
    assert!(!config("production", None).is_development());
    assert!(config("development", None).is_development());
}

#[test]
fn test_local_mode_follows_app_secret() {
    assert!(config("development", None).is_local_mode());
    assert!(!config("development", Some("s3cret")).is_local_mode());
}

#[test]
fn test_server_address_formatting() {
    assert_eq!(config("test", None).server_address(), "192.168.1.1:9000");
}
