//! Configuration read from the real process environment
//!
//! These tests mutate environment variables, so they run serially.

use serial_test::serial;

use assistbot::core::config::DatabaseConfig;
use assistbot::Config;

const KEYS: [&str; 9] = [
    "BOT_TOKEN",
    "TELOXIDE_TOKEN",
    "ADMIN_IDS",
    "ADMIN_ID",
    "DATABASE_URL",
    "POSTGRES_HOST",
    "DATABASE_PATH",
    "DEBUG",
    "CONVERSATION_IDLE_TIMEOUT_SECS",
];

fn clear_env() {
    for key in KEYS {
        std::env::remove_var(key);
    }
}

#[test]
#[serial]
fn test_from_env_sqlite_defaults() {
    clear_env();
    std::env::set_var("DATABASE_PATH", "/tmp/assistbot-test/bot.db");
    std::env::set_var("ADMIN_IDS", "1, 2,bad");

    let config = Config::from_env().unwrap();
    assert_eq!(config.admin_ids, vec![1, 2]);
    assert!(config.is_admin(2));
    assert!(!config.is_admin(3));
    assert!(!config.debug);
    assert!(config.require_bot_token().is_err());
    match &config.database {
        DatabaseConfig::Sqlite { path } => assert!(path.ends_with("bot.db")),
        other => panic!("unexpected backend: {:?}", other.kind()),
    }

    clear_env();
}

#[test]
#[serial]
fn test_from_env_postgres_url_wins() {
    clear_env();
    std::env::set_var("DATABASE_URL", "postgresql://bot:pw@localhost/bot");
    std::env::set_var("DATABASE_PATH", "/tmp/ignored.db");
    std::env::set_var("DEBUG", "True");
    std::env::set_var("BOT_TOKEN", "123:abc");

    let config = Config::from_env().unwrap();
    assert_eq!(config.database.kind(), "PostgreSQL");
    assert!(config.debug);
    assert_eq!(config.require_bot_token().unwrap(), "123:abc");
    assert!(config.admin_ids.is_empty());

    clear_env();
}
