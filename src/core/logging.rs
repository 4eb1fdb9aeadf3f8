//! Logging initialization and startup diagnostics
//!
//! This module provides:
//! - Logger initialization (console + file)
//! - A startup summary of the effective configuration

use anyhow::Result;
use simplelog::*;
use std::fs::File;

use crate::core::config::{self, DatabaseConfig, PostgresConfig};

/// Initialize logger for both console and file output
///
/// # Arguments
/// * `log_file_path` - Path to the log file
/// * `debug` - Lower the level from `Info` to `Debug`
pub fn init_logger(log_file_path: &str, debug: bool) -> Result<()> {
    let log_file = File::create(log_file_path).map_err(|e| anyhow::anyhow!("Failed to create log file: {}", e))?;
    let level = level_for(debug);

    CombinedLogger::init(vec![
        TermLogger::new(level, Config::default(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(level, Config::default(), log_file),
    ])
    .map_err(|e| anyhow::anyhow!("Failed to initialize logger: {}", e))?;

    Ok(())
}

fn level_for(debug: bool) -> LevelFilter {
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Logs the effective configuration at startup (secrets are never printed)
pub fn log_startup_configuration(config: &config::Config) {
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    log::info!("🔧 Configuration");
    log::info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    match &config.database {
        DatabaseConfig::Sqlite { path } => log::info!("✅ Database: SQLite at {}", path.display()),
        DatabaseConfig::Postgres(PostgresConfig::Url(_)) => log::info!("✅ Database: PostgreSQL (DATABASE_URL)"),
        DatabaseConfig::Postgres(PostgresConfig::Params { host, port, database, .. }) => {
            log::info!("✅ Database: PostgreSQL {}:{}/{}", host, port, database)
        }
    }

    if config.admin_ids.is_empty() {
        log::warn!("⚠️  ADMIN_ID: not set, admin commands are disabled");
        log::warn!("   Send /myid to the bot and put the number into .env");
    } else {
        log::info!("✅ Administrators: {}", config.admin_ids.len());
    }

    log::info!("✅ Manager: @{}", config.manager_username);
    log::info!(
        "✅ Conversation idle timeout: {}s",
        config.conversation_idle_timeout.as_secs()
    );

    if let Some(ref url) = config.bot_api_url {
        log::info!("✅ Bot API server: {}", url);
    }

    if config.metrics_enabled {
        log::info!("✅ Metrics: http://0.0.0.0:{}/metrics", config.metrics_port);
    }

    if config.debug {
        log::info!("🐛 Debug logging enabled");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_follows_debug_flag() {
        assert_eq!(level_for(true), LevelFilter::Debug);
        assert_eq!(level_for(false), LevelFilter::Info);
    }

    #[test]
    fn test_init_logger_rejects_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("app.log");

        let result = init_logger(path.to_str().unwrap(), false);

        assert!(result.is_err());
    }
}
