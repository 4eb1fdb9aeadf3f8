//! Core utilities, configuration, and domain logic

pub mod broadcast;
pub mod config;
pub mod conversation;
pub mod error;
pub mod export;
pub mod logging;
pub mod metrics;
pub mod metrics_server;
pub mod stats;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use logging::{init_logger, log_startup_configuration};
pub use types::{ActionKind, Sender, Tariff};
