//! Assistbot - Telegram sales-funnel bot
//!
//! The bot walks users through a tariff menu, collects contacts, keeps lightweight usage
//! analytics and gives administrators statistics, CSV export and broadcasts.
//!
//! # Module Structure
//!
//! - `core`: Configuration, errors, logging, conversation state, broadcast engine, metrics
//! - `storage`: Repository contract with SQLite and PostgreSQL backends
//! - `telegram`: Trigger router and Telegram handlers
//! - `cli`: Command line interface

pub mod cli;
pub mod core;
pub mod storage;
pub mod telegram;

// Re-export commonly used types for convenience
pub use core::{config, AppError, AppResult, Config};
pub use storage::{open_repository, Repository};
pub use telegram::{Reply, Router, Trigger};
