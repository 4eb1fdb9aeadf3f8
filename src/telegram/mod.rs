//! Telegram bot integration and handlers

pub mod bot;
pub mod handlers;
pub mod keyboards;
pub mod router;
pub mod texts;

// Re-exports for convenience
pub use bot::{create_bot, setup_bot_commands, skip_pending_updates, Command};
pub use handlers::{schema, HandlerDeps, HandlerError};
pub use router::{MenuAction, Reply, Router, Trigger};
