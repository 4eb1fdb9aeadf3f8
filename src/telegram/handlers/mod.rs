//! Telegram bot handler tree configuration
//!
//! Updates are converted into router triggers here and the router's replies are rendered
//! back into Telegram requests.

mod broadcast;
mod replies;
mod schema;
mod types;

pub use broadcast::{spawn_broadcast, TelegramMessenger};
pub use replies::render;
pub use schema::schema;
pub use types::{message_sender, HandlerDeps, HandlerError, Origin};
