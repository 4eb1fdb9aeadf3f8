//! Per-user conversation state
//!
//! A missing entry is equivalent to [`ConversationState::Idle`]. Entries expire after a
//! configurable period of inactivity so abandoned flows do not linger forever.

use std::time::Duration;

use moka::future::Cache;

use crate::core::config;
use crate::core::metrics;
use crate::core::types::ActionKind;

/// Where a multi-step interaction currently stands for one user
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConversationState {
    #[default]
    Idle,
    /// Waiting for a shared contact; `purpose` is resumed once it arrives
    AwaitingContact { purpose: ActionKind },
    /// Admin started /broadcast and the next text is the message body
    AwaitingBroadcastText,
    /// Admin must confirm sending `pending_text`
    AwaitingBroadcastConfirmation { pending_text: String },
}

impl ConversationState {
    pub fn is_idle(&self) -> bool {
        matches!(self, ConversationState::Idle)
    }
}

/// Keyed store `user id -> state` with idle expiry.
///
/// Setting a state replaces whatever was pending before. Reads and writes for the same
/// user are not serialized against each other (last write wins).
#[derive(Clone)]
pub struct ConversationStore {
    states: Cache<i64, ConversationState>,
}

impl ConversationStore {
    pub fn new(idle_timeout: Duration) -> Self {
        let states = Cache::builder()
            .max_capacity(config::conversation::MAX_TRACKED)
            .time_to_idle(idle_timeout)
            .build();
        Self { states }
    }

    /// Current state; `Idle` when nothing is stored or the entry expired
    pub async fn get(&self, user_id: i64) -> ConversationState {
        self.states.get(&user_id).await.unwrap_or_default()
    }

    pub async fn set(&self, user_id: i64, state: ConversationState) {
        if state.is_idle() {
            self.states.invalidate(&user_id).await;
        } else {
            self.states.insert(user_id, state).await;
        }
        metrics::set_active_conversations(self.states.entry_count());
    }

    /// Resets the user to `Idle` and returns the state that was active
    pub async fn clear(&self, user_id: i64) -> ConversationState {
        let previous = self.states.remove(&user_id).await.unwrap_or_default();
        metrics::set_active_conversations(self.states.entry_count());
        previous
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new(config::conversation::idle_timeout())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_entry_is_idle() {
        let store = ConversationStore::default();
        assert_eq!(store.get(1).await, ConversationState::Idle);
    }

    #[tokio::test]
    async fn test_new_state_replaces_pending_data() {
        let store = ConversationStore::default();
        store
            .set(
                7,
                ConversationState::AwaitingBroadcastConfirmation {
                    pending_text: "old".to_string(),
                },
            )
            .await;
        store.set(7, ConversationState::AwaitingBroadcastText).await;

        assert_eq!(store.get(7).await, ConversationState::AwaitingBroadcastText);
    }

    #[tokio::test]
    async fn test_clear_returns_previous_state() {
        let store = ConversationStore::default();
        let pending = ConversationState::AwaitingContact {
            purpose: ActionKind::ViewTariffs,
        };
        store.set(3, pending.clone()).await;

        assert_eq!(store.clear(3).await, pending);
        assert_eq!(store.clear(3).await, ConversationState::Idle);
        assert!(store.get(3).await.is_idle());
    }

    #[tokio::test]
    async fn test_states_are_isolated_per_user() {
        let store = ConversationStore::default();
        store.set(1, ConversationState::AwaitingBroadcastText).await;

        assert!(store.get(2).await.is_idle());
        assert_eq!(store.get(1).await, ConversationState::AwaitingBroadcastText);
    }

    #[tokio::test]
    async fn test_idle_entries_expire() {
        let store = ConversationStore::new(Duration::from_millis(100));
        store.set(5, ConversationState::AwaitingBroadcastText).await;

        tokio::time::sleep(Duration::from_millis(300)).await;

        assert!(store.get(5).await.is_idle());
    }
}
