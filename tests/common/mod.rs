//! Common test utilities
//!
//! This module is shared across all integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use assistbot::core::broadcast::Messenger;
use assistbot::core::types::Sender;
use assistbot::storage::SqliteRepository;
use assistbot::{AppError, AppResult, Config, Reply, Router, Trigger};

pub const ADMIN_ID: i64 = 1000;

/// Router over a fresh SQLite database; keep the `TempDir` alive for the test's duration
pub struct TestEnvironment {
    pub dir: TempDir,
    pub router: Router,
}

impl TestEnvironment {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepository::open(dir.path().join("bot.db")).unwrap();
        let env = HashMap::from([
            ("ADMIN_IDS", ADMIN_ID.to_string()),
            ("MANAGER_USERNAME", "test_manager".to_string()),
        ]);
        let config = Config::from_lookup(|key| env.get(key).cloned()).unwrap();
        let router = Router::new(Arc::new(repo), Arc::new(config));
        Self { dir, router }
    }

    pub async fn send(&self, sender: &Sender, trigger: Trigger) -> Reply {
        self.router.handle(sender, trigger).await.unwrap()
    }

    pub async fn text(&self, sender: &Sender, text: &str) -> Reply {
        self.send(sender, Trigger::Text(text.to_string())).await
    }

    pub fn admin() -> Sender {
        Sender::new(ADMIN_ID).with_names("Admin", None, Some("boss"))
    }
}

/// Messenger double: records deliveries and fails for chosen recipients
#[derive(Default)]
pub struct RecordingMessenger {
    pub failing: Vec<i64>,
    pub delivered: Mutex<Vec<i64>>,
    pub attempted: Mutex<Vec<i64>>,
    pub progress: Mutex<Vec<(usize, usize)>>,
}

impl RecordingMessenger {
    pub fn failing(ids: &[i64]) -> Self {
        Self {
            failing: ids.to_vec(),
            ..Self::default()
        }
    }

    pub fn attempts(&self) -> Vec<i64> {
        self.attempted.lock().unwrap().clone()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn deliver(&self, user_id: i64, _text: &str) -> AppResult<()> {
        self.attempted.lock().unwrap().push(user_id);
        if self.failing.contains(&user_id) {
            return Err(AppError::Config(format!("user {} blocked the bot", user_id)));
        }
        self.delivered.lock().unwrap().push(user_id);
        Ok(())
    }

    async fn progress(&self, processed: usize, total: usize) {
        self.progress.lock().unwrap().push((processed, total));
    }
}
