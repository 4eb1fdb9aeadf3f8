//! Trigger dispatch
//!
//! Every inbound update is first turned into a [`Trigger`], then [`Router::handle`] runs the
//! authorization check, persistence calls and conversation transitions and returns exactly one
//! [`Reply`]. Nothing here talks to Telegram; rendering lives in `handlers::replies`.

use std::sync::Arc;

use strum::{AsRefStr, EnumString};

use crate::core::broadcast::BroadcastJob;
use crate::core::config::{self, Config};
use crate::core::conversation::{ConversationState, ConversationStore};
use crate::core::error::AppResult;
use crate::core::export::{build_contacts_csv, export_filename};
use crate::core::metrics;
use crate::core::stats::StatsSummary;
use crate::core::types::{ActionKind, Sender, Tariff};
use crate::storage::{ContactRecord, Repository};

/// Inline button payloads (callback data)
#[derive(Debug, Clone, Copy, PartialEq, Eq, AsRefStr, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum MenuAction {
    MainMenu,
    Tariffs,
    SelectBasic,
    SelectAssistant,
    AboutAuthors,
    AskQuestion,
}

/// Everything a user can send that the bot reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Start,
    MyId,
    Stats,
    Users,
    Export,
    Broadcast,
    Cancel,
    Menu(MenuAction),
    ContactShared { phone: String },
    Text(String),
}

impl Trigger {
    /// Label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Trigger::Start => "start",
            Trigger::MyId => "myid",
            Trigger::Stats => "stats",
            Trigger::Users => "users",
            Trigger::Export => "export",
            Trigger::Broadcast => "broadcast",
            Trigger::Cancel => "cancel",
            Trigger::Menu(_) => "menu",
            Trigger::ContactShared { .. } => "contact",
            Trigger::Text(_) => "text",
        }
    }

    fn is_admin_only(&self) -> bool {
        matches!(self, Trigger::Stats | Trigger::Users | Trigger::Export | Trigger::Broadcast)
    }
}

/// Outcome of one trigger
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Welcome { first_name: Option<String> },
    MyId(i64),
    Tariffs,
    /// Ask for a phone number before showing gated content
    ContactRequest,
    /// Phone stored; `resume` is the content the user originally asked for
    ContactSaved { resume: Option<ActionKind> },
    TariffChosen(Tariff),
    AboutAuthors,
    AskQuestion,
    Stats(StatsSummary),
    UserList { rows: Vec<ContactRecord>, total: u64 },
    NoContacts,
    Export { filename: String, bytes: Vec<u8>, count: usize },
    NothingToExport,
    BroadcastPrompt { total: u64 },
    BroadcastEmptyText,
    BroadcastConfirm { text: String, total: u64 },
    /// Confirmed; the caller runs the job in the background
    BroadcastReady(BroadcastJob),
    BroadcastCancelled,
    Cancelled,
    NothingToCancel,
    Denied,
    /// No reply is sent
    Ignored,
}

pub struct Router {
    repo: Arc<dyn Repository>,
    conversations: ConversationStore,
    config: Arc<Config>,
}

impl Router {
    pub fn new(repo: Arc<dyn Repository>, config: Arc<Config>) -> Self {
        Self {
            repo,
            conversations: ConversationStore::new(config.conversation_idle_timeout),
            config,
        }
    }

    pub fn repo(&self) -> &Arc<dyn Repository> {
        &self.repo
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub async fn handle(&self, sender: &Sender, trigger: Trigger) -> AppResult<Reply> {
        log::debug!("Trigger {:?} from user {}", trigger, sender.id);
        metrics::record_trigger(trigger.kind());

        if trigger.is_admin_only() && !self.config.is_admin(sender.id) {
            log::warn!("User {} tried admin trigger /{} without permission", sender.id, trigger.kind());
            return Ok(Reply::Denied);
        }

        match trigger {
            Trigger::Start => {
                self.repo.upsert_user(sender).await?;
                self.repo.log_action(sender.id, ActionKind::Start, None).await?;
                Ok(Reply::Welcome {
                    first_name: sender.first_name.clone(),
                })
            }
            Trigger::MyId => Ok(Reply::MyId(sender.id)),
            Trigger::Stats => {
                let now = chrono::Local::now().naive_local();
                Ok(Reply::Stats(StatsSummary::collect(self.repo.as_ref(), now).await?))
            }
            Trigger::Users => self.list_users().await,
            Trigger::Export => self.export().await,
            Trigger::Broadcast => {
                let total = self.repo.count_users().await?;
                self.conversations
                    .set(sender.id, ConversationState::AwaitingBroadcastText)
                    .await;
                Ok(Reply::BroadcastPrompt { total })
            }
            Trigger::Cancel => Ok(match self.conversations.clear(sender.id).await {
                ConversationState::Idle => Reply::NothingToCancel,
                _ => Reply::Cancelled,
            }),
            Trigger::Menu(action) => self.menu(sender, action).await,
            Trigger::ContactShared { phone } => self.contact_shared(sender, &phone).await,
            Trigger::Text(text) => self.text(sender, text).await,
        }
    }

    async fn menu(&self, sender: &Sender, action: MenuAction) -> AppResult<Reply> {
        match action {
            MenuAction::MainMenu => Ok(Reply::Welcome {
                first_name: sender.first_name.clone(),
            }),
            MenuAction::Tariffs => {
                if self.repo.get_phone_number(sender.id).await?.is_none() {
                    self.conversations
                        .set(
                            sender.id,
                            ConversationState::AwaitingContact {
                                purpose: ActionKind::ViewTariffs,
                            },
                        )
                        .await;
                    return Ok(Reply::ContactRequest);
                }
                self.repo.log_action(sender.id, ActionKind::ViewTariffs, None).await?;
                Ok(Reply::Tariffs)
            }
            MenuAction::SelectBasic => self.select_tariff(sender, Tariff::Basic).await,
            MenuAction::SelectAssistant => self.select_tariff(sender, Tariff::Assistant).await,
            MenuAction::AboutAuthors => {
                self.repo.log_action(sender.id, ActionKind::ViewAbout, None).await?;
                Ok(Reply::AboutAuthors)
            }
            MenuAction::AskQuestion => {
                self.repo.log_action(sender.id, ActionKind::AskQuestion, None).await?;
                Ok(Reply::AskQuestion)
            }
        }
    }

    async fn select_tariff(&self, sender: &Sender, tariff: Tariff) -> AppResult<Reply> {
        self.repo
            .log_action(sender.id, ActionKind::for_tariff(tariff), None)
            .await?;
        self.repo.log_tariff_selection(sender.id, tariff).await?;
        metrics::record_tariff_selection(tariff.as_str());
        log::info!("User {} selected tariff {}", sender.id, tariff);
        Ok(Reply::TariffChosen(tariff))
    }

    async fn contact_shared(&self, sender: &Sender, phone: &str) -> AppResult<Reply> {
        self.repo.upsert_user(sender).await?;
        self.repo.set_phone_number(sender.id, phone).await?;
        self.repo
            .log_action(sender.id, ActionKind::SharedContact, Some(phone))
            .await?;
        log::info!("User {} shared contact", sender.id);

        match self.conversations.get(sender.id).await {
            ConversationState::AwaitingContact { purpose } => {
                self.repo.log_action(sender.id, purpose, None).await?;
                self.conversations.set(sender.id, ConversationState::Idle).await;
                Ok(Reply::ContactSaved { resume: Some(purpose) })
            }
            _ => Ok(Reply::ContactSaved { resume: None }),
        }
    }

    async fn text(&self, sender: &Sender, text: String) -> AppResult<Reply> {
        match self.conversations.get(sender.id).await {
            ConversationState::Idle => Ok(Reply::Ignored),
            ConversationState::AwaitingContact { .. } => Ok(Reply::ContactRequest),
            ConversationState::AwaitingBroadcastText => {
                if !self.config.is_admin(sender.id) {
                    return Ok(Reply::Ignored);
                }
                if text.trim().is_empty() {
                    return Ok(Reply::BroadcastEmptyText);
                }
                let total = self.repo.count_users().await?;
                self.conversations
                    .set(
                        sender.id,
                        ConversationState::AwaitingBroadcastConfirmation {
                            pending_text: text.clone(),
                        },
                    )
                    .await;
                Ok(Reply::BroadcastConfirm { text, total })
            }
            ConversationState::AwaitingBroadcastConfirmation { pending_text } => {
                if !self.config.is_admin(sender.id) {
                    return Ok(Reply::Ignored);
                }
                if !is_affirmative(&text) {
                    self.conversations.set(sender.id, ConversationState::Idle).await;
                    log::info!("Admin {} declined the broadcast", sender.id);
                    return Ok(Reply::BroadcastCancelled);
                }
                let recipients = self.repo.all_user_ids().await?;
                self.conversations.set(sender.id, ConversationState::Idle).await;
                log::info!("Admin {} confirmed a broadcast to {} users", sender.id, recipients.len());
                Ok(Reply::BroadcastReady(BroadcastJob {
                    text: pending_text,
                    recipients,
                }))
            }
        }
    }

    async fn list_users(&self) -> AppResult<Reply> {
        let rows = self
            .repo
            .users_with_contacts(Some(config::admin::USERS_PAGE_SIZE))
            .await?;
        if rows.is_empty() {
            return Ok(Reply::NoContacts);
        }
        let total = self.repo.count_users_with_phone().await?;
        Ok(Reply::UserList { rows, total })
    }

    async fn export(&self) -> AppResult<Reply> {
        let rows = self.repo.users_with_contacts(None).await?;
        if rows.is_empty() {
            return Ok(Reply::NothingToExport);
        }
        let filename = export_filename(chrono::Local::now().naive_local());
        Ok(Reply::Export {
            filename,
            bytes: build_contacts_csv(&rows),
            count: rows.len(),
        })
    }
}

/// Case-insensitive match against the confirmation words
pub fn is_affirmative(text: &str) -> bool {
    let answer = text.trim().to_lowercase();
    config::broadcast::AFFIRMATIVE_WORDS.contains(&answer.as_str())
}
