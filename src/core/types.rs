use strum::{AsRefStr, Display, EnumString};

/// Service tier a user can pick from the tariff menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Tariff {
    Basic,
    Assistant,
}

impl Tariff {
    /// Tag stored in `tariff_selections.tariff_type`
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            Tariff::Basic => "💼",
            Tariff::Assistant => "⭐",
        }
    }

    /// Short name used in the admin user list
    pub fn short_name(&self) -> &'static str {
        match self {
            Tariff::Basic => "Базовый",
            Tariff::Assistant => "Ассистент",
        }
    }

    /// Full name used in the CSV export
    pub fn display_name(&self) -> &'static str {
        match self {
            Tariff::Basic => "Базовый",
            Tariff::Assistant => "Ассистент для ассистента",
        }
    }
}

// rusqlite ToSql: write tariff as text to DB
impl rusqlite::types::ToSql for Tariff {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        Ok(rusqlite::types::ToSqlOutput::Borrowed(rusqlite::types::ValueRef::Text(
            self.as_str().as_bytes(),
        )))
    }
}

/// Tag of an action log entry.
///
/// The column is free-form text; these are the kinds the bot itself writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsRefStr, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Start,
    ViewTariffs,
    ViewAbout,
    AskQuestion,
    SelectBasic,
    SelectAssistant,
    SharedContact,
}

impl ActionKind {
    pub fn as_str(&self) -> &str {
        self.as_ref()
    }

    /// Action logged together with a tariff selection
    pub fn for_tariff(tariff: Tariff) -> Self {
        match tariff {
            Tariff::Basic => ActionKind::SelectBasic,
            Tariff::Assistant => ActionKind::SelectAssistant,
        }
    }
}

/// Authenticated identity of whoever sent a trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Sender {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
            last_name: None,
        }
    }

    pub fn with_names(mut self, first_name: &str, last_name: Option<&str>, username: Option<&str>) -> Self {
        self.first_name = Some(first_name.to_string());
        self.last_name = last_name.map(str::to_string);
        self.username = username.map(str::to_string);
        self
    }
}

impl From<&teloxide::types::User> for Sender {
    fn from(user: &teloxide::types::User) -> Self {
        Self {
            id: i64::try_from(user.id.0).unwrap_or_default(),
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()).filter(|name| !name.is_empty()),
            last_name: user.last_name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_tariff_tags() {
        assert_eq!(Tariff::from_str("basic").unwrap(), Tariff::Basic);
        assert_eq!(Tariff::from_str("assistant").unwrap(), Tariff::Assistant);
        assert!(Tariff::from_str("vip").is_err());
        assert!(Tariff::from_str("Basic").is_err());
        assert_eq!(Tariff::Assistant.to_string(), "assistant");
        assert_eq!(Tariff::Basic.as_str(), "basic");
    }

    #[test]
    fn test_tariff_labels() {
        assert_eq!(Tariff::Basic.display_name(), "Базовый");
        assert_eq!(Tariff::Assistant.display_name(), "Ассистент для ассистента");
        assert_eq!(Tariff::Assistant.short_name(), "Ассистент");
        assert_eq!(Tariff::Basic.emoji(), "💼");
    }

    #[test]
    fn test_action_kind_tags() {
        assert_eq!(ActionKind::ViewTariffs.as_str(), "view_tariffs");
        assert_eq!(ActionKind::SharedContact.to_string(), "shared_contact");
        assert_eq!(ActionKind::from_str("view_about").unwrap(), ActionKind::ViewAbout);
        assert_eq!(ActionKind::for_tariff(Tariff::Assistant), ActionKind::SelectAssistant);
    }
}
