use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use indoc::formatdoc;

use crate::core::error::AppResult;
use crate::core::export::{build_contacts_csv, export_filename};
use crate::core::stats::StatsSummary;
use crate::storage::Repository;

#[derive(Parser)]
#[command(name = "assistbot")]
#[command(author, version, about = "Telegram sales-funnel bot with contact collection and admin console", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run the bot (long polling)
    Run,

    /// Create or upgrade the database schema and exit
    Migrate,

    /// Print usage statistics
    Stats {
        /// Print as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Export users with contacts to a CSV file
    Export {
        /// Output file (default: contacts_<timestamp>.csv in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Plain-text statistics for the terminal
pub fn format_stats(summary: &StatsSummary) -> String {
    formatdoc! {"
        Users:             {total}
        With contacts:     {contacts} ({percent}%)
        Basic tariff:      {basic}
        Assistant tariff:  {assistant}
        No tariff:         {not_chosen}
        New today:         {today}
        New in 7 days:     {week}
        New in 30 days:    {month}
        Generated at:      {generated}
        ",
        total = summary.total_users,
        contacts = summary.with_contacts,
        percent = summary.contacts_percent,
        basic = summary.basic,
        assistant = summary.assistant,
        not_chosen = summary.not_chosen,
        today = summary.new_today,
        week = summary.new_week,
        month = summary.new_month,
        generated = summary.generated_at.format("%Y-%m-%d %H:%M:%S"),
    }
}

/// `stats` subcommand
pub async fn run_stats(repo: &dyn Repository, json: bool) -> AppResult<String> {
    let summary = StatsSummary::collect(repo, chrono::Local::now().naive_local()).await?;
    if json {
        Ok(serde_json::to_string_pretty(&summary).map_err(anyhow::Error::from)?)
    } else {
        Ok(format_stats(&summary))
    }
}

/// `export` subcommand; returns the written path and the number of rows
pub async fn run_export(repo: &dyn Repository, output: Option<&Path>) -> AppResult<(PathBuf, usize)> {
    let contacts = repo.users_with_contacts(None).await?;
    let path = match output {
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(export_filename(chrono::Local::now().naive_local())),
    };

    fs_err::tokio::write(&path, build_contacts_csv(&contacts)).await?;
    log::info!("Exported {} contacts to {}", contacts.len(), path.display());
    Ok((path, contacts.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Sender;
    use crate::storage::SqliteRepository;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_command_is_none() {
        let cli = Cli::parse_from(["assistbot"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::parse_from(["assistbot", "stats", "--json"]);
        assert_eq!(cli.command, Some(Commands::Stats { json: true }));

        let cli = Cli::parse_from(["assistbot", "export", "-o", "out.csv"]);
        assert_eq!(
            cli.command,
            Some(Commands::Export {
                output: Some(PathBuf::from("out.csv"))
            })
        );
    }

    #[tokio::test]
    async fn test_stats_json() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepository::open(dir.path().join("bot.db")).unwrap();
        repo.upsert_user(&Sender::new(1)).await.unwrap();

        let output = run_stats(&repo, true).await.unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total_users"], 1);
        assert_eq!(value["with_contacts"], 0);
    }

    #[tokio::test]
    async fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = SqliteRepository::open(dir.path().join("bot.db")).unwrap();
        repo.upsert_user(&Sender::new(1)).await.unwrap();
        repo.set_phone_number(1, "+70000000001").await.unwrap();

        let target = dir.path().join("contacts.csv");
        let (path, count) = run_export(&repo, Some(&target)).await.unwrap();
        assert_eq!(path, target);
        assert_eq!(count, 1);

        let bytes = std::fs::read(&target).unwrap();
        assert!(bytes.starts_with(&[0xEF, 0xBB, 0xBF]));
        assert!(String::from_utf8_lossy(&bytes).contains("+70000000001"));
    }
}
