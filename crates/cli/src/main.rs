//! `tichet-store` CLI entry-point.
//!
//! Available sub-commands:
//! - `migrate` — apply pending database migrations.
//! - `list`    — list tickets, optionally filtered.
//! - `get`     — fetch one ticket by id.
//! - `create`  — insert a ticket.
//! - `update`  — partially update a ticket (`--clear-title` / `--clear-description` null a field).
//! - `delete`  — delete a ticket.
//!
//! Data commands print the result envelope as JSON and exit with status 1
//! when the operation did not complete.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tichet_db::models::{NewTichet, TichetChange, TichetColumn};
use tichet_db::pool::{create_pool, run_migrations};
use tichet_db::repository::tichete;
use tichet_db::{Filter, OperationResponse, StoreConfig};

#[derive(Parser)]
#[command(
    name = "tichet-store",
    about = "Create, inspect and update tickets",
    version
)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://tichete.db", global = true)]
    database_url: String,

    #[arg(long, env = "TICHET_MAX_CONNECTIONS", default_value_t = 5, global = true)]
    max_connections: u32,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply pending database migrations.
    Migrate,
    /// List tickets matching every given field.
    List {
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        priority: Option<i64>,
    },
    /// Fetch a ticket by id.
    Get { id: i64 },
    /// Create a ticket.
    Create {
        #[arg(long)]
        status: String,
        #[command(flatten)]
        fields: TichetFields,
    },
    /// Update the given fields of a ticket.
    Update {
        id: i64,
        #[arg(long)]
        status: Option<String>,
        #[command(flatten)]
        fields: TichetFields,
        /// Set the title to null.
        #[arg(long, conflicts_with = "title")]
        clear_title: bool,
        /// Set the description to null.
        #[arg(long, conflicts_with = "description")]
        clear_description: bool,
    },
    /// Delete a ticket by id.
    Delete { id: i64 },
}

#[derive(Args)]
struct TichetFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    priority: Option<i64>,
}

impl TichetFields {
    fn into_draft(self, status: String) -> NewTichet {
        let mut draft = NewTichet::new().status(status);
        if let Some(title) = self.title {
            draft = draft.title(title);
        }
        if let Some(description) = self.description {
            draft = draft.description(description);
        }
        if let Some(priority) = self.priority {
            draft = draft.priority(priority);
        }
        draft
    }

    fn into_changes(
        self,
        status: Option<String>,
        clear_title: bool,
        clear_description: bool,
    ) -> Vec<TichetChange> {
        let mut changes = Vec::new();
        if let Some(status) = status {
            changes.push(TichetChange::Status(status));
        }
        if self.title.is_some() || clear_title {
            changes.push(TichetChange::Title(self.title));
        }
        if self.description.is_some() || clear_description {
            changes.push(TichetChange::Description(self.description));
        }
        if let Some(priority) = self.priority {
            changes.push(TichetChange::Priority(priority));
        }
        changes
    }
}

/// Print the envelope and turn an incomplete operation into a failing exit.
fn report<T: Serialize>(response: OperationResponse<T>) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(response.completed)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = StoreConfig {
        database_url: cli.database_url,
        max_connections: cli.max_connections,
        ..StoreConfig::default()
    };
    let pool = create_pool(&config)
        .await
        .with_context(|| format!("failed to connect to {}", config.database_url))?;

    let completed = match cli.command {
        Command::Migrate => {
            run_migrations(&pool).await.context("migration failed")?;
            info!("Migrations applied successfully");
            true
        }
        Command::List { status, title, priority } => {
            let mut filter = Filter::all();
            if let Some(status) = status {
                filter = filter.eq(TichetColumn::Status, status);
            }
            if let Some(title) = title {
                filter = filter.eq(TichetColumn::Title, title);
            }
            if let Some(priority) = priority {
                filter = filter.eq(TichetColumn::Priority, priority);
            }
            report(tichete::get_all_tichete_with_filters(&pool, &filter).await)?
        }
        Command::Get { id } => report(tichete::get_tichet_by_id_tichet(&pool, id).await)?,
        Command::Create { status, fields } => {
            report(tichete::insert_tichet(&pool, fields.into_draft(status)).await)?
        }
        Command::Update { id, status, fields, clear_title, clear_description } => {
            let changes = fields.into_changes(status, clear_title, clear_description);
            report(tichete::update_tichet(&pool, id, changes).await)?
        }
        Command::Delete { id } => report(tichete::delete_tichet_by_id_tichet(&pool, id).await)?,
    };

    pool.close().await;
    if !completed {
        std::process::exit(1);
    }
    Ok(())
}
