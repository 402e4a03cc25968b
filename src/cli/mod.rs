pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::database::{DatabaseManager, PgStore};

#[derive(Parser)]
#[command(name = "recipes")]
#[command(about = "Recipes CLI - database, user and token administration for the Recipes API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[arg(long, global = true, help = "PostgreSQL connection string (overrides DATABASE_URL)")]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending database migrations")]
    Migrate,

    #[command(about = "User account management")]
    User {
        #[command(subcommand)]
        cmd: commands::user::UserCommands,
    },

    #[command(about = "API token management")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli, config: &AppConfig) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    let mut database = config.database.clone();
    if let Some(url) = cli.database_url.clone() {
        database.url = Some(url);
    }
    let pool = DatabaseManager::connect(&database).await?;

    match cli.command {
        Commands::Migrate => commands::migrate::handle(&pool, output_format).await,
        Commands::User { cmd } => commands::user::handle(cmd, &PgStore::new(pool), output_format).await,
        Commands::Token { cmd } => commands::token::handle(cmd, &PgStore::new(pool), output_format).await,
    }
}
