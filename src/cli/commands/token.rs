use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::PgStore;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a new API token, replacing any existing one")]
    Create {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "Revoke the user's API token")]
    Revoke {
        #[arg(help = "Username")]
        username: String,
    },
}

pub async fn handle(cmd: TokenCommands, store: &PgStore, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Create { username } => {
            let token = store.issue_token(&username).await?;
            match output_format {
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!(token)),
                ),
                OutputFormat::Text => {
                    // Only place the raw key is ever shown
                    println!("Token for '{}': {}", token.username, token.key);
                    println!("Send it as: Authorization: Token {}", token.key);
                    Ok(())
                }
            }
        }
        TokenCommands::Revoke { username } => {
            let message = if store.revoke_token(&username).await? {
                format!("Revoked token for '{}'", username)
            } else {
                format!("User '{}' had no token", username)
            };
            output_success(&output_format, &message, None)
        }
    }
}
