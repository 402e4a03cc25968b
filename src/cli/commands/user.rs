use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_empty_collection, output_success};
use crate::cli::OutputFormat;
use crate::database::PgStore;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Create a user that can author recipes")]
    Create {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "List all users")]
    List,

    #[command(about = "Block a user from authenticating without deleting their recipes")]
    Deactivate {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "Allow a deactivated user to authenticate again")]
    Activate {
        #[arg(help = "Username")]
        username: String,
    },

    #[command(about = "Delete a user together with their token and recipes")]
    Delete {
        #[arg(help = "Username")]
        username: String,
    },
}

pub async fn handle(cmd: UserCommands, store: &PgStore, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Create { username } => {
            let user = store.create_user(&username).await?;
            output_success(
                &output_format,
                &format!("Created user '{}' with id {}", user.username, user.id),
                Some(json!(user)),
            )
        }
        UserCommands::List => {
            let users = store.list_users().await?;
            if users.is_empty() {
                return output_empty_collection(&output_format, "users", "No users found");
            }
            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "users": users }))?);
                }
                OutputFormat::Text => {
                    println!("{:<8} {:<24} {:<8} CREATED", "ID", "USERNAME", "ACTIVE");
                    for user in users {
                        println!(
                            "{:<8} {:<24} {:<8} {}",
                            user.id,
                            user.username,
                            user.is_active,
                            user.created_at.to_rfc3339()
                        );
                    }
                }
            }
            Ok(())
        }
        UserCommands::Deactivate { username } => {
            let user = store.set_active(&username, false).await?;
            output_success(&output_format, &format!("Deactivated user '{}'", user), Some(json!(user)))
        }
        UserCommands::Activate { username } => {
            let user = store.set_active(&username, true).await?;
            output_success(&output_format, &format!("Activated user '{}'", user), Some(json!(user)))
        }
        UserCommands::Delete { username } => {
            store.delete_user(&username).await?;
            output_success(
                &output_format,
                &format!("Deleted user '{}' and their recipes", username),
                None,
            )
        }
    }
}
