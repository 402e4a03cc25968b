use sqlx::PgPool;

use crate::cli::{utils::output_success, OutputFormat};
use crate::database::DatabaseManager;

pub async fn handle(pool: &PgPool, output_format: OutputFormat) -> anyhow::Result<()> {
    DatabaseManager::migrate(pool).await?;
    output_success(&output_format, "Database schema is up to date", None)
}
