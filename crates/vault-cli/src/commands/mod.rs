//! CLI command definitions and dispatch.

pub mod file;
pub mod health;
pub mod migrate;
pub mod search;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use vault_core::config::AppConfig;
use vault_core::error::AppError;
use vault_core::traits::content_store::ContentStore;
use vault_database::{MetadataStore, PgMetadataStore};
use vault_service::VersionHistoryEngine;
use vault_storage::{LocalContentStore, MemoryContentStore};

/// FileVault — versioned content-addressed file storage
#[derive(Debug, Parser)]
#[command(name = "vault", version, about, long_about = None)]
pub struct Cli {
    /// Configuration environment (reads config/default plus config/<env>)
    #[arg(short, long, default_value = "default")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// File and version management
    File(file::FileArgs),
    /// Search and list files
    Search(search::SearchArgs),
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Check store connectivity
    Health,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        match &self.command {
            Commands::File(args) => file::execute(args, &self.env, self.format).await,
            Commands::Search(args) => search::execute(args, &self.env, self.format).await,
            Commands::Migrate(args) => migrate::execute(args, &self.env).await,
            Commands::Health => health::execute(&self.env).await,
        }
    }
}

/// Helper: load configuration for the selected environment
pub fn load_config(env: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(env)
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<sqlx::PgPool, AppError> {
    let pool = vault_database::connection::DatabasePool::connect(&config.database).await?;
    Ok(pool.into_pool())
}

/// Helper: build the version history engine over the configured stores
pub async fn build_engine(config: &AppConfig) -> Result<VersionHistoryEngine, AppError> {
    let pool = create_db_pool(config).await?;
    let metadata: Arc<dyn MetadataStore> = Arc::new(PgMetadataStore::new(pool));

    let content: Arc<dyn ContentStore> = match config.content_store.provider.as_str() {
        "local" => Arc::new(LocalContentStore::new(&config.content_store.root_path).await?),
        "memory" => Arc::new(MemoryContentStore::new()),
        other => {
            return Err(AppError::configuration(format!(
                "Unknown content store provider: {other}"
            )));
        }
    };

    Ok(VersionHistoryEngine::new(
        metadata,
        content,
        config.engine.clone(),
        &config.content_store,
    ))
}
