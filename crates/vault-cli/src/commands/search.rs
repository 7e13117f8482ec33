//! Search and listing CLI commands.

use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use vault_core::error::AppError;
use vault_core::types::filter::SearchFilter;
use vault_core::types::pagination::{PageRequest, PageResponse};
use vault_core::types::sorting::{SortDirection, SortField};
use vault_entity::LogicalFile;

/// Arguments for search commands
#[derive(Debug, Args)]
pub struct SearchArgs {
    /// Search subcommand
    #[command(subcommand)]
    pub command: SearchCommand,
}

/// Search subcommands
#[derive(Debug, Subcommand)]
pub enum SearchCommand {
    /// Search files by text, owner, or tags
    Query {
        /// Substring match against file name or description
        #[arg(short, long)]
        text: Option<String>,
        /// Exact owner match
        #[arg(short, long)]
        owner: Option<String>,
        /// Match any of these tags (repeatable)
        #[arg(long)]
        tag: Vec<String>,
        /// Paging and sorting
        #[command(flatten)]
        paging: PagingArgs,
    },
    /// List an owner's files
    Owner {
        /// Owner to list
        owner: String,
        /// Paging and sorting
        #[command(flatten)]
        paging: PagingArgs,
    },
}

/// Shared paging and sorting arguments
#[derive(Debug, Args)]
pub struct PagingArgs {
    /// Page number (1-based)
    #[arg(long, default_value_t = 1)]
    pub page: u64,
    /// Items per page
    #[arg(long, default_value_t = 20)]
    pub page_size: u64,
    /// Sort field: name, owner, created_at, updated_at
    #[arg(long, default_value = "updated_at")]
    pub sort: String,
    /// Sort order
    #[arg(long, value_enum, default_value = "desc")]
    pub order: SortOrder,
}

/// Sort order flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortOrder {
    /// Ascending
    Asc,
    /// Descending
    Desc,
}

impl PagingArgs {
    fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.page_size)
    }

    fn sort_field(&self) -> SortField {
        let direction = match self.order {
            SortOrder::Asc => SortDirection::Asc,
            SortOrder::Desc => SortDirection::Desc,
        };
        SortField::new(&self.sort, direction)
    }
}

/// File display row for table output
#[derive(Debug, Serialize, Tabled)]
struct FileRow {
    /// File ID
    id: String,
    /// File name
    name: String,
    /// Owner
    owner: String,
    /// Version count
    versions: usize,
    /// Tags
    tags: String,
    /// Last update
    updated_at: String,
}

impl FileRow {
    fn from_entity(file: &LogicalFile) -> Self {
        Self {
            id: file.id.to_string(),
            name: file.original_file_name.clone(),
            owner: file.owner.clone(),
            versions: file.versions.len(),
            tags: file.tags.iter().cloned().collect::<Vec<_>>().join(", "),
            updated_at: file.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Execute search commands
pub async fn execute(
    args: &SearchArgs,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let engine = super::build_engine(&config).await?;

    let page = match &args.command {
        SearchCommand::Query {
            text,
            owner,
            tag,
            paging,
        } => {
            let filter = SearchFilter {
                text: text.clone(),
                owner: owner.clone(),
                tags: tag.clone(),
            };
            engine
                .search_files(&filter, &paging.page_request(), &paging.sort_field())
                .await?
        }
        SearchCommand::Owner { owner, paging } => {
            engine
                .list_by_owner(owner, &paging.page_request(), &paging.sort_field())
                .await?
        }
    };

    print_page(&page, format);
    Ok(())
}

fn print_page(page: &PageResponse<LogicalFile>, format: OutputFormat) {
    let rows: Vec<FileRow> = page.items.iter().map(FileRow::from_entity).collect();
    output::print_list(&rows, format);

    if format == OutputFormat::Table && page.total_items > 0 {
        println!(
            "Page {}/{} ({} files total)",
            page.page, page.total_pages, page.total_items
        );
    }
}
