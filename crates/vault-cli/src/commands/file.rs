//! File and version management CLI commands.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use crate::output::{self, OutputFormat};
use vault_core::error::AppError;
use vault_core::types::FileId;
use vault_entity::LogicalFile;
use vault_service::{CreateFileRequest, VersionSelector};

/// Arguments for file commands
#[derive(Debug, Args)]
pub struct FileArgs {
    /// File subcommand
    #[command(subcommand)]
    pub command: FileCommand,
}

/// File subcommands
#[derive(Debug, Subcommand)]
pub enum FileCommand {
    /// Upload a new file
    Upload {
        /// Path to the file to upload
        path: PathBuf,
        /// Owner of the file
        #[arg(short, long)]
        owner: String,
        /// Override the stored file name (defaults to the path's file name)
        #[arg(short, long)]
        name: Option<String>,
        /// Description
        #[arg(short, long, default_value = "")]
        description: String,
        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,
    },
    /// Append a new version to an existing file
    Append {
        /// File ID
        id: FileId,
        /// Path to the new payload
        path: PathBuf,
        /// Who is uploading this version
        #[arg(short, long)]
        user: String,
    },
    /// Show a file and its version history
    Info {
        /// File ID
        id: FileId,
    },
    /// Download a version's payload
    Download {
        /// File ID
        id: FileId,
        /// Version to fetch: "latest" or a version number
        #[arg(short, long, default_value = "latest")]
        version: VersionSelector,
        /// Where to write the payload (defaults to the stored file name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-check a stored version against its recorded digest
    Verify {
        /// File ID
        id: FileId,
        /// Version to verify: "latest" or a version number
        #[arg(short, long, default_value = "latest")]
        version: VersionSelector,
    },
    /// Soft-delete a file
    Delete {
        /// File ID
        id: FileId,
        /// Owner of the file
        #[arg(short, long)]
        owner: String,
    },
}

/// Version display row for table output
#[derive(Debug, Serialize, Tabled)]
struct VersionRow {
    /// Version number
    version: u32,
    /// Payload size in bytes
    size: u64,
    /// MIME type
    mime_type: String,
    /// Uploader
    uploaded_by: String,
    /// Upload time
    uploaded_at: String,
    /// Content digest
    content_hash: String,
}

impl VersionRow {
    fn from_entity(v: &vault_entity::FileVersion) -> Self {
        Self {
            version: v.version_number,
            size: v.file_size,
            mime_type: v.mime_type.clone().unwrap_or_default(),
            uploaded_by: v.uploaded_by.clone(),
            uploaded_at: v.uploaded_at.format("%Y-%m-%d %H:%M").to_string(),
            content_hash: v.content_hash.clone(),
        }
    }
}

/// Execute file commands
pub async fn execute(
    args: &FileArgs,
    env: &str,
    format: OutputFormat,
) -> Result<(), AppError> {
    let config = super::load_config(env)?;
    let engine = super::build_engine(&config).await?;

    match &args.command {
        FileCommand::Upload {
            path,
            owner,
            name,
            description,
            tags,
        } => {
            let payload = read_payload(path).await?;
            let file_name = match name {
                Some(name) => name.clone(),
                None => path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or_else(|| {
                        AppError::validation(format!("No file name in path: {}", path.display()))
                    })?,
            };

            let file = engine
                .create_file(CreateFileRequest {
                    owner: owner.clone(),
                    original_file_name: file_name,
                    payload,
                    mime_type: detect_mime(path),
                    description: description.clone(),
                    tags: parse_tags(tags.as_deref()),
                })
                .await?;

            output::print_success(&format!(
                "Uploaded '{}' as file {} (version 1)",
                file.original_file_name, file.id
            ));
        }
        FileCommand::Append { id, path, user } => {
            let payload = read_payload(path).await?;
            let version = engine
                .append_version(*id, user, payload, detect_mime(path))
                .await?;

            output::print_success(&format!(
                "Appended version {} to file {}",
                version.version_number, id
            ));
        }
        FileCommand::Info { id } => {
            let file = engine.get_file(*id).await?;
            print_file(&file, format);
        }
        FileCommand::Download {
            id,
            version,
            output: target,
        } => {
            let (fetched, payload) = engine.download(*id, *version).await?;
            let target = match target {
                Some(path) => path.clone(),
                None => {
                    let file = engine.get_file(*id).await?;
                    default_download_target(&file.original_file_name)?
                }
            };

            tokio::fs::write(&target, &payload).await.map_err(|e| {
                AppError::internal(format!("Failed to write {}: {e}", target.display()))
            })?;

            output::print_success(&format!(
                "Wrote version {} ({} bytes) to {}",
                fetched.version_number,
                payload.len(),
                target.display()
            ));
        }
        FileCommand::Verify { id, version } => {
            let file = engine.get_file(*id).await?;
            let resolved = engine.resolve_version(&file, *version)?;
            let result = engine.verify_integrity(resolved).await?;

            if result.is_intact() {
                output::print_success(&format!(
                    "Version {} of file {} is intact",
                    resolved.version_number, id
                ));
            } else {
                output::print_error(&format!(
                    "Version {} of file {} FAILED verification",
                    resolved.version_number, id
                ));
                output::print_kv("Recorded digest", &resolved.content_hash);
                output::print_kv("Recomputed digest", &result.recomputed_hash);
                output::print_kv("Sizes match", &result.sizes_match.to_string());
            }
        }
        FileCommand::Delete { id, owner } => {
            engine.soft_delete(*id, owner).await?;
            output::print_success(&format!("File {} deleted", id));
        }
    }

    Ok(())
}

fn print_file(file: &LogicalFile, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(file).unwrap_or_else(|_| "{}".to_string());
            println!("{}", json);
        }
        OutputFormat::Table => {
            output::print_kv("ID", &file.id.to_string());
            output::print_kv("Name", &file.original_file_name);
            output::print_kv("Owner", &file.owner);
            output::print_kv("Description", &file.description);
            output::print_kv(
                "Tags",
                &file.tags.iter().cloned().collect::<Vec<_>>().join(", "),
            );
            output::print_kv("Versions", &file.versions.len().to_string());
            output::print_kv(
                "Created",
                &file.created_at.format("%Y-%m-%d %H:%M").to_string(),
            );
            output::print_kv(
                "Updated",
                &file.updated_at.format("%Y-%m-%d %H:%M").to_string(),
            );

            let rows: Vec<VersionRow> = file.versions.iter().map(VersionRow::from_entity).collect();
            output::print_list(&rows, format);
        }
    }
}

async fn read_payload(path: &Path) -> Result<Bytes, AppError> {
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::validation(format!("Failed to read {}: {e}", path.display())))?;
    Ok(Bytes::from(data))
}

fn detect_mime(path: &Path) -> Option<String> {
    mime_guess::from_path(path)
        .first()
        .map(|m| m.essence_str().to_string())
}

/// Default download path from a stored file name. Only the final path
/// component is used; a stored name carrying directory segments must not
/// steer the write outside the working directory.
fn default_download_target(name: &str) -> Result<PathBuf, AppError> {
    Path::new(name)
        .file_name()
        .map(PathBuf::from)
        .ok_or_else(|| {
            AppError::validation(format!("stored file name {name:?} has no usable file name"))
        })
}

fn parse_tags(tags: Option<&str>) -> BTreeSet<String> {
    tags.map(|t| {
        t.split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_target_strips_directory_segments() {
        assert_eq!(
            default_download_target("greeting.txt").unwrap(),
            PathBuf::from("greeting.txt")
        );
        assert_eq!(
            default_download_target("../../etc/passwd").unwrap(),
            PathBuf::from("passwd")
        );
    }

    #[test]
    fn test_download_target_rejects_bare_traversal() {
        assert!(default_download_target("..").is_err());
        assert!(default_download_target("").is_err());
    }
}
