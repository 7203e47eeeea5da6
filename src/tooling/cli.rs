//! CLI Tooling
//!
//! Command-line interface over the client core. Every command returns its output
//! as a string; the binary decides where it goes.

use crate::config::{CollabConfig, ConfigLoader};
use crate::error::ApiError;
use crate::identity::IdentityGenerator;
use crate::ingest::{collect_file_list, IngestReport, LocalDirectory};
use crate::logging::LoggingConfig;
use crate::session::channel::LoopbackChannel;
use crate::session::navigation::MemoryFlagStore;
use crate::session::state::CurrentUser;
use crate::session::validation::validate_join;
use crate::tree::node::FileSystemNode;
use crate::workspace::WorkspaceSession;
use clap::{Parser, Subcommand};
use serde_json::json;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// collabx - collaborative editing client core
#[derive(Parser)]
#[command(name = "collabx")]
#[command(about = "Room ids, join validation and file-tree ingestion for collaborative editing")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the global config)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging settings with command-line overrides applied.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if self.verbose {
            config.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            config.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            config.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate fresh room ids
    RoomId {
        /// How many ids to print
        #[arg(long, default_value = "1")]
        count: usize,
    },
    /// Check a username/room id pair against the join rules
    Validate {
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        room_id: String,
    },
    /// Ingest a local directory and print the resulting tree
    Ingest {
        /// Directory to ingest
        path: PathBuf,
        /// Use the flat file-list path instead of hierarchical traversal
        #[arg(long)]
        flat: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Ingest a local directory and print its export listing
    Export {
        /// Directory to ingest
        path: PathBuf,
        /// Use the flat file-list path instead of hierarchical traversal
        #[arg(long)]
        flat: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// CLI execution context
pub struct CliContext {
    config: CollabConfig,
}

impl CliContext {
    /// Load configuration, from `config_path` when given.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self { config })
    }

    pub fn with_config(config: CollabConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &CollabConfig {
        &self.config
    }

    /// Execute a command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        info!(command = command_name(command), "Executing command");
        match command {
            Commands::RoomId { count } => {
                let ids = IdentityGenerator::new();
                let lines: Vec<String> = (0..*count).map(|_| ids.room_id().to_string()).collect();
                Ok(lines.join("\n"))
            }
            Commands::Validate { username, room_id } => {
                let user = CurrentUser::new(username.as_str(), room_id.as_str());
                validate_join(&user, &self.config.session.join_rules())?;
                Ok("ok".to_string())
            }
            Commands::Ingest { path, flat, format } => {
                check_format(format)?;
                let (workspace, report) = self.ingest(path, *flat)?;
                if format == "json" {
                    let out = json!({
                        "report": report,
                        "fingerprint": workspace.fingerprint(),
                        "fileStructure": workspace.tree().root().children,
                    });
                    return to_pretty(&out);
                }
                let mut out = String::new();
                render_tree(&workspace.tree().root().children, 0, &mut out);
                let _ = write!(
                    out,
                    "{} files, {} directories ({} oversized, {} unreadable, {} skipped)",
                    report.files,
                    report.directories,
                    report.oversized,
                    report.read_failures,
                    report.skipped
                );
                Ok(out)
            }
            Commands::Export { path, flat, format } => {
                check_format(format)?;
                let (workspace, _) = self.ingest(path, *flat)?;
                let listing = workspace.export();
                if format == "json" {
                    return to_pretty(&listing);
                }
                let lines: Vec<String> = listing
                    .iter()
                    .map(|entry| match &entry.content {
                        None => format!("{}/", entry.path),
                        Some(content) => format!("{}\t{}", entry.path, content.len()),
                    })
                    .collect();
                Ok(lines.join("\n"))
            }
        }
    }

    fn ingest(&self, path: &Path, flat: bool) -> Result<(WorkspaceSession, IngestReport), ApiError> {
        if tokio::runtime::Handle::try_current().is_ok() {
            return Err(ApiError::ConfigError(
                "Cannot run ingestion from within an async runtime".to_string(),
            ));
        }
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let (mut workspace, _) = WorkspaceSession::new(
            self.config.clone(),
            Arc::new(LoopbackChannel::new()),
            Arc::new(MemoryFlagStore::new()),
            None,
        );
        let policy = self.config.ingest.policy();
        let report = rt.block_on(async {
            if flat {
                let files = collect_file_list(path, &policy)?;
                workspace.ingest_file_list(&files).await
            } else {
                if !path.is_dir() {
                    return Err(crate::error::IngestError::Acquisition(format!(
                        "{} is not a directory",
                        path.display()
                    )));
                }
                workspace.ingest_directory(&LocalDirectory::new(path)).await
            }
        })?;
        Ok((workspace, report))
    }
}

fn check_format(format: &str) -> Result<(), ApiError> {
    match format {
        "text" | "json" => Ok(()),
        other => Err(ApiError::ConfigError(format!(
            "Invalid format: {} (must be 'text' or 'json')",
            other
        ))),
    }
}

fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize output: {}", e)))
}

fn render_tree(nodes: &[FileSystemNode], depth: usize, out: &mut String) {
    for node in nodes {
        let indent = "  ".repeat(depth);
        match node {
            FileSystemNode::Directory(dir) => {
                let _ = writeln!(out, "{}{}/", indent, dir.name);
                render_tree(&dir.children, depth + 1, out);
            }
            FileSystemNode::File(file) => {
                let _ = writeln!(out, "{}{} ({} B)", indent, file.name, file.content.len());
            }
        }
    }
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::RoomId { .. } => "room-id",
        Commands::Validate { .. } => "validate",
        Commands::Ingest { .. } => "ingest",
        Commands::Export { .. } => "export",
    }
}
