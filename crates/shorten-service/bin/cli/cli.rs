use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};

pub const STORAGE_BACKEND_ENV: &str = "SHORTEN_STORAGE_BACKEND";
pub const DATABASE_URL_ENV: &str = "SHORTEN_DATABASE_URL";
pub const LOG_FORMAT_ENV: &str = "SHORTEN_LOG_FORMAT";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://shorten.db";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "shorten", about = "Manage short-token to URL mappings")]
pub struct CLI {
    #[arg(
        long,
        global = true,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::Sqlite
    )]
    pub storage: StorageBackendArg,

    #[arg(long, global = true, env = DATABASE_URL_ENV, default_value = DEFAULT_DATABASE_URL)]
    pub database_url: String,

    #[arg(
        long,
        global = true,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Text
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every mapping in creation order
    List,
    /// Show one mapping
    Details { id: i64 },
    /// Create a mapping for a caller-chosen token
    Create {
        original_url: String,
        token: String,
        /// Use this id instead of letting the store assign one
        #[arg(long)]
        id: Option<i64>,
    },
    /// Change the URL and/or token of a mapping
    Edit {
        id: i64,
        #[arg(long)]
        original_url: Option<String>,
        #[arg(long)]
        token: Option<String>,
    },
    /// Delete a mapping
    Delete { id: i64 },
    /// Print the original URL behind a token
    Resolve { token: String },
}
