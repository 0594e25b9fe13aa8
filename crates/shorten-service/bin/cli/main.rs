mod cli;

use crate::cli::{Command, LogFormatArg, StorageBackendArg, CLI};
use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use shorten_core::MappingStore;
use shorten_service::{MappingId, MappingService, NewMapping, Outcome};
use shorten_storage::{InMemoryStore, SqliteStore};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = CLI::parse();
    init_tracing(config.log_format);

    info!(
        storage_backend = %config.storage,
        database_url = %config.database_url,
        "starting shorten"
    );

    match config.storage {
        StorageBackendArg::InMemory => {
            run(MappingService::new(InMemoryStore::new()), config.command).await
        }
        StorageBackendArg::Sqlite => {
            let store = SqliteStore::connect(&config.database_url)
                .await
                .with_context(|| format!("failed to open {}", config.database_url))?;
            run(MappingService::new(store), config.command).await
        }
    }
}

fn init_tracing(format: LogFormatArg) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // stdout carries command output
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match format {
        LogFormatArg::Text => builder.init(),
        LogFormatArg::Json => builder.json().init(),
    }
}

async fn run<S: MappingStore>(service: MappingService<S>, command: Command) -> anyhow::Result<()> {
    match command {
        Command::List => render(service.list_all().await?),
        Command::Details { id } => render(service.get_details(MappingId::new(id)).await?),
        Command::Create {
            original_url,
            token,
            id,
        } => {
            let candidate = NewMapping {
                id: id.map(MappingId::new),
                original_url,
                shortened_url: token,
            };
            render(service.create_mapping(candidate).await?)
        }
        Command::Edit {
            id,
            original_url,
            token,
        } => {
            let id = MappingId::new(id);
            let current = service.get_details(id).await?.into_inner();
            let candidate = NewMapping {
                id: Some(id),
                original_url: original_url.unwrap_or(current.original_url),
                shortened_url: token.unwrap_or(current.shortened_url),
            };
            render(service.edit_mapping(id, candidate).await?)
        }
        Command::Delete { id } => {
            let id = MappingId::new(id);
            let outcome = service.delete_mapping(id).await?;
            render(outcome.map(|()| serde_json::json!({ "deleted": id })))
        }
        Command::Resolve { token } => match service.resolve(&token).await? {
            Some(mapping) => {
                println!("{}", mapping.original_url);
                Ok(())
            }
            None => bail!("no mapping uses token '{token}'"),
        },
    }
}

fn render<T: Serialize>(outcome: Outcome<T>) -> anyhow::Result<()> {
    if outcome.is_redirect() {
        debug!("operation completed, returning to list");
    }
    let body = serde_json::to_string_pretty(outcome.as_inner())?;
    println!("{body}");
    Ok(())
}
