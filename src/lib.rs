pub mod browse;
pub mod cli;
pub mod core;
pub mod server;
pub mod store;

use crate::browse::ApiClient;
use crate::cli::browse::BrowseOptions;
use crate::core::RecordStore;
use crate::core::config::AppConfig;
use crate::store::{MemoryStore, SupabaseStore};
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub enum AppCommand {
    Serve { memory: bool },
    Import { file: PathBuf, data_type: String },
    Browse(BrowseOptions),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_with_env(path)?,
        None => AppConfig::load()?,
    };
    debug!(
        table = %config.store.table,
        bind = %config.server.bind,
        api = %config.api.base_url,
        "Loaded config"
    );

    match command {
        AppCommand::Serve { memory } => {
            info!("stockdata API starting...");
            let store: Arc<dyn RecordStore> = if memory {
                warn!("Using the in-memory store, records are lost on exit");
                Arc::new(MemoryStore::new())
            } else {
                connect_store(&config)?
            };
            server::serve(store, &config.server).await
        }
        AppCommand::Import { file, data_type } => {
            cli::import::import_file(connect_store(&config)?, &file, &data_type).await
        }
        AppCommand::Browse(options) => {
            let client = ApiClient::new(&config.api.base_url)?;
            cli::browse::browse(client, options).await
        }
    }
}

/// Builds the hosted store adapter once; callers share it by reference.
pub fn connect_store(config: &AppConfig) -> Result<Arc<dyn RecordStore>> {
    let (url, key) = config.store_credentials()?;
    let store = SupabaseStore::new(url, key, &config.store.table)?;
    Ok(Arc::new(store))
}
