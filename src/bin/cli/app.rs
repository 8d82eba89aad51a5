use std::path::PathBuf;

use anyhow::{Context, Result};

use mneme::flashcards::CardStore;
use mneme::storage::FileKeyValueStore;

/// Shared application state for CLI commands
pub struct App {
    pub store: CardStore<FileKeyValueStore>,
}

impl App {
    /// Initialize against the given or default data directory
    pub fn new(data_dir: Option<PathBuf>) -> Result<Self> {
        let dir = match data_dir {
            Some(dir) => dir,
            None => FileKeyValueStore::default_data_dir()
                .context("Failed to get data directory")?,
        };

        let backend = FileKeyValueStore::new(dir);
        backend.init().context("Failed to initialize storage")?;

        Ok(Self {
            store: CardStore::new(backend),
        })
    }
}
