//! prompt-vault: a personal store for reusable prompts
//!
//! This crate provides the core of the vault, with features including:
//! - Durable prompt records (create, update, delete, list) with stable,
//!   never-reused IDs
//! - Fuzzy title search with ranked matches
//! - Clipboard copy of a prompt's content
//!
//! ## Architecture
//!
//! - **db**: embedded SQLite store used as a bucketed key/value engine, and
//!   the prompt repository on top of it
//! - **service**: validation in front of the repository; the only entry
//!   point a UI talks to
//! - **search** / **clipboard**: stateless helpers used next to the service
//! - **commands**: JSON command registry for front-ends

// Module declarations
pub mod clipboard;
pub mod commands;
pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod search;
pub mod service;

use std::sync::Arc;

pub use db::prompts::{Prompt, PromptRepository, SqlitePromptRepository};
pub use errors::{Result, VaultError};
pub use search::{search_prompts, Match};
pub use service::{PromptService, VaultService};

/// Open the store described by `config` and wrap it in a service
pub fn open_service(config: &config::VaultConfig) -> Result<VaultService<SqlitePromptRepository>> {
    let path = config.db_path()?;
    let db = db::Db::open(&path, &config.store_options())?;
    let repository = SqlitePromptRepository::new(Arc::new(db), logging::repository_span(&path));
    Ok(VaultService::new(repository))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_service_from_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = config::VaultConfig {
            db_path: Some(dir.path().join("vault").join("prompts.db")),
            ..Default::default()
        };

        let service = open_service(&config).unwrap();
        assert!(service.get_all_prompts().unwrap().is_empty());
        let saved = service
            .create_or_update_prompt(Prompt::new("title", "", "content"))
            .unwrap();
        assert_eq!(saved.id, 1);
    }
}
