use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::Span;

use super::bucket::{encode_key, Bucket};
use super::Db;
use crate::errors::{Result, VaultError};

/// Bucket holding every stored prompt
pub const PROMPTS_BUCKET: &str = "prompts";

/// A stored prompt
///
/// Serialized with stable PascalCase field names (`ID`, `Title`, ...) and
/// RFC 3339 UTC timestamps. `id == 0` marks a record that has not been
/// persisted yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Prompt {
    #[serde(rename = "ID")]
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub prompt_content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    /// Build an unsaved prompt
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        prompt_content: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            prompt_content: prompt_content.into(),
            ..Self::default()
        }
    }

    pub fn is_new(&self) -> bool {
        self.id == 0
    }
}

fn prompt_key(id: i64) -> [u8; 8] {
    encode_key(id as u64)
}

fn decode_prompt(value: &[u8]) -> Result<Prompt> {
    Ok(serde_json::from_slice(value)?)
}

/// Durable prompt storage
#[cfg_attr(test, mockall::automock)]
pub trait PromptRepository: Send + Sync {
    /// Insert a new prompt (`id == 0`) or overwrite an existing one
    fn create_or_update(&self, prompt: Prompt) -> Result<Prompt>;

    /// Remove a prompt; removing an unknown ID is not an error
    fn delete(&self, id: i64) -> Result<()>;

    fn get_by_id(&self, id: i64) -> Result<Prompt>;

    /// Every prompt in ascending ID order
    fn get_all(&self) -> Result<Vec<Prompt>>;
}

/// [`PromptRepository`] backed by the embedded store
pub struct SqlitePromptRepository {
    db:   Arc<Db>,
    span: Span,
}

impl SqlitePromptRepository {
    /// Create a repository that logs inside `span`
    pub fn new(db: Arc<Db>, span: Span) -> Self {
        Self { db, span }
    }
}

impl PromptRepository for SqlitePromptRepository {
    fn create_or_update(&self, mut prompt: Prompt) -> Result<Prompt> {
        self.span.in_scope(|| {
            let result = self.db.update(move |tx| {
                let bucket = Bucket::create_if_not_exists(tx, PROMPTS_BUCKET)?;
                let now = Utc::now();

                if prompt.is_new() {
                    let seq = bucket.next_sequence()?;
                    prompt.id = i64::try_from(seq)
                        .map_err(|_| VaultError::Other(format!("Prompt ID space exhausted at {}", seq)))?;
                    prompt.created_at = now;
                    prompt.updated_at = now;
                } else {
                    let existing = match bucket.get(&prompt_key(prompt.id))? {
                        Some(value) => decode_prompt(&value)?,
                        None => return Err(VaultError::NotFound(prompt.id)),
                    };
                    tracing::debug!(id = prompt.id, "updating prompt");
                    prompt.created_at = existing.created_at;
                    prompt.updated_at = now.max(existing.updated_at);
                }

                let encoded = serde_json::to_vec(&prompt)?;
                bucket.put(&prompt_key(prompt.id), &encoded)?;
                Ok(prompt)
            });

            match &result {
                Ok(saved) => tracing::info!(id = saved.id, "saved prompt"),
                Err(err) => tracing::error!(error = %err, "failed to save prompt"),
            }
            result
        })
    }

    fn delete(&self, id: i64) -> Result<()> {
        self.span.in_scope(|| {
            let result = self.db.update(|tx| {
                Bucket::create_if_not_exists(tx, PROMPTS_BUCKET)?.delete(&prompt_key(id))
            });

            match &result {
                Ok(()) => tracing::info!(id, "deleted prompt"),
                Err(err) => tracing::error!(id, error = %err, "failed to delete prompt"),
            }
            result
        })
    }

    fn get_by_id(&self, id: i64) -> Result<Prompt> {
        self.span.in_scope(|| {
            self.db.view(|tx| {
                let Some(bucket) = Bucket::open(tx, PROMPTS_BUCKET)? else {
                    tracing::warn!(id, "prompts bucket not found");
                    return Err(VaultError::NotFound(id));
                };

                match bucket.get(&prompt_key(id))? {
                    Some(value) => decode_prompt(&value).inspect_err(|err| {
                        tracing::error!(id, error = %err, "failed to decode prompt");
                    }),
                    None => {
                        tracing::debug!(id, "prompt not found");
                        Err(VaultError::NotFound(id))
                    },
                }
            })
        })
    }

    fn get_all(&self) -> Result<Vec<Prompt>> {
        self.span.in_scope(|| {
            let prompts = self.db.view(|tx| {
                let mut prompts = Vec::new();
                let Some(bucket) = Bucket::open(tx, PROMPTS_BUCKET)? else {
                    return Ok(prompts);
                };

                bucket.for_each(|_, value| {
                    let prompt = decode_prompt(value).inspect_err(|err| {
                        tracing::error!(error = %err, "failed to decode prompt");
                    })?;
                    prompts.push(prompt);
                    Ok(())
                })?;
                Ok(prompts)
            })?;

            tracing::info!(count = prompts.len(), "fetched all prompts");
            Ok(prompts)
        })
    }
}
