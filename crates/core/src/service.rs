//! Prompt service: the single entry point for UI collaborators
//!
//! Enforces the business rules the repository does not know about (a prompt
//! needs a title and content) and otherwise passes calls straight through.

use crate::db::prompts::{Prompt, PromptRepository};
use crate::errors::{Result, VaultError};

#[cfg_attr(test, mockall::automock)]
pub trait PromptService: Send + Sync {
    /// Validate, then create (`id == 0`) or update a prompt
    fn create_or_update_prompt(&self, prompt: Prompt) -> Result<Prompt>;

    fn delete_prompt(&self, id: i64) -> Result<()>;

    fn get_prompt_by_id(&self, id: i64) -> Result<Prompt>;

    /// All prompts; primarily used for the list view and initial load
    fn get_all_prompts(&self) -> Result<Vec<Prompt>>;
}

pub struct VaultService<R> {
    repository: R,
}

impl<R: PromptRepository> VaultService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

fn validate(prompt: &Prompt) -> Result<()> {
    if prompt.title.is_empty() {
        return Err(VaultError::Validation("title is required".into()));
    }
    if prompt.prompt_content.is_empty() {
        return Err(VaultError::Validation("prompt content is required".into()));
    }
    Ok(())
}

impl<R: PromptRepository> PromptService for VaultService<R> {
    fn create_or_update_prompt(&self, prompt: Prompt) -> Result<Prompt> {
        validate(&prompt)?;
        self.repository.create_or_update(prompt)
    }

    fn delete_prompt(&self, id: i64) -> Result<()> {
        self.repository.delete(id)
    }

    fn get_prompt_by_id(&self, id: i64) -> Result<Prompt> {
        self.repository.get_by_id(id)
    }

    fn get_all_prompts(&self) -> Result<Vec<Prompt>> {
        self.repository.get_all()
    }
}
