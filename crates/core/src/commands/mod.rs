//! Command registry and dispatch system
//!
//! This module provides a static registry of commands a UI front-end can
//! call with JSON arguments. Commands are registered as "category.action"
//! (e.g., "prompts.list", "prompts.create") and dispatched to handler
//! functions together with a [`Context`] holding the service and clipboard.
//!
//! ## Adding a new command
//!
//! 1. Create handler function: `pub fn my_command(ctx: &Context, args: Value) -> Result<Value>`
//! 2. Register in `REGISTRY`: `("category.action", my_command as CommandHandler)`
//! 3. Add tests for the command

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::clipboard::Clipboard;
use crate::errors::{Result, VaultError};
use crate::service::PromptService;

pub mod prompts;

/// Collaborators a command may use
#[derive(Clone)]
pub struct Context {
    pub service:   Arc<dyn PromptService>,
    pub clipboard: Arc<dyn Clipboard>,
}

impl Context {
    pub fn new(service: Arc<dyn PromptService>, clipboard: Arc<dyn Clipboard>) -> Self {
        Self { service, clipboard }
    }
}

/// Type alias for command handler functions
///
/// All command handlers take the context and a JSON Value (arguments) and
/// return a Result<Value>
pub type CommandHandler = fn(&Context, Value) -> Result<Value>;

/// Static command registry
///
/// Maps command names to handler functions. Initialized lazily on first access.
static REGISTRY: Lazy<HashMap<&'static str, CommandHandler>> = Lazy::new(|| {
    let mut map = HashMap::new();

    map.insert("ping", ping as CommandHandler);

    map.insert("prompts.list", prompts::list as CommandHandler);
    map.insert("prompts.get", prompts::get as CommandHandler);
    map.insert("prompts.create", prompts::create as CommandHandler);
    map.insert("prompts.update", prompts::update as CommandHandler);
    map.insert("prompts.delete", prompts::delete as CommandHandler);
    map.insert("prompts.search", prompts::search as CommandHandler);
    map.insert("prompts.copy", prompts::copy as CommandHandler);

    map
});

/// Dispatch a command by name
///
/// # Arguments
/// * `ctx` - Service and clipboard the handler runs against
/// * `command` - Command name (e.g., "ping", "prompts.list")
/// * `args` - Command arguments as JSON Value
///
/// # Returns
/// Command result as JSON Value, or error if command not found
pub fn dispatch(ctx: &Context, command: &str, args: Value) -> Result<Value> {
    match REGISTRY.get(command) {
        Some(handler) => {
            tracing::debug!(command, "dispatching command");
            handler(ctx, args)
        },
        None => Err(VaultError::CommandNotFound(command.to_string())),
    }
}

/// List all available commands
///
/// Returns a sorted list of all registered command names.
pub fn list_commands() -> Vec<String> {
    let mut commands: Vec<String> = REGISTRY.keys().map(|&k| k.to_string()).collect();
    commands.sort();
    commands
}

/// Ping command - simple test to verify command dispatch works
///
/// Returns the input arguments with an added "pong" field.
fn ping(_ctx: &Context, args: Value) -> Result<Value> {
    let mut result = match args {
        Value::Object(map) => map,
        _ => serde_json::Map::new(),
    };

    result.insert("pong".to_string(), Value::Bool(true));
    Ok(Value::Object(result))
}
