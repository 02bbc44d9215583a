use serde_json::{json, Value};

use super::Context;
use crate::clipboard::copy_to_clipboard;
use crate::db::prompts::Prompt;
use crate::errors::{Result, VaultError};
use crate::search::search_prompts;

fn required_str<'a>(args: &'a Value, command: &str, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| VaultError::invalid_args(command, format!("Missing {}", key)))
}

fn required_id(args: &Value, command: &str) -> Result<i64> {
    args.get("id")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| VaultError::invalid_args(command, "Missing id"))
}

fn optional_str(args: &Value, key: &str) -> String {
    args.get(key)
        .and_then(|v| v.as_str())
        .map(String::from)
        .unwrap_or_default()
}

pub fn list(ctx: &Context, _args: Value) -> Result<Value> {
    let prompts = ctx.service.get_all_prompts()?;
    Ok(json!({ "prompts": prompts }))
}

pub fn get(ctx: &Context, args: Value) -> Result<Value> {
    let id = required_id(&args, "prompts.get")?;
    let prompt = ctx.service.get_prompt_by_id(id)?;
    Ok(json!(prompt))
}

pub fn create(ctx: &Context, args: Value) -> Result<Value> {
    let title = required_str(&args, "prompts.create", "title")?;
    let content = required_str(&args, "prompts.create", "content")?;
    let description = optional_str(&args, "description");

    let prompt = ctx
        .service
        .create_or_update_prompt(Prompt::new(title, description, content))?;
    Ok(json!(prompt))
}

pub fn update(ctx: &Context, args: Value) -> Result<Value> {
    let id = required_id(&args, "prompts.update")?;
    if id == 0 {
        return Err(VaultError::invalid_args("prompts.update", "id must be non-zero"));
    }
    let title = required_str(&args, "prompts.update", "title")?;
    let content = required_str(&args, "prompts.update", "content")?;
    let description = optional_str(&args, "description");

    let mut prompt = Prompt::new(title, description, content);
    prompt.id = id;
    let prompt = ctx.service.create_or_update_prompt(prompt)?;
    Ok(json!(prompt))
}

pub fn delete(ctx: &Context, args: Value) -> Result<Value> {
    let id = required_id(&args, "prompts.delete")?;
    ctx.service.delete_prompt(id)?;
    Ok(json!({ "success": true }))
}

/// Rank all stored prompts against `query` (empty or missing matches all)
pub fn search(ctx: &Context, args: Value) -> Result<Value> {
    let query = optional_str(&args, "query");
    let prompts = ctx.service.get_all_prompts()?;

    let matches: Vec<Value> = search_prompts(&prompts, &query)
        .into_iter()
        .map(|m| {
            json!({
                "prompt": prompts[m.index],
                "index": m.index,
                "positions": m.matched_indexes,
                "score": m.score,
            })
        })
        .collect();

    Ok(json!({ "matches": matches }))
}

pub fn copy(ctx: &Context, args: Value) -> Result<Value> {
    let id = required_id(&args, "prompts.copy")?;
    let prompt = ctx.service.get_prompt_by_id(id)?;
    copy_to_clipboard(ctx.clipboard.as_ref(), &prompt)?;
    Ok(json!({ "success": true }))
}
