use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Args as ClapArgs, Parser, Subcommand};
use prompt_vault_core::clipboard::SystemClipboard;
use prompt_vault_core::commands::{self, Context};
use prompt_vault_core::config::VaultConfig;
use prompt_vault_core::{logging, open_service, VaultError};
use serde_json::{json, Value};

/// A personal vault for reusable prompts.
#[derive(Parser, Debug)]
#[command(
    name = "prompt-vault",
    version,
    about,
    arg_required_else_help = true,
    propagate_version = true
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug, Default)]
struct GlobalOpts {
    /// JSON config file ({"dbPath": ..., "debug": ..., "lockTimeoutMs": ...})
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Store file (defaults to <config dir>/proompt-vault/prompts.db)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short = 'd', long, global = true)]
    debug: bool,

    /// Append logs to this file instead of stderr
    #[arg(long = "log-file", global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List every stored prompt
    List,

    /// Show one prompt
    Get { id: i64 },

    /// Store a new prompt
    Add(AddCmd),

    /// Change fields of an existing prompt
    Edit(EditCmd),

    /// Delete a prompt (no error if it does not exist)
    Rm { id: i64 },

    /// Fuzzy-search prompt titles
    ///
    /// Examples:
    ///   prompt-vault search rev      # matches "Code review"
    ///   prompt-vault search ""       # everything, in ID order
    Search { query: String },

    /// Copy a prompt's content to the system clipboard
    Copy { id: i64 },

    /// Run a registry command with raw JSON arguments
    Call(CallCmd),
}

#[derive(ClapArgs, Debug)]
struct AddCmd {
    #[arg(short, long)]
    title: String,

    #[arg(short, long)]
    content: String,

    #[arg(short = 'D', long, default_value = "")]
    description: String,
}

#[derive(ClapArgs, Debug)]
struct EditCmd {
    id: i64,

    #[arg(short, long)]
    title: Option<String>,

    #[arg(short, long)]
    content: Option<String>,

    #[arg(short = 'D', long)]
    description: Option<String>,
}

#[derive(ClapArgs, Debug)]
struct CallCmd {
    /// Command name, e.g. "prompts.list"
    #[arg(required_unless_present = "list")]
    command: Option<String>,

    /// JSON arguments
    #[arg(default_value = "{}")]
    args: String,

    /// Print the registered command names
    #[arg(long)]
    list: bool,
}

/// Translate a subcommand into a registry command and its arguments
fn to_request(ctx: &Context, command: Commands) -> anyhow::Result<(String, Value)> {
    let request = match command {
        Commands::List => ("prompts.list".to_string(), json!({})),
        Commands::Get { id } => ("prompts.get".to_string(), json!({ "id": id })),
        Commands::Add(add) => (
            "prompts.create".to_string(),
            json!({
                "title": add.title,
                "content": add.content,
                "description": add.description,
            }),
        ),
        Commands::Edit(edit) => {
            let current = ctx.service.get_prompt_by_id(edit.id)?;
            (
                "prompts.update".to_string(),
                json!({
                    "id": edit.id,
                    "title": edit.title.unwrap_or(current.title),
                    "content": edit.content.unwrap_or(current.prompt_content),
                    "description": edit.description.unwrap_or(current.description),
                }),
            )
        },
        Commands::Rm { id } => ("prompts.delete".to_string(), json!({ "id": id })),
        Commands::Search { query } => ("prompts.search".to_string(), json!({ "query": query })),
        Commands::Copy { id } => ("prompts.copy".to_string(), json!({ "id": id })),
        Commands::Call(call) => {
            let args: Value = serde_json::from_str(&call.args)
                .with_context(|| format!("Arguments are not valid JSON: {}", call.args))?;
            (call.command.unwrap_or_default(), args)
        },
    };
    Ok(request)
}

/// Config file first, then command-line flags on top
fn resolve_config(global: &GlobalOpts) -> anyhow::Result<VaultConfig> {
    let mut config = match &global.config {
        Some(path) => VaultConfig::load(path)?,
        None => VaultConfig::default(),
    };

    if let Some(db) = &global.db {
        config.db_path = Some(db.clone());
    }
    config.debug |= global.debug;
    Ok(config)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Call(CallCmd { list: true, .. }) = &cli.command {
        for name in commands::list_commands() {
            println!("{}", name);
        }
        return Ok(());
    }

    let config = resolve_config(&cli.global)?;

    logging::init(config.debug, cli.global.log_file.as_deref())?;

    let service = open_service(&config)?;
    let ctx = Context::new(Arc::new(service), Arc::new(SystemClipboard::new()));

    let (command, args) = to_request(&ctx, cli.command)?;
    tracing::debug!(%command, "running command");
    let result = commands::dispatch(&ctx, &command, args)?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<VaultError>() {
                Some(vault_err) => {
                    tracing::error!(category = vault_err.category(), error = %vault_err, "command failed");
                    eprintln!("Error: {}", vault_err.user_message());
                },
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        },
    }
}
