//! # Command Line Interface
//!
//! `kvtree` browses and edits a Vault KV v2 mount like a directory tree.
//! Connection settings come from the environment (see
//! [`VaultClientConfig::from_env`]); `--address` and `--mount` override them.

pub mod output;

use anyhow::Context;
use clap::{Parser, Subcommand};

use crate::config::VaultClientConfig;
use crate::context::SessionContext;
use crate::health::BackendHealthCheck;
use crate::kvstore::{Entry, Navigator};
use crate::observability::init_logging;
use crate::utils::{split_path, to_absolute};

#[derive(Parser)]
#[command(name = "kvtree")]
#[command(about = "Navigate a Vault KV v2 mount as a tree")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Vault address override
    #[arg(long, global = true)]
    pub address: Option<String>,

    /// KV v2 mount name override
    #[arg(long, global = true)]
    pub mount: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the children of a node
    Ls {
        /// Node path
        #[arg(default_value = "/")]
        path: String,
    },

    /// Create a node
    Mkdir { path: String },

    /// Delete a node
    Rmdir { path: String },

    /// Show the entries of a node, or a single entry
    Get { path: String, key: Option<String> },

    /// Write entries; `KEY=@FILE` stores the file content as binary value
    Put {
        path: String,
        #[arg(required = true, value_name = "KEY=VALUE")]
        entries: Vec<String>,
    },

    /// Delete one entry of a node
    Rm { path: String, key: String },

    /// Show the state of the Vault server
    Health,
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.json_logs);

    let mut config = VaultClientConfig::from_env()?;
    if let Some(address) = cli.address {
        config = config.with_address(address);
    }
    if let Some(mount) = cli.mount {
        config = config.with_mount_name(mount);
    }
    let session = SessionContext::from_config(&config)?;

    handle_command(cli.command, &session).await
}

/// Execute one command against the given session.
pub async fn handle_command(command: Commands, session: &SessionContext) -> anyhow::Result<()> {
    match command {
        Commands::Ls { path } => {
            let children = output::check(navigator(session, &path)?.list().await)?;
            output::print_children(&children);
        }
        Commands::Mkdir { path } => {
            let created = Navigator::root(session).create(&normalize(&path)).await?;
            let created = output::check(created)?;
            println!("Created {}", created.path());
        }
        Commands::Rmdir { path } => {
            let node = navigator(session, &path)?;
            output::check(node.delete().await)?;
            println!("Deleted {}", node.path());
        }
        Commands::Get { path, key } => {
            let manager = output::check(navigator(session, &path)?.get_node_manager())?;
            match key {
                Some(key) => {
                    let entry = manager.read_key(&key).await?.map(|entry| vec![entry]);
                    output::print_entries(&output::check(entry)?)
                }
                None => output::print_entries(&output::check(manager.read().await)?),
            }
        }
        Commands::Put { path, entries } => {
            let entries = entries
                .iter()
                .map(String::as_str)
                .map(parse_assignment)
                .collect::<anyhow::Result<Vec<_>>>()?;
            let manager = output::check(navigator(session, &path)?.get_node_manager())?;
            output::print_entries(&output::check(manager.write_all(entries).await)?);
        }
        Commands::Rm { path, key } => {
            let manager = output::check(navigator(session, &path)?.get_node_manager())?;
            output::check(manager.delete(&key).await)?;
            println!("Deleted {} from {}", key, manager.navigator().path());
        }
        Commands::Health => {
            let info = BackendHealthCheck::new(session.clone()).retrieve_server_info().await;
            output::print_json(&info)?;
        }
    }
    Ok(())
}

/// Accept paths with or without the leading '/'.
fn normalize(path: &str) -> String {
    to_absolute(&split_path(path))
}

fn navigator(session: &SessionContext, path: &str) -> anyhow::Result<Navigator> {
    Ok(Navigator::new(session.clone(), &normalize(path))?)
}

/// Parse `KEY=VALUE`; a value of `@FILE` reads the file as bytes.
pub fn parse_assignment(raw: &str) -> anyhow::Result<Entry> {
    let (key, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got '{}'", raw))?;
    if key.is_empty() {
        anyhow::bail!("Key must not be empty in '{}'", raw);
    }
    match value.strip_prefix('@') {
        Some(file) => {
            let bytes =
                std::fs::read(file).with_context(|| format!("Failed to read file '{}'", file))?;
            Ok(Entry::of(key, bytes))
        }
        None => Ok(Entry::of(key, value)),
    }
}
