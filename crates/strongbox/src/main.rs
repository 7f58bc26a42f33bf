// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Strongbox - a local-first encrypted credential vault.
//!
//! This is the binary entry point for the `strongbox` command line.

mod questions;
mod records;
mod recovery;
mod status;
mod transfer;

use std::io::IsTerminal;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use strongbox_config::model::StrongboxConfig;
use strongbox_core::StrongboxError;
use strongbox_vault::Vault;

/// Strongbox - a local-first encrypted credential vault.
#[derive(Parser, Debug)]
#[command(name = "strongbox", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output.
    #[arg(long, global = true)]
    plain: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the master password of a new vault.
    Init,
    /// Show vault, session, and sync state.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Manage owners.
    Owner {
        #[command(subcommand)]
        action: records::OwnerCommand,
    },
    /// Manage password entries.
    Entry {
        #[command(subcommand)]
        action: records::EntryCommand,
    },
    /// Write an encrypted sync file.
    Export {
        /// Directory to write into (default: sync.export_dir).
        #[arg(long)]
        dir: Option<PathBuf>,
    },
    /// Merge an encrypted sync file into this vault.
    Import {
        /// Path to a `.sbx` sync file.
        file: PathBuf,
    },
    /// Configure or use the security question.
    Recovery {
        #[command(subcommand)]
        action: recovery::RecoveryCommand,
    },
    /// Generate a random password.
    Generate {
        /// Password length (minimum 4).
        #[arg(long, default_value_t = strongbox_vault::passwords::DEFAULT_GENERATED_LENGTH)]
        length: usize,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup
    let loaded = match &cli.config {
        Some(path) => strongbox_config::load_and_validate_path(path),
        None => strongbox_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            strongbox_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.logging.level);
    tracing::debug!(
        backend = %config.storage.backend,
        config_file = ?cli.config,
        "configuration loaded"
    );

    let use_color = !cli.plain && std::io::stdout().is_terminal();
    match run(cli.command, &config, use_color).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            status::print_error(&e.to_string(), use_color);
            std::process::exit(1);
        }
    }
}

/// Run one command. `Ok(false)` means the master password was rejected.
async fn run(
    command: Commands,
    config: &StrongboxConfig,
    use_color: bool,
) -> Result<bool, StrongboxError> {
    if let Commands::Generate { length } = command {
        records::run_generate(length, use_color);
        return Ok(true);
    }

    let vault = Vault::open(config).await?;
    let result = match command {
        Commands::Init => init(&vault, use_color).await.map(|()| true),
        Commands::Status { json } => status::run_status(&vault, config, json, use_color)
            .await
            .map(|()| true),
        Commands::Recovery {
            action: recovery::RecoveryCommand::Reset { yes },
        } => recovery::run_reset(&vault, yes, use_color).await,
        other => match unlock(&vault).await {
            Ok(true) => dispatch_unlocked(other, &vault, config, use_color)
                .await
                .map(|()| true),
            Ok(false) => {
                status::print_error("wrong master password", use_color);
                Ok(false)
            }
            Err(e) => Err(e),
        },
    };

    let closed = vault.close().await;
    result.and_then(|ok| closed.map(|()| ok))
}

/// Commands that need the session key.
async fn dispatch_unlocked(
    command: Commands,
    vault: &Vault,
    config: &StrongboxConfig,
    use_color: bool,
) -> Result<(), StrongboxError> {
    match command {
        Commands::Owner { action } => records::run_owner(vault, action, use_color).await,
        Commands::Entry { action } => records::run_entry(vault, action, use_color).await,
        Commands::Export { dir } => transfer::run_export(vault, config, dir).await,
        Commands::Import { file } => transfer::run_import(vault, &file, use_color).await,
        Commands::Recovery { action } => recovery::run_recovery(vault, action, use_color).await,
        Commands::Init | Commands::Status { .. } | Commands::Generate { .. } => Err(
            StrongboxError::Internal("command does not need an unlocked vault".to_string()),
        ),
    }
}

/// Create the master password, then optionally the security question.
async fn init(vault: &Vault, use_color: bool) -> Result<(), StrongboxError> {
    if vault.auth().has_master_credential().await? {
        return Err(StrongboxError::Conflict(
            "vault already initialized; use `strongbox recovery reset` to replace a forgotten password"
                .to_string(),
        ));
    }
    let password = strongbox_crypto::get_master_password_with_confirm()?;
    vault.auth().create_master_credential(&password).await?;
    status::print_ok("vault created", use_color);

    if std::io::stdin().is_terminal() {
        println!("  Set a security question now to allow password recovery.");
        recovery::set_question_interactive(vault, None, use_color).await?;
    }
    Ok(())
}

/// Unlock with the master password from the environment or a prompt.
async fn unlock(vault: &Vault) -> Result<bool, StrongboxError> {
    if !vault.auth().has_master_credential().await? {
        return Err(StrongboxError::NotConfigured(
            "master password; run `strongbox init` first".to_string(),
        ));
    }
    let password = strongbox_crypto::get_master_password()?;
    vault.auth().login(&password).await
}

/// Initialize the tracing subscriber with an EnvFilter.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("strongbox={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_loads_config_defaults() {
        let config = strongbox_config::load_and_validate_str("")
            .expect("default config should be valid");
        assert_eq!(config.session.inactivity_timeout_secs, 180);
    }

    #[test]
    fn parses_entry_add() {
        let cli = Cli::try_parse_from([
            "strongbox",
            "--plain",
            "entry",
            "add",
            "Alice",
            "--site",
            "example.com",
            "--username",
            "alice",
            "--generate",
        ])
        .unwrap();
        assert!(cli.plain);
        assert!(matches!(
            cli.command,
            Commands::Entry {
                action: records::EntryCommand::Add { .. }
            }
        ));
    }

    #[test]
    fn reset_requires_explicit_flag_to_skip_confirmation() {
        let cli = Cli::try_parse_from(["strongbox", "recovery", "reset"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Recovery {
                action: recovery::RecoveryCommand::Reset { yes: false }
            }
        ));
    }

    #[test]
    fn generate_defaults_to_sixteen() {
        let cli = Cli::try_parse_from(["strongbox", "generate"]).unwrap();
        assert!(matches!(cli.command, Commands::Generate { length: 16 }));
    }
}
