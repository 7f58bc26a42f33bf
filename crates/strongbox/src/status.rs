// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `strongbox status` command implementation and shared output helpers.
//!
//! Status never asks for the master password: it reports what can be read
//! without the session key.

use serde::Serialize;
use strongbox_config::model::StrongboxConfig;
use strongbox_core::{HealthStatus, StrongboxError};
use strongbox_sync::describe_last_sync;
use strongbox_vault::Vault;

use crate::questions;

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub backend: String,
    pub healthy: bool,
    pub health_detail: Option<String>,
    pub initialized: bool,
    pub security_question: Option<String>,
    pub device_id: Option<String>,
    pub last_sync: Option<String>,
    pub last_sync_human: String,
    pub inactivity_timeout_secs: u64,
}

pub async fn run_status(
    vault: &Vault,
    config: &StrongboxConfig,
    json: bool,
    use_color: bool,
) -> Result<(), StrongboxError> {
    let (healthy, health_detail) = match vault.health_check().await? {
        HealthStatus::Healthy => (true, None),
        HealthStatus::Degraded(detail) => (true, Some(detail)),
        HealthStatus::Unhealthy(detail) => (false, Some(detail)),
    };
    let last_sync = vault.sync().last_sync_time().await?;

    let status = StatusResponse {
        backend: vault.backend_name().to_string(),
        healthy,
        health_detail,
        initialized: vault.auth().has_master_credential().await?,
        security_question: vault
            .recovery()
            .recovery_question_id()
            .await?
            .map(questions::text_for),
        device_id: vault.sync().device_id().await?,
        last_sync: last_sync.map(|at| strongbox_core::timestamp::format(&at)),
        last_sync_human: describe_last_sync(last_sync, chrono::Utc::now()),
        inactivity_timeout_secs: config.session.inactivity_timeout_secs,
    };

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        print_status(&status, use_color);
    }
    Ok(())
}

fn mark(ok: bool, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        if ok {
            "✓".green().to_string()
        } else {
            "✗".red().to_string()
        }
    } else if ok {
        "[OK]".to_string()
    } else {
        "[--]".to_string()
    }
}

fn print_status(status: &StatusResponse, use_color: bool) {
    println!();
    println!("  strongbox status");
    println!("  {}", "-".repeat(35));
    let health = match &status.health_detail {
        Some(detail) => format!("{} ({detail})", status.backend),
        None => status.backend.clone(),
    };
    println!("    Storage:   {} {health}", mark(status.healthy, use_color));
    println!(
        "    Vault:     {} {}",
        mark(status.initialized, use_color),
        if status.initialized {
            "initialized"
        } else {
            "not initialized (run `strongbox init`)"
        }
    );
    match &status.security_question {
        Some(question) => println!("    Recovery:  {} {question}", mark(true, use_color)),
        None => println!("    Recovery:  {} no security question", mark(false, use_color)),
    }
    println!(
        "    Device:    {}",
        status.device_id.as_deref().unwrap_or("unknown")
    );
    println!("    Last sync: {}", status.last_sync_human);
    println!(
        "    Auto-lock: after {}s idle",
        status.inactivity_timeout_secs
    );
    println!();
}

pub fn print_ok(message: &str, use_color: bool) {
    println!("  {} {message}", mark(true, use_color));
}

pub fn print_warning(message: &str, use_color: bool) {
    if use_color {
        use colored::Colorize;
        eprintln!("{} {message}", "warning:".yellow().bold());
    } else {
        eprintln!("warning: {message}");
    }
}

pub fn print_error(message: &str, use_color: bool) {
    if use_color {
        use colored::Colorize;
        eprintln!("{} {message}", "error:".red().bold());
    } else {
        eprintln!("error: {message}");
    }
}
