// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `strongbox export` and `strongbox import`.

use std::path::{Path, PathBuf};

use strongbox_config::model::StrongboxConfig;
use strongbox_core::StrongboxError;
use strongbox_vault::Vault;

use crate::status::print_ok;

pub async fn run_export(
    vault: &Vault,
    config: &StrongboxConfig,
    dir: Option<PathBuf>,
) -> Result<(), StrongboxError> {
    vault.touch()?;
    let path = match dir {
        Some(dir) => vault.sync().save_sync_file(dir).await?,
        None => vault.sync().save_sync_file_default().await?,
    };
    println!("{}", path.display());
    eprintln!(
        "  Copy this file to another device and run `strongbox import` there. \
         It opens only with the same master password (default directory: {}).",
        config.sync.export_dir
    );
    Ok(())
}

pub async fn run_import(vault: &Vault, file: &Path, use_color: bool) -> Result<(), StrongboxError> {
    vault.touch()?;
    let report = vault.sync().load_sync_file(file).await?;
    if report.changed() {
        print_ok(&format!("merged {}", file.display()), use_color);
    } else {
        print_ok("already up to date", use_color);
    }
    println!("  {report}");
    Ok(())
}
