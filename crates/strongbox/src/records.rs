// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `strongbox owner`, `strongbox entry`, and `strongbox generate`.

use clap::Subcommand;
use secrecy::{ExposeSecret, SecretString};
use strongbox_core::{RecordId, StrongboxError};
use strongbox_vault::passwords::DEFAULT_GENERATED_LENGTH;
use strongbox_vault::{
    DecryptedEntry, EntryInput, Vault, generate_password, is_valid_email, mask_secret,
    password_strength,
};

use crate::status::{print_ok, print_warning};

#[derive(Subcommand, Debug)]
pub enum OwnerCommand {
    /// List owners by name.
    List,
    /// Create an owner.
    Add { name: String },
    /// Delete an owner and every entry it holds.
    Remove { name: String },
}

#[derive(Subcommand, Debug)]
pub enum EntryCommand {
    /// List the entries of an owner, newest first.
    List {
        owner: String,
        /// Print passwords in clear text.
        #[arg(long)]
        show: bool,
    },
    /// Add an entry. The password is prompted for unless `--generate` is set.
    Add {
        owner: String,
        #[arg(long)]
        site: String,
        #[arg(long)]
        username: String,
        #[arg(long, default_value = "")]
        email: String,
        /// Use a generated password.
        #[arg(long)]
        generate: bool,
        /// Length of the generated password.
        #[arg(long, default_value_t = DEFAULT_GENERATED_LENGTH)]
        length: usize,
    },
    /// Change fields of an existing entry.
    Update {
        id: RecordId,
        #[arg(long)]
        site: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Prompt for a new password.
        #[arg(long, conflicts_with = "generate")]
        password: bool,
        /// Replace the password with a generated one.
        #[arg(long)]
        generate: bool,
    },
    /// Delete an entry.
    Remove { id: RecordId },
    /// Find entries of an owner by site, username, or email.
    Search { owner: String, query: String },
}

pub async fn run_owner(
    vault: &Vault,
    action: OwnerCommand,
    use_color: bool,
) -> Result<(), StrongboxError> {
    match action {
        OwnerCommand::List => {
            let owners = vault.list_owners().await?;
            if owners.is_empty() {
                println!("  No owners yet. Add one with `strongbox owner add <name>`.");
            }
            for owner in owners {
                let entries = vault.list_entries(owner.id).await?.len();
                println!("  {:>4}  {}  ({entries} entries)", owner.id, owner.name);
            }
        }
        OwnerCommand::Add { name } => {
            let name = name.trim();
            if name.is_empty() {
                return Err(StrongboxError::Config("owner name cannot be empty".to_string()));
            }
            let owner = vault.create_owner(name).await?;
            print_ok(&format!("owner `{}` created (id {})", owner.name, owner.id), use_color);
        }
        OwnerCommand::Remove { name } => {
            let owner = vault.owner_by_name(&name).await?;
            vault.delete_owner(owner.id).await?;
            print_ok(&format!("owner `{name}` and its entries removed"), use_color);
        }
    }
    Ok(())
}

pub async fn run_entry(
    vault: &Vault,
    action: EntryCommand,
    use_color: bool,
) -> Result<(), StrongboxError> {
    match action {
        EntryCommand::List { owner, show } => {
            let owner = vault.owner_by_name(&owner).await?;
            let entries = vault.list_entries(owner.id).await?;
            print_entries(&entries, show);
        }
        EntryCommand::Add {
            owner,
            site,
            username,
            email,
            generate,
            length,
        } => {
            let owner = vault.owner_by_name(&owner).await?;
            check_email(&email, use_color);
            let password = if generate {
                generate_password(length)
            } else {
                strongbox_crypto::prompt_secret("Entry password: ")?
            };
            report_strength(&password, use_color);
            let input = EntryInput {
                site,
                username,
                email,
                password,
            };
            let id = vault.add_entry(owner.id, &input).await?;
            print_ok(&format!("entry {id} added for `{}`", owner.name), use_color);
        }
        EntryCommand::Update {
            id,
            site,
            username,
            email,
            password,
            generate,
        } => {
            let current = vault.get_entry(id).await?;
            if let Some(email) = &email {
                check_email(email, use_color);
            }
            let new_password = if generate {
                Some(generate_password(DEFAULT_GENERATED_LENGTH))
            } else if password {
                Some(strongbox_crypto::prompt_secret("New entry password: ")?)
            } else {
                None
            };
            if let Some(password) = &new_password {
                report_strength(password, use_color);
            }
            let input = EntryInput {
                site: site.unwrap_or(current.site),
                username: username.unwrap_or(current.username),
                email: email.unwrap_or(current.email),
                password: new_password.unwrap_or(current.password),
            };
            vault.update_entry(id, &input).await?;
            print_ok(&format!("entry {id} updated"), use_color);
        }
        EntryCommand::Remove { id } => {
            vault.delete_entry(id).await?;
            print_ok(&format!("entry {id} removed"), use_color);
        }
        EntryCommand::Search { owner, query } => {
            let owner = vault.owner_by_name(&owner).await?;
            let entries = vault.search_entries(owner.id, &query).await?;
            print_entries(&entries, false);
        }
    }
    Ok(())
}

pub fn run_generate(length: usize, use_color: bool) {
    let password = generate_password(length);
    println!("{}", password.expose_secret());
    report_strength(&password, use_color);
}

fn print_entries(entries: &[DecryptedEntry], show: bool) {
    if entries.is_empty() {
        println!("  No entries.");
        return;
    }
    for entry in entries {
        println!("{}", format_entry(entry, show));
    }
}

fn format_entry(entry: &DecryptedEntry, show: bool) -> String {
    let password = if show {
        entry.password.expose_secret().to_string()
    } else {
        mask_secret(entry.password.expose_secret())
    };
    let email = if entry.email.is_empty() {
        String::new()
    } else {
        format!(" <{}>", entry.email)
    };
    format!(
        "  {:>4}  {}  {}{email}  {password}  (updated {})",
        entry.id,
        entry.site,
        entry.username,
        entry.updated_at.format("%Y-%m-%d %H:%M")
    )
}

fn check_email(email: &str, use_color: bool) {
    if !is_valid_email(email) {
        print_warning(&format!("`{email}` does not look like an email address"), use_color);
    }
}

fn report_strength(password: &SecretString, use_color: bool) {
    let strength = password_strength(password.expose_secret());
    let line = format!("password strength: {} ({}/7)", strength.label, strength.score);
    if strength.score < 4 {
        print_warning(&line, use_color);
    } else {
        eprintln!("  {line}");
    }
}
