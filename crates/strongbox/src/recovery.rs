// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `strongbox recovery` subcommands.

use std::io::{BufRead, Write};

use clap::Subcommand;
use strongbox_core::StrongboxError;
use strongbox_vault::Vault;

use crate::questions::{self, QUESTIONS};
use crate::status::{print_error, print_ok, print_warning};

#[derive(Subcommand, Debug)]
pub enum RecoveryCommand {
    /// Choose a security question and store its answer.
    Set {
        /// Question number; prompts with the catalog when omitted.
        #[arg(long)]
        question: Option<u32>,
    },
    /// Replace a forgotten master password. Deletes every owner and entry.
    Reset {
        /// Confirm that all stored data will be deleted.
        #[arg(long)]
        yes: bool,
    },
}

pub async fn run_recovery(
    vault: &Vault,
    action: RecoveryCommand,
    use_color: bool,
) -> Result<(), StrongboxError> {
    match action {
        RecoveryCommand::Set { question } => {
            set_question_interactive(vault, question, use_color).await
        }
        RecoveryCommand::Reset { yes } => run_reset(vault, yes, use_color).await.map(|_| ()),
    }
}

/// Pick a question (unless given), prompt for the answer, and save both.
pub async fn set_question_interactive(
    vault: &Vault,
    question: Option<u32>,
    use_color: bool,
) -> Result<(), StrongboxError> {
    let question_id = match question {
        Some(id) => id,
        None => choose_question()?,
    };
    let text = questions::lookup(question_id).ok_or_else(|| {
        StrongboxError::Config(format!(
            "unknown security question {question_id}; choose 1-{}",
            QUESTIONS.len()
        ))
    })?;
    println!("  {text}");
    let answer = strongbox_crypto::prompt_secret("Answer: ")?;
    vault
        .recovery()
        .save_recovery_question(question_id, &answer)
        .await?;
    print_ok("security question saved", use_color);
    Ok(())
}

fn choose_question() -> Result<u32, StrongboxError> {
    for (id, text) in QUESTIONS {
        println!("  {id}. {text}");
    }
    print!("  Question number: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    parse_choice(&line)
}

fn parse_choice(line: &str) -> Result<u32, StrongboxError> {
    line.trim()
        .parse::<u32>()
        .ok()
        .filter(|id| questions::lookup(*id).is_some())
        .ok_or_else(|| {
            StrongboxError::Config(format!(
                "`{}` is not a question number between 1 and {}",
                line.trim(),
                QUESTIONS.len()
            ))
        })
}

/// Answer the security question and set a new master password.
///
/// Returns `Ok(false)` when the reset was not confirmed or the answer was
/// wrong; nothing is deleted in either case.
pub async fn run_reset(vault: &Vault, yes: bool, use_color: bool) -> Result<bool, StrongboxError> {
    let Some(question_id) = vault.recovery().recovery_question_id().await? else {
        return Err(StrongboxError::NotConfigured(
            "security question; recovery is unavailable".to_string(),
        ));
    };
    if !yes {
        print_warning(
            "resetting the master password permanently deletes every owner and entry",
            use_color,
        );
        eprintln!("  Re-run with `strongbox recovery reset --yes` to continue.");
        return Ok(false);
    }

    println!("  {}", questions::text_for(question_id));
    let answer = strongbox_crypto::prompt_secret("Answer: ")?;
    if !vault.recovery().verify_answer(&answer).await? {
        print_error("incorrect answer", use_color);
        return Ok(false);
    }
    let new_password = strongbox_crypto::get_master_password_with_confirm()?;
    if !vault
        .recovery()
        .reset_master_credential(&answer, &new_password)
        .await?
    {
        print_error("incorrect answer", use_color);
        return Ok(false);
    }
    print_ok("master password reset; all owners and entries were deleted", use_color);
    Ok(true)
}
