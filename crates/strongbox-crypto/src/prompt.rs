// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Master password acquisition via TTY prompt or STRONGBOX_MASTER_PASSWORD.

use secrecy::SecretString;
use strongbox_core::StrongboxError;

/// The environment variable name for providing the master password.
pub const MASTER_PASSWORD_ENV_VAR: &str = "STRONGBOX_MASTER_PASSWORD";

fn from_env() -> Option<SecretString> {
    std::env::var(MASTER_PASSWORD_ENV_VAR)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn read_hidden(label: &str) -> Result<String, StrongboxError> {
    eprint!("{label}: ");
    rpassword::read_password()
        .map_err(|e| StrongboxError::Internal(format!("failed to read {label}: {e}")))
}

fn no_terminal() -> StrongboxError {
    StrongboxError::Config(format!(
        "no master password provided; set {MASTER_PASSWORD_ENV_VAR} or run interactively"
    ))
}

/// Get the master password from the environment or an interactive prompt.
pub fn get_master_password() -> Result<SecretString, StrongboxError> {
    if let Some(password) = from_env() {
        return Ok(password);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(no_terminal());
    }
    let password = read_hidden("Master password")?;
    if password.is_empty() {
        return Err(StrongboxError::Config("empty master password not allowed".to_string()));
    }
    Ok(SecretString::from(password))
}

/// Get a new master password, prompting twice when interactive.
pub fn get_master_password_with_confirm() -> Result<SecretString, StrongboxError> {
    if let Some(password) = from_env() {
        return Ok(password);
    }
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(no_terminal());
    }
    let first = read_hidden("New master password")?;
    let second = read_hidden("Confirm master password")?;
    if first != second {
        return Err(StrongboxError::Config("passwords do not match".to_string()));
    }
    if first.is_empty() {
        return Err(StrongboxError::Config("empty master password not allowed".to_string()));
    }
    Ok(SecretString::from(first))
}

/// Prompt for any other hidden value (entry password, recovery answer).
pub fn prompt_secret(label: &str) -> Result<SecretString, StrongboxError> {
    if !std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        return Err(StrongboxError::Config(format!(
            "{label} must be entered interactively"
        )));
    }
    read_hidden(label).map(SecretString::from)
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use serial_test::serial;

    use super::*;

    #[test]
    #[serial]
    fn master_password_from_env_var() {
        // SAFETY: test-only env mutation, serialized by #[serial].
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "from-env") };
        let result = get_master_password();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "from-env");
    }

    #[test]
    #[serial]
    fn confirm_variant_accepts_env_var_without_prompting() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "from-env") };
        let result = get_master_password_with_confirm();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert!(result.is_ok());
    }

    #[test]
    #[serial]
    fn empty_env_var_is_rejected() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "") };
        // In CI/test, stdin is not a terminal, so this will fail.
        let result = get_master_password();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert!(result.is_err());
    }
}
