// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths and timer ordering.

use crate::diagnostic::ConfigError;
use crate::model::{StorageBackend, StrongboxConfig};

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &StrongboxConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    // Only the selected backend's path has to be usable.
    match config.storage.backend {
        StorageBackend::Sqlite if config.storage.database_path.trim().is_empty() => {
            errors.push(ConfigError::Validation {
                message: "storage.database_path must not be empty".to_string(),
            });
        }
        StorageBackend::Document if config.storage.document_path.trim().is_empty() => {
            errors.push(ConfigError::Validation {
                message: "storage.document_path must not be empty".to_string(),
            });
        }
        _ => {}
    }

    let session = &config.session;
    if session.inactivity_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.inactivity_timeout_secs must be greater than 0".to_string(),
        });
    }

    if session.check_interval_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "session.check_interval_secs must be greater than 0".to_string(),
        });
    } else if session.check_interval_secs > session.inactivity_timeout_secs {
        errors.push(ConfigError::Validation {
            message: format!(
                "session.check_interval_secs ({}) must not exceed session.inactivity_timeout_secs ({})",
                session.check_interval_secs, session.inactivity_timeout_secs
            ),
        });
    }

    let prefix = config.sync.file_prefix.trim();
    if prefix.is_empty() {
        errors.push(ConfigError::Validation {
            message: "sync.file_prefix must not be empty".to_string(),
        });
    } else if prefix.contains(['/', '\\']) {
        errors.push(ConfigError::Validation {
            message: format!("sync.file_prefix `{prefix}` must not contain path separators"),
        });
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "logging.level `{}` is not one of {}",
                config.logging.level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
