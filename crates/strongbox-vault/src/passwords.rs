// SPDX-FileCopyrightText: 2026 Strongbox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password generation and strength scoring.

use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use secrecy::SecretString;
use serde::Serialize;
use strum::{Display, IntoStaticStr};

const LOWERCASE: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const UPPERCASE: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"!@#$%^&*()_+-=[]{}|;:,.<>?";

/// Shortest password [`generate_password`] will produce.
pub const MIN_GENERATED_LENGTH: usize = 4;

/// Default length of generated passwords.
pub const DEFAULT_GENERATED_LENGTH: usize = 16;

/// Generate a random password from the OS CSPRNG.
///
/// The result holds at least one lowercase letter, uppercase letter, digit,
/// and symbol. Lengths below [`MIN_GENERATED_LENGTH`] are raised to it.
pub fn generate_password(length: usize) -> SecretString {
    let length = length.max(MIN_GENERATED_LENGTH);
    let mut rng = OsRng;
    let all: Vec<u8> = [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS].concat();

    let mut chars: Vec<u8> = Vec::with_capacity(length);
    for class in [LOWERCASE, UPPERCASE, DIGITS, SYMBOLS] {
        chars.extend(class.choose(&mut rng));
    }
    while chars.len() < length {
        chars.extend(all.choose(&mut rng));
    }
    chars.shuffle(&mut rng);

    SecretString::from(chars.into_iter().map(char::from).collect::<String>())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, IntoStaticStr, Serialize)]
pub enum StrengthLabel {
    #[strum(serialize = "Very Weak")]
    VeryWeak,
    Weak,
    Medium,
    Strong,
    #[strum(serialize = "Very Strong")]
    VeryStrong,
}

/// Score out of 7 and its label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordStrength {
    pub score: u8,
    pub label: StrengthLabel,
}

/// One point each for length of at least 8, 12, and 16 characters, and one
/// for each character class present.
pub fn password_strength(password: &str) -> PasswordStrength {
    let length = password.chars().count();
    let checks = [
        length >= 8,
        length >= 12,
        length >= 16,
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| !c.is_ascii_alphanumeric()),
    ];
    let score = checks.iter().filter(|&&passed| passed).count() as u8;
    let label = match score {
        0..=2 => StrengthLabel::VeryWeak,
        3..=4 => StrengthLabel::Weak,
        5 => StrengthLabel::Medium,
        6 => StrengthLabel::Strong,
        _ => StrengthLabel::VeryStrong,
    };
    PasswordStrength { score, label }
}

/// Loose `local@domain.tld` shape check. Empty input is accepted.
pub fn is_valid_email(email: &str) -> bool {
    if email.is_empty() {
        return true;
    }
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Mask a secret for display, keeping at most four characters at each end.
pub fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() < 10 {
        return "****".to_string();
    }
    let prefix: String = chars[..4].iter().collect();
    let suffix: String = chars[chars.len() - 4..].iter().collect();
    format!("{prefix}...{suffix}")
}
