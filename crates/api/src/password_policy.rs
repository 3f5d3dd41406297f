// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Password rules for donor, staff and admin accounts.

use std::fmt;
use thiserror::Error;

/// A class of character a password must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharacterClass {
    Uppercase,
    Lowercase,
    Digit,
    Symbol,
}

impl CharacterClass {
    const ALL: [Self; 4] = [Self::Uppercase, Self::Lowercase, Self::Digit, Self::Symbol];

    const fn label(self) -> &'static str {
        match self {
            Self::Uppercase => "an uppercase letter",
            Self::Lowercase => "a lowercase letter",
            Self::Digit => "a digit",
            Self::Symbol => "a symbol",
        }
    }

    fn present_in(self, password: &str) -> bool {
        let mut chars = password.chars();
        match self {
            Self::Uppercase => chars.any(char::is_uppercase),
            Self::Lowercase => chars.any(char::is_lowercase),
            Self::Digit => chars.any(|c| c.is_ascii_digit()),
            Self::Symbol => chars.any(|c| !c.is_alphanumeric() && !c.is_whitespace()),
        }
    }
}

/// The character classes a password lacks, in policy order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingClasses(pub Vec<CharacterClass>);

impl fmt::Display for MissingClasses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels: Vec<&str> = self.0.iter().map(|class| class.label()).collect();
        write!(f, "{}", labels.join(", "))
    }
}

/// Password policy errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordPolicyError {
    #[error("Password must be at least {min_length} characters long")]
    TooShort { min_length: usize },

    #[error("Password must be at most {max_length} characters long")]
    TooLong { max_length: usize },

    #[error("Password must contain {missing}")]
    MissingCharacterClasses { missing: MissingClasses },

    #[error("Password must not be the account email")]
    MatchesEmail,

    #[error("Password and confirmation do not match")]
    ConfirmationMismatch,
}

/// Length bounds for account passwords. Every character class is required.
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            max_length: 128,
        }
    }
}

impl PasswordPolicy {
    /// Validates a new password for the account registered under `email`.
    ///
    /// Checks run in order: confirmation, length, character classes, email.
    ///
    /// # Errors
    ///
    /// Returns the first rule the password breaks.
    pub fn validate(
        &self,
        password: &str,
        confirmation: &str,
        email: &str,
    ) -> Result<(), PasswordPolicyError> {
        if password != confirmation {
            return Err(PasswordPolicyError::ConfirmationMismatch);
        }

        let length: usize = password.chars().count();
        if length < self.min_length {
            return Err(PasswordPolicyError::TooShort {
                min_length: self.min_length,
            });
        }
        if length > self.max_length {
            return Err(PasswordPolicyError::TooLong {
                max_length: self.max_length,
            });
        }

        let missing: Vec<CharacterClass> = missing_classes(password);
        if !missing.is_empty() {
            return Err(PasswordPolicyError::MissingCharacterClasses {
                missing: MissingClasses(missing),
            });
        }

        if password.eq_ignore_ascii_case(email.trim()) {
            return Err(PasswordPolicyError::MatchesEmail);
        }

        Ok(())
    }
}

fn missing_classes(password: &str) -> Vec<CharacterClass> {
    CharacterClass::ALL
        .into_iter()
        .filter(|class| !class.present_in(password))
        .collect()
}
