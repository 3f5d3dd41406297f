// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The kind of document an artifact renderer produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    /// Scannable appointment code.
    QrCode,
    /// Proof-of-donation certificate.
    Certificate,
}

impl ArtifactKind {
    /// Returns the string representation of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::QrCode => "qr_code",
            Self::Certificate => "certificate",
        }
    }
}

/// The data handed to an artifact renderer.
///
/// `subject` names the artifact (an appointment id or a certificate serial).
/// Entries are kept sorted so rendering is deterministic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactPayload {
    pub kind: ArtifactKind,
    pub subject: String,
    pub entries: BTreeMap<String, String>,
}

impl ArtifactPayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new(kind: ArtifactKind, subject: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Adds an entry, returning the payload for chaining.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl ToString) -> Self {
        self.entries.insert(key.to_string(), value.to_string());
        self
    }

    /// Looks up an entry.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }
}
