// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Artifact rendering.
//!
//! QR codes and certificates are rendered after the transition that
//! produced them has committed. Rendering failures never undo a
//! transition: callers log them and report a warning.

use give_pulse_domain::{ArtifactKind, ArtifactPayload, CertificatePayload, QrPayload};
use give_pulse_persistence::SqlitePersistence;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Directory under the media root holding QR code documents.
pub const QR_DIRECTORY: &str = "qr_codes";

/// Directory under the media root holding certificate documents.
pub const CERTIFICATE_DIRECTORY: &str = "certificates";

/// Errors raised while producing or recording an artifact.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The payload could not be built from the stored record.
    #[error("invalid artifact payload: {0}")]
    InvalidPayload(String),

    /// The payload was handed to the wrong renderer.
    #[error("expected a {expected} payload, got {actual}")]
    WrongKind {
        expected: &'static str,
        actual: &'static str,
    },

    /// The document could not be encoded.
    #[error("failed to encode artifact: {0}")]
    Encoding(#[from] serde_json::Error),

    /// The document could not be written.
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The rendered reference could not be stored.
    #[error("failed to record artifact reference: {0}")]
    Storage(String),
}

/// Turns artifact payloads into stored documents.
///
/// Implementations return a reference to the produced artifact, usually a
/// path relative to the media root.
pub trait ArtifactRenderer {
    /// Renders an appointment QR code.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be produced.
    fn render_qr(&self, payload: &ArtifactPayload) -> Result<String, ArtifactError>;

    /// Renders a donation certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be produced.
    fn render_certificate(&self, payload: &ArtifactPayload) -> Result<String, ArtifactError>;
}

/// Writes each payload as a JSON document under a media root.
#[derive(Debug, Clone)]
pub struct FileArtifactRenderer {
    media_root: PathBuf,
}

impl FileArtifactRenderer {
    #[must_use]
    pub fn new(media_root: impl Into<PathBuf>) -> Self {
        Self {
            media_root: media_root.into(),
        }
    }

    #[must_use]
    pub fn media_root(&self) -> &Path {
        &self.media_root
    }

    fn write(
        &self,
        payload: &ArtifactPayload,
        expected: ArtifactKind,
        directory: &str,
        file_name: String,
    ) -> Result<String, ArtifactError> {
        if payload.kind != expected {
            return Err(ArtifactError::WrongKind {
                expected: expected.as_str(),
                actual: payload.kind.as_str(),
            });
        }
        if file_name.contains(['/', '\\']) {
            return Err(ArtifactError::InvalidPayload(format!(
                "subject '{}' is not a valid file name",
                payload.subject
            )));
        }

        let dir: PathBuf = self.media_root.join(directory);
        std::fs::create_dir_all(&dir).map_err(|source| ArtifactError::Io {
            path: dir.display().to_string(),
            source,
        })?;

        let path: PathBuf = dir.join(&file_name);
        let document: Vec<u8> = serde_json::to_vec_pretty(payload)?;
        std::fs::write(&path, document).map_err(|source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        })?;

        debug!(path = %path.display(), "Wrote artifact");
        Ok(format!("{directory}/{file_name}"))
    }
}

impl ArtifactRenderer for FileArtifactRenderer {
    fn render_qr(&self, payload: &ArtifactPayload) -> Result<String, ArtifactError> {
        self.write(
            payload,
            ArtifactKind::QrCode,
            QR_DIRECTORY,
            format!("qr_appointment_{}.json", payload.subject),
        )
    }

    fn render_certificate(&self, payload: &ArtifactPayload) -> Result<String, ArtifactError> {
        self.write(
            payload,
            ArtifactKind::Certificate,
            CERTIFICATE_DIRECTORY,
            format!("certificate_{}.json", payload.subject),
        )
    }
}

/// Renders an appointment's QR code and stores the reference.
///
/// # Errors
///
/// Returns an error if the payload is malformed, rendering fails, or the
/// reference cannot be stored.
pub fn issue_qr(
    persistence: &mut SqlitePersistence,
    renderer: &dyn ArtifactRenderer,
    payload: &QrPayload,
) -> Result<String, ArtifactError> {
    let document: ArtifactPayload = payload
        .to_artifact_payload()
        .map_err(|e| ArtifactError::InvalidPayload(e.to_string()))?;
    let reference: String = renderer.render_qr(&document)?;
    persistence
        .set_qr_artifact(payload.appointment_id, &reference)
        .map_err(|e| ArtifactError::Storage(e.to_string()))?;

    info!(
        appointment_id = payload.appointment_id,
        reference = %reference,
        "Issued QR code"
    );
    Ok(reference)
}

/// Renders a donation certificate and stores the reference.
///
/// # Errors
///
/// Returns an error if rendering fails or the reference cannot be stored.
pub fn issue_certificate(
    persistence: &mut SqlitePersistence,
    renderer: &dyn ArtifactRenderer,
    donation_id: i64,
    payload: &CertificatePayload,
) -> Result<String, ArtifactError> {
    let reference: String = renderer.render_certificate(&payload.to_artifact_payload())?;
    persistence
        .set_certificate_artifact(donation_id, &reference)
        .map_err(|e| ArtifactError::Storage(e.to_string()))?;

    info!(
        donation_id,
        serial = %payload.serial,
        reference = %reference,
        "Issued certificate"
    );
    Ok(reference)
}
