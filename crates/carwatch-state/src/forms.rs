//! # Wizard Forms
//!
//! One typed record per wizard step. `validate()` is pure: it never touches
//! the store, so a rejected form is guaranteed to cause no side effects.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use carwatch_core::{CarId, EmailAddress, ValidationError};

use crate::code::{CodeFormatError, VerificationCode};

const DEFAULT_EXTENSION: &str = "jpg";

/// A form that failed validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid email address: {0}")]
    Email(#[from] ValidationError),

    #[error(transparent)]
    Code(#[from] CodeFormatError),

    #[error("{0} document is required")]
    MissingDocument(DocumentSlot),
}

// ─── Email ───────────────────────────────────────────────────────────

/// The email step's single field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmailForm {
    pub email: String,
}

impl EmailForm {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    pub fn validate(&self) -> Result<EmailAddress, FormError> {
        Ok(EmailAddress::new(self.email.as_str())?)
    }
}

// ─── Code ────────────────────────────────────────────────────────────

/// The code step's single field, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeForm {
    pub code: String,
}

impl CodeForm {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// Normalize (trim, upper-case) and validate the entered code.
    pub fn validate(&self) -> Result<VerificationCode, FormError> {
        Ok(VerificationCode::parse(&self.code)?)
    }
}

// ─── Documents ───────────────────────────────────────────────────────

/// Which of the two required documents a file fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSlot {
    /// Driving license.
    License,
    /// Ownership certificate.
    Ownership,
}

impl DocumentSlot {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::License => "license",
            Self::Ownership => "ownership",
        }
    }

    /// Storage object path: `{slot}_{car_id}_{stamp}.{ext}`, where `stamp`
    /// is an epoch-milliseconds upload stamp.
    pub fn object_path(&self, car_id: CarId, stamp: i64, file: &DocumentFile) -> String {
        format!("{}_{}_{}.{}", self.as_str(), car_id, stamp, file.extension())
    }
}

impl std::fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a file reached the form. Display only; both paths attach the same way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    #[default]
    Picker,
    DragDrop,
}

/// A file chosen for upload.
#[derive(Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    /// Build a file, inferring the content type from the name when none is
    /// given.
    pub fn new(name: impl Into<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        let name = name.into();
        let content_type = content_type
            .filter(|ct| !ct.trim().is_empty())
            .unwrap_or_else(|| content_type_for(&extension_of(&name)).to_string());
        Self {
            name,
            content_type,
            bytes,
        }
    }

    /// Lower-cased extension from the file name, `jpg` when absent.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for DocumentFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentFile")
            .field("name", &self.name)
            .field("content_type", &self.content_type)
            .field("bytes", &format_args!("[{} bytes]", self.bytes.len()))
            .finish()
    }
}

fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => DEFAULT_EXTENSION.to_string(),
    }
}

fn content_type_for(ext: &str) -> &'static str {
    match ext {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

/// Both documents, ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPair {
    pub license: DocumentFile,
    pub ownership: DocumentFile,
}

/// The documents step: two slots, each optionally filled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentsForm {
    license: Option<(DocumentFile, DocumentSource)>,
    ownership: Option<(DocumentFile, DocumentSource)>,
}

impl DocumentsForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill `slot`, replacing any file already there.
    pub fn attach(&mut self, slot: DocumentSlot, file: DocumentFile, source: DocumentSource) {
        let entry = Some((file, source));
        match slot {
            DocumentSlot::License => self.license = entry,
            DocumentSlot::Ownership => self.ownership = entry,
        }
    }

    pub fn file(&self, slot: DocumentSlot) -> Option<&DocumentFile> {
        self.entry(slot).map(|(file, _)| file)
    }

    pub fn source(&self, slot: DocumentSlot) -> Option<DocumentSource> {
        self.entry(slot).map(|(_, source)| *source)
    }

    fn entry(&self, slot: DocumentSlot) -> Option<&(DocumentFile, DocumentSource)> {
        match slot {
            DocumentSlot::License => self.license.as_ref(),
            DocumentSlot::Ownership => self.ownership.as_ref(),
        }
    }

    /// Both slots must be filled. License is checked first.
    pub fn validate(&self) -> Result<DocumentPair, FormError> {
        let license = self
            .file(DocumentSlot::License)
            .ok_or(FormError::MissingDocument(DocumentSlot::License))?;
        let ownership = self
            .file(DocumentSlot::Ownership)
            .ok_or(FormError::MissingDocument(DocumentSlot::Ownership))?;
        Ok(DocumentPair {
            license: license.clone(),
            ownership: ownership.clone(),
        })
    }
}
