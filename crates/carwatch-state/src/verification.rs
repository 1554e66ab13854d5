//! # Ownership Verification Record
//!
//! One row of the `ownership_verification` table and the rules that govern
//! it.
//!
//! ## Lifecycle
//!
//! ```text
//!   issue ──▶ pending ──(documents attached, is_verified = true)──▶ pending
//!                │                                                  │
//!                │                 review                           │
//!                ├──▶ expired (terminal)                            │
//!                ├──▶ rejected (terminal) ◀─────────────────────────┤
//!                └─────────────────────────────────▶ verified ◀─────┘
//!                                                   (terminal, needs documents)
//! ```
//!
//! Attaching documents does not change `status`: the request stays
//! `pending` until a human reviewer approves or rejects it. `is_verified`
//! records that the requester proved control of the email address and
//! supplied both documents; it is set together with `verified_at`, once.
//!
//! Rows are never deleted. A fresh submission for the same car and email
//! creates a new row; the most recently created one is authoritative.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use carwatch_core::{CarId, EmailAddress, Timestamp, VerificationId};

use crate::code::VerificationCode;

/// Hours a verification code stays valid after issuance.
pub const CODE_TTL_HOURS: i64 = 24;

// ─── Status ──────────────────────────────────────────────────────────

/// Review status of a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Awaiting documents or human review.
    Pending,
    /// Approved by a reviewer (terminal).
    Verified,
    /// Rejected by a reviewer (terminal).
    Rejected,
    /// Closed without review (terminal).
    Expired,
}

impl VerificationStatus {
    /// All statuses, in review-queue display order.
    pub const ALL: [VerificationStatus; 4] = [
        Self::Pending,
        Self::Verified,
        Self::Rejected,
        Self::Expired,
    ];

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    /// The column value stored by the backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Verified => "verified",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VerificationStatus {
    type Err = VerificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VerificationError::UnknownStatus(s.to_string()))
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Rule violations on a verification record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    /// The entered code differs from the issued one.
    #[error("incorrect verification code")]
    CodeMismatch,

    /// The code matched but its window has closed.
    #[error("verification code expired at {expired_at}")]
    CodeExpired {
        /// When the code stopped being valid.
        expired_at: Timestamp,
    },

    /// Documents were already attached and the record marked verified.
    #[error("verification {id} already has documents attached")]
    AlreadyVerified {
        /// The record identifier.
        id: VerificationId,
    },

    /// Approval requires both document URLs.
    #[error("verification {id} cannot be approved without both documents")]
    DocumentsMissing {
        /// The record identifier.
        id: VerificationId,
    },

    /// Review transition not allowed from the current status.
    #[error("invalid verification transition: {from} -> {to}")]
    InvalidTransition {
        /// Current status.
        from: VerificationStatus,
        /// Attempted status.
        to: VerificationStatus,
    },

    /// A status string the backend does not use.
    #[error("unknown verification status: {0:?}")]
    UnknownStatus(String),
}

// ─── Patches ─────────────────────────────────────────────────────────

/// Public URLs of the two uploaded documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentUrls {
    /// Driving-license image.
    pub license: String,
    /// Ownership-certificate image.
    pub ownership: String,
}

/// Column patch written when documents are attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentAttachment {
    pub license_document_url: String,
    pub ownership_document_url: String,
    pub is_verified: bool,
    pub verified_at: Timestamp,
    pub status: VerificationStatus,
}

/// Column patch written by a review decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub status: VerificationStatus,
}

// ─── Record ──────────────────────────────────────────────────────────

/// A row of the `ownership_verification` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub id: VerificationId,
    pub car_id: CarId,
    pub owner_email: EmailAddress,
    pub verification_code: VerificationCode,
    pub created_at: Timestamp,
    pub code_expires_at: Timestamp,
    pub status: VerificationStatus,
    #[serde(default)]
    pub license_document_url: Option<String>,
    #[serde(default)]
    pub ownership_document_url: Option<String>,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub verified_at: Option<Timestamp>,
}

impl VerificationRequest {
    /// Issue a new pending request whose code expires `ttl` after `now`.
    pub fn issue(
        car_id: CarId,
        owner_email: EmailAddress,
        verification_code: VerificationCode,
        now: Timestamp,
        ttl: Duration,
    ) -> Self {
        Self {
            id: VerificationId::new(),
            car_id,
            owner_email,
            verification_code,
            created_at: now,
            code_expires_at: now.plus(ttl),
            status: VerificationStatus::Pending,
            license_document_url: None,
            ownership_document_url: None,
            is_verified: false,
            verified_at: None,
        }
    }

    /// Whether the code window has closed at `now`.
    ///
    /// The code is valid while `code_expires_at > now`.
    pub fn is_code_expired(&self, now: Timestamp) -> bool {
        self.code_expires_at <= now
    }

    /// Check an entered code against this request.
    ///
    /// The comparison runs before the expiry check, so a wrong code is
    /// reported as a mismatch even after the window closed.
    pub fn check_code(
        &self,
        candidate: &VerificationCode,
        now: Timestamp,
    ) -> Result<(), VerificationError> {
        if !self.verification_code.matches(candidate) {
            return Err(VerificationError::CodeMismatch);
        }
        if self.is_code_expired(now) {
            return Err(VerificationError::CodeExpired {
                expired_at: self.code_expires_at,
            });
        }
        Ok(())
    }

    /// Whether both document URLs are present.
    pub fn has_documents(&self) -> bool {
        self.license_document_url.is_some() && self.ownership_document_url.is_some()
    }

    /// Attach both document URLs and mark the request verified.
    ///
    /// Returns the column patch to persist. Fails if the record was already
    /// verified; `is_verified` and `verified_at` are only ever set once.
    pub fn attach_documents(
        &mut self,
        urls: DocumentUrls,
        now: Timestamp,
    ) -> Result<DocumentAttachment, VerificationError> {
        if self.is_verified || self.verified_at.is_some() {
            return Err(VerificationError::AlreadyVerified { id: self.id });
        }

        self.license_document_url = Some(urls.license.clone());
        self.ownership_document_url = Some(urls.ownership.clone());
        self.is_verified = true;
        self.verified_at = Some(now);

        Ok(DocumentAttachment {
            license_document_url: urls.license,
            ownership_document_url: urls.ownership,
            is_verified: true,
            verified_at: now,
            status: self.status,
        })
    }

    /// The patch `attach_documents` would produce, without mutating.
    ///
    /// Used to persist first and apply locally only once the store accepted
    /// the update.
    pub fn preview_attachment(
        &self,
        urls: DocumentUrls,
        now: Timestamp,
    ) -> Result<DocumentAttachment, VerificationError> {
        self.clone().attach_documents(urls, now)
    }

    /// Approve the request (PENDING → VERIFIED).
    pub fn approve(&mut self) -> Result<StatusChange, VerificationError> {
        self.require_pending(VerificationStatus::Verified)?;
        if !self.has_documents() {
            return Err(VerificationError::DocumentsMissing { id: self.id });
        }
        Ok(self.set_status(VerificationStatus::Verified))
    }

    /// Reject the request (PENDING → REJECTED).
    pub fn reject(&mut self) -> Result<StatusChange, VerificationError> {
        self.require_pending(VerificationStatus::Rejected)?;
        Ok(self.set_status(VerificationStatus::Rejected))
    }

    /// Close the request without review (PENDING → EXPIRED).
    pub fn expire(&mut self) -> Result<StatusChange, VerificationError> {
        self.require_pending(VerificationStatus::Expired)?;
        Ok(self.set_status(VerificationStatus::Expired))
    }

    fn require_pending(&self, target: VerificationStatus) -> Result<(), VerificationError> {
        if self.status != VerificationStatus::Pending {
            return Err(VerificationError::InvalidTransition {
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }

    fn set_status(&mut self, status: VerificationStatus) -> StatusChange {
        self.status = status;
        StatusChange { status }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
