//! # carwatch-verification -- Ownership verification flows
//!
//! Orchestrates the pure rules in `carwatch-state` over a shared
//! [`DataStore`](carwatch_store::DataStore):
//!
//! - [`OwnershipVerificationWizard`]: the owner-facing four-step flow
//!   (email, code, documents, success) for one car.
//! - [`VerificationReview`]: the administrator queue that approves, rejects
//!   or expires pending requests.
//! - [`VerificationRepository`]: typed rows over the `ownership_verification`
//!   and `cars` tables and the `car-images` bucket.
//!
//! Time comes from an injected [`Clock`](carwatch_core::Clock), so expiry can
//! be tested without waiting. Steps emit `tracing` events and increment
//! `metrics` counters; no recorder or subscriber is installed here.

pub mod error;
pub mod repository;
pub mod review;
pub mod wizard;

pub use error::{ReviewError, WizardError};
pub use repository::{
    CarSummary, VerificationRepository, CARS_TABLE, DOCUMENT_BUCKET, VERIFICATION_TABLE,
};
pub use review::{StatusFilter, VerificationReview};
pub use wizard::{OwnershipVerificationWizard, Redirect, WizardConfig};
