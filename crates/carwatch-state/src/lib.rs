//! # carwatch-state -- Ownership Verification Domain Logic
//!
//! Everything about ownership verification that can be decided without
//! touching the network lives here. The orchestration crate feeds these
//! types with store results and clock readings; nothing in this crate
//! performs IO or reads the system time.
//!
//! ## Modules
//!
//! - **Code** (`code.rs`): 6-character uppercase alphanumeric codes,
//!   generation, input normalization, constant-time comparison.
//!
//! - **Verification** (`verification.rs`): the `ownership_verification`
//!   record, its 24-hour code window, one-shot document attachment, and the
//!   review lifecycle (`pending → verified | rejected | expired`).
//!
//! - **Wizard** (`wizard.rs`): the strictly linear
//!   `email → code → documents → success` step machine with a transition
//!   log.
//!
//! - **Forms** (`forms.rs`): typed form records for each wizard step with
//!   pure validation, separate from submission side effects.

pub mod code;
pub mod forms;
pub mod verification;
pub mod wizard;

pub use code::{CodeFormatError, VerificationCode, CODE_LENGTH};

pub use forms::{
    CodeForm, DocumentFile, DocumentPair, DocumentSlot, DocumentSource, DocumentsForm, EmailForm,
    FormError,
};

pub use verification::{
    DocumentAttachment, DocumentUrls, StatusChange, VerificationError, VerificationRequest,
    VerificationStatus, CODE_TTL_HOURS,
};

pub use wizard::{WizardProgress, WizardStep, WizardTransitionError, WizardTransitionRecord};
