//! Errors surfaced by the verification flows.

use thiserror::Error;

use carwatch_core::{CarId, Timestamp, VerificationId};
use carwatch_state::{FormError, VerificationError, WizardTransitionError};
use carwatch_store::StoreError;

/// A wizard step failed. The wizard stays on the same step.
#[derive(Error, Debug)]
pub enum WizardError {
    /// Input rejected before any store call.
    #[error("{0}")]
    Validation(#[from] FormError),

    /// No verification request exists for this car and email.
    #[error("no verification request found for this car and email")]
    NotFound,

    /// The entered code differs from the latest issued code.
    #[error("incorrect verification code")]
    Mismatch,

    /// The code matched but its 24-hour window has closed.
    #[error("verification code expired at {expired_at}")]
    Expired { expired_at: Timestamp },

    /// The car being verified does not exist.
    #[error("car {0} not found")]
    UnknownCar(CarId),

    /// The record refused the change.
    #[error(transparent)]
    Record(VerificationError),

    /// Backend call failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Operation called on the wrong step.
    #[error(transparent)]
    OutOfStep(#[from] WizardTransitionError),
}

impl From<VerificationError> for WizardError {
    fn from(err: VerificationError) -> Self {
        match err {
            VerificationError::CodeMismatch => Self::Mismatch,
            VerificationError::CodeExpired { expired_at } => Self::Expired { expired_at },
            other => Self::Record(other),
        }
    }
}

impl WizardError {
    /// Stable label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound => "not_found",
            Self::Mismatch => "mismatch",
            Self::Expired { .. } => "expired",
            Self::UnknownCar(_) => "unknown_car",
            Self::Record(_) => "record",
            Self::Store(_) => "store",
            Self::OutOfStep(_) => "out_of_step",
        }
    }
}

/// A review action failed. The record is unchanged.
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("verification {0} not found")]
    NotFound(VerificationId),

    #[error(transparent)]
    Transition(#[from] VerificationError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_errors_map_to_dedicated_variants() {
        assert!(matches!(
            WizardError::from(VerificationError::CodeMismatch),
            WizardError::Mismatch
        ));
        let at = Timestamp::from_epoch_secs(0).unwrap();
        assert!(matches!(
            WizardError::from(VerificationError::CodeExpired { expired_at: at }),
            WizardError::Expired { expired_at } if expired_at == at
        ));
        let id = VerificationId::new();
        assert_eq!(
            WizardError::from(VerificationError::AlreadyVerified { id }).kind(),
            "record"
        );
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(WizardError::Mismatch.to_string(), "incorrect verification code");
        assert_eq!(
            WizardError::NotFound.to_string(),
            "no verification request found for this car and email"
        );
    }
}
