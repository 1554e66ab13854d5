//! # Wizard Step Machine
//!
//! The ownership-verification wizard walks four steps in a fixed order:
//!
//! ```text
//! Email ──▶ Code ──▶ Documents ──▶ Success (terminal)
//! ```
//!
//! There is no backward navigation and no skipping. A failed submission
//! leaves the step unchanged; only a successful one advances, and every
//! advance is appended to the transition log.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use carwatch_core::Timestamp;

/// A step of the ownership-verification wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum WizardStep {
    /// Collect the owner's email and send a code.
    Email = 1,
    /// Collect the 6-character code.
    Code = 2,
    /// Collect the license and ownership documents.
    Documents = 3,
    /// Request submitted for review (terminal).
    Success = 4,
}

impl WizardStep {
    /// Position of the step, starting at 1.
    pub fn number(&self) -> u8 {
        *self as u8
    }

    /// The following step, if any.
    pub fn next(&self) -> Option<WizardStep> {
        match self {
            Self::Email => Some(Self::Code),
            Self::Code => Some(Self::Documents),
            Self::Documents => Some(Self::Success),
            Self::Success => None,
        }
    }

    /// Whether this step admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Stable lowercase label, used in logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Code => "code",
            Self::Documents => "documents",
            Self::Success => "success",
        }
    }
}

impl std::fmt::Display for WizardStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A submission arrived for a step the wizard is not on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardTransitionError {
    #[error("wizard is on step {current}, not {expected}")]
    WrongStep {
        /// The step the wizard is on.
        current: WizardStep,
        /// The step the submission belongs to.
        expected: WizardStep,
    },

    #[error("wizard already completed")]
    Completed,
}

/// Record of one step advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardTransitionRecord {
    pub from_step: WizardStep,
    pub to_step: WizardStep,
    pub timestamp: Timestamp,
}

/// Current step plus the ordered log of every advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardProgress {
    step: WizardStep,
    transitions: Vec<WizardTransitionRecord>,
}

impl Default for WizardProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardProgress {
    /// A fresh wizard on the email step.
    pub fn new() -> Self {
        Self {
            step: WizardStep::Email,
            transitions: Vec::new(),
        }
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn transitions(&self) -> &[WizardTransitionRecord] {
        &self.transitions
    }

    pub fn is_complete(&self) -> bool {
        self.step.is_terminal()
    }

    /// Check that a submission for `expected` may run now.
    pub fn require(&self, expected: WizardStep) -> Result<(), WizardTransitionError> {
        if self.step.is_terminal() {
            return Err(WizardTransitionError::Completed);
        }
        if self.step != expected {
            return Err(WizardTransitionError::WrongStep {
                current: self.step,
                expected,
            });
        }
        Ok(())
    }

    /// Advance from `expected` to the following step.
    pub fn advance_from(
        &mut self,
        expected: WizardStep,
        at: Timestamp,
    ) -> Result<WizardStep, WizardTransitionError> {
        self.require(expected)?;
        let to = self.step.next().ok_or(WizardTransitionError::Completed)?;
        self.transitions.push(WizardTransitionRecord {
            from_step: self.step,
            to_step: to,
            timestamp: at,
        });
        self.step = to;
        Ok(to)
    }
}
