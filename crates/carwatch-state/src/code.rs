//! # Verification Codes
//!
//! A verification code is a short-lived shared secret proving control of an
//! email address: exactly six characters drawn from `A-Z0-9`.
//!
//! User input is normalized (trimmed, upper-cased) before validation, so
//! `a1b2c3` entered by hand matches an issued `A1B2C3`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Number of characters in a verification code.
pub const CODE_LENGTH: usize = 6;

const ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Input that cannot be a verification code.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodeFormatError {
    /// Wrong number of characters after trimming.
    #[error("verification code must be 6 characters, got {len}")]
    WrongLength {
        /// Characters supplied.
        len: usize,
    },

    /// A character outside `A-Z0-9`.
    #[error("verification code may only contain letters and digits, found {found:?}")]
    InvalidCharacter {
        /// The offending character.
        found: char,
    },
}

/// A 6-character uppercase alphanumeric verification code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Generate a fresh code from the given RNG.
    pub fn generate_with<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let code = (0..CODE_LENGTH)
            .map(|_| char::from(ALPHABET[rng.gen_range(0..ALPHABET.len())]))
            .collect();
        Self(code)
    }

    /// Normalize and validate user input.
    ///
    /// Surrounding whitespace is ignored and letters are upper-cased before
    /// the length and alphabet checks.
    pub fn parse(input: &str) -> Result<Self, CodeFormatError> {
        let normalized = input.trim().to_ascii_uppercase();

        let len = normalized.chars().count();
        if len != CODE_LENGTH {
            return Err(CodeFormatError::WrongLength { len });
        }
        if let Some(found) = normalized.chars().find(|c| !c.is_ascii_alphanumeric()) {
            return Err(CodeFormatError::InvalidCharacter { found });
        }

        Ok(Self(normalized))
    }

    /// Compare two codes in constant time.
    pub fn matches(&self, other: &VerificationCode) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }

    /// Access the code string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VerificationCode {
    type Error = CodeFormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<VerificationCode> for String {
    fn from(value: VerificationCode) -> Self {
        value.0
    }
}

impl std::fmt::Display for VerificationCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn parse_normalizes_case() {
        let code = VerificationCode::parse("a1b2c3").unwrap();
        assert_eq!(code.as_str(), "A1B2C3");
    }

    #[test]
    fn parse_ignores_surrounding_whitespace() {
        let code = VerificationCode::parse("  q7w8e9\n").unwrap();
        assert_eq!(code.as_str(), "Q7W8E9");
    }

    #[test]
    fn parse_rejects_wrong_length() {
        assert_eq!(
            VerificationCode::parse("ABC12"),
            Err(CodeFormatError::WrongLength { len: 5 })
        );
        assert_eq!(
            VerificationCode::parse("ABC1234"),
            Err(CodeFormatError::WrongLength { len: 7 })
        );
        assert_eq!(
            VerificationCode::parse(""),
            Err(CodeFormatError::WrongLength { len: 0 })
        );
    }

    #[test]
    fn parse_rejects_punctuation_and_non_ascii() {
        assert_eq!(
            VerificationCode::parse("AB-123"),
            Err(CodeFormatError::InvalidCharacter { found: '-' })
        );
        assert!(matches!(
            VerificationCode::parse("AB١٢٣4"),
            Err(CodeFormatError::InvalidCharacter { .. })
        ));
    }

    #[test]
    fn matches_is_exact() {
        let issued = VerificationCode::parse("A1B2C3").unwrap();
        assert!(issued.matches(&VerificationCode::parse("a1b2c3").unwrap()));
        assert!(!issued.matches(&VerificationCode::parse("A1B2C4").unwrap()));
    }

    #[test]
    fn seeded_generation_is_deterministic() {
        let a = VerificationCode::generate_with(&mut StdRng::seed_from_u64(7));
        let b = VerificationCode::generate_with(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn deserialization_rejects_malformed_codes() {
        assert!(serde_json::from_str::<VerificationCode>("\"ZZZ999\"").is_ok());
        assert!(serde_json::from_str::<VerificationCode>("\"abc\"").is_err());
    }

    proptest! {
        #[test]
        fn generated_codes_are_six_uppercase_alphanumerics(seed in any::<u64>()) {
            let code = VerificationCode::generate_with(&mut StdRng::seed_from_u64(seed));
            prop_assert_eq!(code.as_str().len(), CODE_LENGTH);
            prop_assert!(code
                .as_str()
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }

        #[test]
        fn generated_codes_survive_lowercase_entry(seed in any::<u64>()) {
            let issued = VerificationCode::generate_with(&mut StdRng::seed_from_u64(seed));
            let typed = issued.as_str().to_ascii_lowercase();
            let entered = VerificationCode::parse(&typed).unwrap();
            prop_assert!(issued.matches(&entered));
        }
    }
}
