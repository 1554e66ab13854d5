//! # carwatch-core -- Foundational Types
//!
//! Leaf crate of the carwatch workspace. Defines the primitives every other
//! crate agrees on: typed identifiers for vehicles and verification records,
//! a validated owner email address, and a UTC `Timestamp` read through an
//! injectable [`Clock`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `carwatch-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.
//! - Time is never read from the ambient system clock inside domain logic;
//!   callers hold an `Arc<dyn Clock>` and ask it.

pub mod error;
pub mod identity;
pub mod temporal;

pub use error::ValidationError;
pub use identity::{CarId, EmailAddress, VerificationId};
pub use temporal::{Clock, ManualClock, SystemClock, Timestamp};
