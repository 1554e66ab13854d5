//! # carwatch-cli -- Terminal front-end for the carwatch portal
//!
//! Provides the `carwatch` command-line interface.
//!
//! ## Subcommands
//!
//! - `carwatch verify`: Interactive ownership verification for one car.
//! - `carwatch review`: Administrator review queue.
//! - `carwatch ask`: Canned-response help assistant.
//! - `carwatch prefs`: Notification preferences.
//!
//! ```bash
//! carwatch verify --car-id 6f1c0c1e-2b8e-4f57-9d38-1c6a0f5f4a10
//! carwatch review list --status all
//! carwatch prefs set notificationFrequency weekly
//! ```
//!
//! Handlers write to any [`std::io::Write`] and return the process exit
//! code, so they run unchanged against in-memory stores in tests.

pub mod ask;
pub mod config;
pub mod prefs;
pub mod review;
pub mod verify;
