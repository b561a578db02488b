//! Vigil Core - Foundation types for the Vigil confirmation engine.
//!
//! This crate provides:
//! - Identifiers and timestamps shared by every Vigil crate
//! - The sensitivity, category and mode vocabularies used by policy
//! - Tool-call parameters and their canonical fingerprints
//!
//! It has no knowledge of queues, timers or audit storage; those live in
//! `vigil-approval` and `vigil-audit`.
//!
//! # Example
//!
//! ```
//! use vigil_core::{Category, Sensitivity};
//!
//! let category: Category = "emailActions".parse().unwrap();
//! assert_eq!(category, Category::Email);
//! assert!(Sensitivity::Critical > Sensitivity::High);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod error;
pub mod params;
pub mod types;

pub use error::{CoreError, CoreResult};
pub use params::{Fingerprint, Parameters, canonicalize, fingerprint};
pub use types::{
    ActionId, Category, CategorySetting, ConfirmationMode, CustomCategory, Sensitivity, SessionId,
    Timestamp,
};
