//! Cross-crate scenarios for the Vigil confirmation engine.
//!
//! Nothing is exported. The scenarios in `tests/` drive a real
//! `ConfirmationEngine` with config files, timers and concurrent resolvers.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
