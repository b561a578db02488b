//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_core::prelude::*;` to import all essential types.

// Errors
pub use crate::{CoreError, CoreResult};

// Identifiers and time
pub use crate::{ActionId, SessionId, Timestamp};

// Policy vocabulary
pub use crate::{Category, CategorySetting, ConfirmationMode, Sensitivity};

// Parameters
pub use crate::{Fingerprint, Parameters};
