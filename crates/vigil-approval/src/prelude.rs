//! Prelude module - commonly used types for convenient import.
//!
//! Use `use vigil_approval::prelude::*;` to import all essential types.

// Engine
pub use crate::{ConfirmationEngine, Submission, Ticket};

// Candidates and queued actions
pub use crate::{PendingAction, Preview, ToolCandidate};

// Decisions and outcomes
pub use crate::{AbortReason, Authorization, ConfirmationResult, DecisionKind, Outcome};

// Policy
pub use crate::{PolicyDecision, PolicyRule};

// Settings
pub use crate::{Settings, SettingsPatch};

// Events
pub use crate::{EngineEvent, EventReceiver};

// Errors
pub use crate::{EngineError, EngineResult, ResolutionError, ResolutionResult};
