//! Error handling module for the merge wizard
//!
//! Provides centralized error handling with proper error types using thiserror.
//! All errors in the crate should use these types for consistency.
//!
//! Remote failures carry the service's error code as their payload; the code
//! is resolved to user-facing text through `user_message`, never shown raw.

use thiserror::Error;

/// Main error type for the merge wizard
#[derive(Error, Debug)]
pub enum MergeWizardError {
    /// IO errors (plan files, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation errors (missing required selection or app)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Lock errors (acquire/extend/release failure, already locked by another holder)
    #[error("Lock error: {0}")]
    Lock(String),

    /// Permission errors (insufficient role on source or destination)
    #[error("Permission error: {0}")]
    Permission(String),

    /// Plan limit errors (destination capacity exceeded)
    #[error("Plan limit error: {0}")]
    PlanLimit(String),

    /// Duplicate errors (name collision in source content)
    #[error("Duplicate content error: {0}")]
    Duplicate(String),

    /// Network/transport errors
    #[error("Network error: {0}")]
    Network(String),

    /// Remote service errors
    #[error("Server error: {0}")]
    Server(String),

    /// Wizard state machine transition errors
    #[error("Wizard transition error: {0}")]
    Transition(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// General errors (catch-all for edge cases)
    #[error("{0}")]
    General(String),
}

/// Result type alias for merge wizard operations
pub type Result<T> = std::result::Result<T, MergeWizardError>;

/// Fallback text for codes with no mapping
const GENERIC_MESSAGE: &str = "An unexpected error occurred. Please try again.";

// Convenient error constructors
impl MergeWizardError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a lock error
    pub fn lock(msg: impl Into<String>) -> Self {
        Self::Lock(msg.into())
    }

    /// Create a permission error
    pub fn permission(msg: impl Into<String>) -> Self {
        Self::Permission(msg.into())
    }

    /// Create a plan limit error
    pub fn plan_limit(msg: impl Into<String>) -> Self {
        Self::PlanLimit(msg.into())
    }

    /// Create a duplicate content error
    pub fn duplicate(msg: impl Into<String>) -> Self {
        Self::Duplicate(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a server error
    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }

    /// Create a general error
    pub fn general(msg: impl Into<String>) -> Self {
        Self::General(msg.into())
    }

    /// Resolve this error to user-facing text.
    ///
    /// Known category/code pairs map to fixed messages; anything unmapped
    /// falls back to a generic message so raw codes never leak into the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Some required selections are missing or invalid.",
            Self::Lock(code) => match code.as_str() {
                "already-locked" => {
                    "Another user is currently merging content into one of these apps. \
                     Try again when their merge finishes."
                }
                "lock-expired" => {
                    "The merge lock expired before the operation finished. No changes were made."
                }
                "lock-not-held" | "lock-already-held" => {
                    "The apps could not be locked for merging."
                }
                _ => "The apps could not be locked for merging.",
            },
            Self::Permission(_) => {
                "You do not have permission to merge content into the destination app."
            }
            Self::PlanLimit(_) => {
                "The destination app has reached its plan limit for this content type."
            }
            Self::Duplicate(_) => {
                "Content with the same name already exists in the destination app."
            }
            Self::Network(_) => {
                "A network problem interrupted the operation. Check your connection and try again."
            }
            Self::Server(code) => match code.as_str() {
                "merge-not-found" => "The merge could not be found on the server.",
                "merge-failed" => "The server reported that the merge failed.",
                _ => GENERIC_MESSAGE,
            },
            Self::Transition(_) | Self::Io(_) | Self::Json(_) | Self::General(_) => GENERIC_MESSAGE,
        }
    }
}
