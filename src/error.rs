//! Error types for leamatch.
//!
//! The taxonomy is deliberately small. Per-record conditions (unmatchable
//! input, a supplied id absent from the registry) are data on the result
//! types, never errors, because the output report must carry every input
//! row exactly once. Errors here cover malformed model values and fatal
//! setup failures that abort a run before any record is processed.

use thiserror::Error;

/// Validation errors raised while constructing model values.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("'{value}' is not a valid LEAID (expected up to 7 digits)")]
    InvalidLeaId {
        value: String,
    },

    #[error("entity {id} has an empty primary name")]
    EmptyPrimaryName {
        id: String,
    },
}

/// Fatal setup failures.
///
/// These are the only conditions that abort a run wholesale; they all
/// occur before the first record is processed. Collaborators that load
/// the registry snapshot or the override table surface their I/O
/// failures through [`SetupError::RegistryLoad`] and
/// [`SetupError::OverrideLoad`].
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("registry snapshot is empty")]
    EmptyRegistry,

    #[error("duplicate entity id {id} in registry snapshot")]
    DuplicateEntityId {
        id: String,
    },

    #[error("duplicate override key ('{name}', '{jurisdiction}')")]
    DuplicateOverrideKey {
        name: String,
        jurisdiction: String,
    },

    #[error("failed to load registry snapshot: {message}")]
    RegistryLoad {
        message: String,
    },

    #[error("failed to load override table: {message}")]
    OverrideLoad {
        message: String,
    },
}

/// Top-level error type for leamatch.
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("setup error: {0}")]
    Setup(#[from] SetupError),
}

impl MatchError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a fatal setup error.
    #[must_use]
    pub const fn is_setup(&self) -> bool {
        matches!(self, Self::Setup(_))
    }
}

/// Result type alias for leamatch operations.
pub type MatchResult<T> = Result<T, MatchError>;
