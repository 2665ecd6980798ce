//! Common error infrastructure for stowage-core.
//!
//! Domain-specific errors (e.g. `PlacementError`, `StackError`) are defined in
//! their respective modules alongside the operations they validate. This
//! module provides the shared severity classification used across all of them.
//!
//! # Design Principles
//!
//! - **Type Safety**: Each operation family has its own error type
//! - **Severity Classification**: Errors are categorized for recovery strategies
//! - **Deterministic**: No allocation or I/O in error paths

/// Severity level of an error, used for categorization and recovery strategies.
///
/// Errors are classified by their recoverability and expected handling:
/// - **Recoverable**: Expected gameplay failures (no room, wrong slot type)
/// - **Validation**: Invalid input that should be rejected without retry
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: Unrecoverable errors indicating corrupted engine state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry with same or alternative placement.
    ///
    /// Examples: all candidate slots occupied, swap target not relocatable
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: slot index out of range, self-containment
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: stack invariant violated after a `can_accept` check
    /// These indicate bugs and should be investigated.
    Internal,

    /// Fatal error - engine state corrupted, cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all stowage-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait StorageError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    ///
    /// This is used for error handling strategies and logging priorities.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// This is useful for error categorization, metrics, and testing.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
