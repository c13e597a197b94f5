//! Common error infrastructure for stat-core.
//!
//! This module provides the shared classification used by every error type in
//! the crate. Domain-specific errors (e.g., [`RegistryError`], [`ValueError`])
//! are defined alongside the components that raise them.
//!
//! # Design Principles
//!
//! - **Type Safety**: Each component has its own error enum with specific variants
//! - **Rich Context**: Errors carry the attribute identifier and offending value
//! - **Severity Classification**: Errors are categorized for recovery strategies
//! - **No silent non-finite values**: numeric errors are raised before any write
//!
//! "Not applicable" is deliberately absent from this taxonomy: reading an
//! attribute that does not apply to an owner yields the definition default and
//! writing one is a no-op.
//!
//! [`RegistryError`]: crate::registry::RegistryError
//! [`ValueError`]: crate::instance::ValueError

/// Severity level of an error, used for categorization and recovery strategies.
///
/// - **Recoverable**: the call failed but the caller may retry later (e.g., the
///   next reconciliation pass)
/// - **Validation**: invalid input that should be rejected without retry
/// - **Internal**: unexpected state inconsistencies that require investigation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - the same call may succeed once state changes.
    ///
    /// Examples: inverse target undefined under the current modifier set
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: duplicate registration, malformed identifier
    Validation,

    /// Internal error - unexpected state inconsistency.
    ///
    /// Examples: a custom aggregation hook produced NaN
    Internal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }
}

/// Common trait for all stat-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait StatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a static string identifier for this error variant.
    ///
    /// Useful for log fields, metrics and tests.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Returns `true` when `value` may be written into a bounded store.
///
/// NaN is never safe. Infinities are only representable where the bound on
/// that side is unbounded, which callers check separately.
#[inline]
pub fn is_storable(value: f64) -> bool {
    !value.is_nan()
}
