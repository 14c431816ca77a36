//! Error taxonomy: construction-time vs resolution-time.
//!
//! Both families carry the rendered structural path (see [`crate::path`]) so a
//! failure deep inside a nested value is localizable without a debugger.

use thiserror::Error;

/// Construction-time failures: the type tree itself is malformed.
///
/// These abort compilation of the offending subtree and are never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    /// A variant declared with zero options has no structural default.
    #[error("{path}: variant `{label}` declares no options")]
    EmptyVariant { path: String, label: String },

    /// A recursive type handle whose body was never filled.
    #[error("{path}: recursive type `{type_name}` has no body")]
    UnfilledRecursive { path: String, type_name: String },

    /// Method lookup against a service that does not declare it.
    #[error("service has no method `{name}` (available: {available:?})")]
    UnknownMethod {
        name: String,
        available: Vec<String>,
    },

    /// An entry point was handed the wrong node kind (e.g. a service
    /// compile on a record type).
    #[error("{path}: expected a {expected} type node, found {found}")]
    WrongTypeNode {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// Resolution-time failures: a concrete value does not match the compiled
/// metadata shape. Per-call; the metadata tree stays fully reusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The runtime value has the wrong shape for the declared kind.
    #[error("{path}: expected {expected}, got {actual}")]
    ExpectedKindMismatch {
        path: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A variant value whose key(s) match none of the declared options.
    #[error("{path}: unknown variant option(s) {found:?}, valid options: {valid:?}")]
    UnknownVariantOption {
        path: String,
        found: Vec<String>,
        valid: Vec<String>,
    },

    /// Null/undefined where a value was structurally required.
    #[error("{path}: missing required value (null/undefined) where {expected} was expected")]
    MissingRequiredValue { path: String, expected: &'static str },
}
