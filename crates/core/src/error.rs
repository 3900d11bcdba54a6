//! Errors that abort a compilation pass.
//!
//! Recoverable conditions (malformed schema nodes, unresolvable refs) never
//! reach this type: the resolver degrades them to a fallback type and logs.

use thiserror::Error;

/// A fatal compilation error. No artifact is produced when one is returned.
#[derive(Debug, Error)]
pub enum CompileError {
    /// The input is not a JSON or YAML mapping.
    #[error("invalid schema document: {0}")]
    InvalidDocument(String),

    /// Two distinct source definitions normalize to the same identifier.
    #[error(
        "naming collision: definitions '{first}' and '{second}' both normalize to '{identifier}'"
    )]
    NamingCollision {
        /// The shared normalized identifier.
        identifier: String,
        /// Source name of the definition seen first.
        first: String,
        /// Source name of the definition seen second.
        second: String,
    },

    /// Two operations produce the same request function name.
    #[error("duplicate request function '{name}' generated for {first} and {second}")]
    DuplicateOperation {
        /// The generated function name.
        name: String,
        /// `METHOD /path` of the first operation.
        first: String,
        /// `METHOD /path` of the second operation.
        second: String,
    },

    /// The configured request template strategy is not registered.
    #[error("unknown request template '{name}' (available: {available})")]
    UnknownTemplate {
        /// Requested strategy name.
        name: String,
        /// Comma separated list of registered strategies.
        available: String,
    },

    /// The formatter rejected a generated module.
    #[error("formatter rejected generated unit '{unit}' in {module}: {diagnostic}")]
    FormatterFailure {
        /// File name of the generated module.
        module: String,
        /// Name of the generated unit (declaration or function) at fault.
        unit: String,
        /// Diagnostic reported by the formatter.
        diagnostic: String,
        /// The unformatted module text handed to the formatter.
        emitted: String,
    },
}

impl CompileError {
    /// The emitted text that failed formatting, if this is a formatter failure.
    pub fn emitted_text(&self) -> Option<&str> {
        match self {
            CompileError::FormatterFailure { emitted, .. } => Some(emitted),
            _ => None,
        }
    }
}
