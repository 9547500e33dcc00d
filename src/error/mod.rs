//! Error types for expression handling and header generation

use std::path::PathBuf;

use thiserror::Error;

use crate::expr::ParseError;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, EkfGenError>;

/// Errors that can occur while turning a symbolic model into a header
#[derive(Debug, Error)]
pub enum EkfGenError {
    // ─────────────────────────────────────────────────────────────────────────
    // Differentiation
    // ─────────────────────────────────────────────────────────────────────────
    /// Derivative requested with respect to something that is not a symbol
    #[error("Cannot differentiate with respect to input {index} ('{expr}'): not a symbol")]
    InvalidDifferentiationTarget { index: usize, expr: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Shape and naming
    // ─────────────────────────────────────────────────────────────────────────
    /// A vector or matrix does not have the shape required by the filter
    #[error("Dimension mismatch for {what}: expected {expected}, got {found}")]
    DimensionMismatch {
        what: String,
        expected: String,
        found: String,
    },

    /// The same symbol appears twice in the state vector
    #[error("Symbol '{name}' appears more than once in the state vector")]
    DuplicateSymbol { name: String },

    /// Two generated declarations would share a name
    #[error("Name '{name}' is used by more than one generated declaration")]
    DuplicateName { name: String },

    /// A name that has to appear in C source is not a valid identifier
    #[error("'{name}' is not a valid C identifier")]
    InvalidIdentifier { name: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Substitution
    // ─────────────────────────────────────────────────────────────────────────
    /// Constants refer to each other in a loop
    #[error("Constant '{name}' is defined in terms of itself")]
    CyclicConstant { name: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Parsing
    // ─────────────────────────────────────────────────────────────────────────
    /// Expression text could not be parsed
    #[error("Invalid expression: {0}")]
    Parse(#[from] ParseError),

    /// Call to a function the generator does not know
    #[error("Unknown function '{name}'")]
    UnknownFunction { name: String },

    /// Call with the wrong number of arguments
    #[error("Function '{name}' takes {expected} argument(s), got {found}")]
    WrongArity {
        name: String,
        expected: usize,
        found: usize,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Model files
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to parse JSON
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Unsupported schema version
    #[error("Unsupported schema version '{version}'. Supported versions: {supported}")]
    UnsupportedSchema { version: String, supported: String },

    /// An expression inside a model file failed to parse
    #[error("Invalid expression in {context}: {source}")]
    InvalidExpression {
        context: String,
        #[source]
        source: Box<EkfGenError>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Output
    // ─────────────────────────────────────────────────────────────────────────
    /// The header file could not be written
    #[error("Failed to write header to '{}': {source}", path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EkfGenError {
    /// Create a dimension mismatch error
    pub fn dimension_mismatch(
        what: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::DimensionMismatch {
            what: what.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(name: impl Into<String>) -> Self {
        Self::InvalidIdentifier { name: name.into() }
    }

    /// Wrap an error raised while reading an expression in a model file
    pub fn invalid_expr(context: impl Into<String>, source: EkfGenError) -> Self {
        Self::InvalidExpression {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// Create an output write error
    pub fn write_failure(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::OutputWriteFailure {
            path: path.into(),
            source,
        }
    }
}
