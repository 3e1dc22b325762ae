//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula parsing or evaluation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Division with a zero divisor
    #[error("Division by zero")]
    DivisionByZero,

    /// Result overflowed to infinity or became NaN
    #[error("Result is not a finite number")]
    NotFinite,

    /// Formula text longer than the configured limit
    #[error("Formula is {length} characters long (max: {limit})")]
    TooLong { length: usize, limit: usize },

    /// Parentheses or unary operators nested deeper than the configured limit
    #[error("Formula nesting exceeds depth {limit}")]
    TooDeep { limit: usize },
}

/// Reasons a formula is rejected at authoring time
///
/// The display strings are shown to the formula author verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Unmatched closing parenthesis")]
    UnmatchedClosingParen,

    #[error("Unmatched opening parenthesis")]
    UnmatchedOpeningParen,

    #[error("Invalid characters in formula")]
    InvalidCharacters,

    #[error("Invalid formula syntax")]
    InvalidSyntax,

    #[error("Formula exceeds maximum length")]
    TooLong,

    #[error("Formula exceeds maximum nesting depth")]
    TooDeep,
}
