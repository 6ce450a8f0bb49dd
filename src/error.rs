//! Engine error taxonomy
//!
//! Every failure the equation engine can report. The `Display` text of each
//! variant is the diagnostic handed to the host, so keep it short and
//! human-readable.

use thiserror::Error;

/// Failure raised while compiling or evaluating an expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("Expression is empty")]
    EmptyExpression,

    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("Unexpected token '{token}' at position {pos}")]
    UnexpectedToken { token: String, pos: usize },

    #[error("Unexpected end of expression")]
    UnexpectedEnd,

    #[error("Missing closing parenthesis for '(' at position {pos}")]
    MissingParenthesis { pos: usize },

    #[error("Unexpected closing parenthesis at position {pos}")]
    UnexpectedParenthesis { pos: usize },

    #[error("Unterminated string literal starting at position {pos}")]
    UnterminatedString { pos: usize },

    #[error("String literal of {len} bytes exceeds the {limit} byte limit")]
    StringTooLong { len: usize, limit: usize },

    #[error("Invalid number '{0}'")]
    InvalidNumber(String),

    #[error("Unknown identifier '{name}' at position {pos}")]
    UnknownIdentifier { name: String, pos: usize },

    #[error("Function '{function}' expects {expected} argument(s), got {found}")]
    ArgumentCount {
        function: &'static str,
        expected: String,
        found: usize,
    },

    #[error("Function '{function}' accepts at most {limit} arguments, got {found}")]
    TooManyArguments {
        function: &'static str,
        limit: usize,
        found: usize,
    },

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Operator '{op}' cannot be applied to {found}")]
    TypeMismatch { op: &'static str, found: String },

    #[error("Result of '{op}' is not a real number")]
    NotANumber { op: &'static str },

    #[error("Result of '{op}' is too large")]
    Overflow { op: &'static str },

    #[error("Result of '{op}' is too small to represent")]
    Underflow { op: &'static str },

    #[error("Result is too large to represent")]
    ResultTooLarge,

    #[error("Result is too small to represent")]
    ResultTooSmall,

    #[error("Expression nesting exceeds the limit of {limit}")]
    NestingTooDeep { limit: usize },

    #[error("Expression needs more than {limit} stack slots")]
    StackOverflow { limit: usize },

    /// Broken invariant inside the engine (malformed bytecode, stack misuse).
    /// Never shown to the host verbatim.
    #[error("Internal engine error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Whether this failure is an engine bug rather than a problem with the input
    pub fn is_internal(&self) -> bool {
        matches!(self, EngineError::Internal(_))
    }
}
