//! Error types for the expression evaluator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The two failure kinds visible outside the evaluator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed syntax, a disallowed character or name, or a NaN result.
    #[error("Invalid expression")]
    InvalidExpression,
    /// The result is positive or negative infinity.
    #[error("Divide by zero")]
    DivideByZero,
}

/// Internal failure raised by one of the evaluation stages.
///
/// Never leaves the `calculator` module: the entrypoint folds it into an
/// [`ErrorKind`] with [`EvalError::kind`].
#[derive(Clone, Debug, PartialEq, Error)]
pub enum EvalError {
    /// Input exceeds the accepted length.
    #[error("expression is longer than {max} characters")]
    TooLong { max: usize },
    /// A character outside the calculator's character set survived sanitizing.
    #[error("expression contains disallowed characters")]
    DisallowedCharacter,
    /// The lexer met a character it has no token for.
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    /// A numeric literal such as `1.2.3`, `5e` or `2pi`.
    #[error("malformed number '{0}'")]
    MalformedNumber(String),
    /// An unclosed `(` or a stray `)`.
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    /// Tokens left over after a complete expression.
    #[error("unexpected input after end of expression")]
    TrailingInput,
    /// An operator or group with nothing where an operand belongs.
    #[error("missing operand")]
    EmptyOperand,
    /// Parentheses or calls nested beyond the parser's limit.
    #[error("expression nested deeper than {max} levels")]
    TooDeep { max: usize },
    /// A bare name that is not a known constant.
    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),
    /// A call to a name outside the function whitelist.
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    /// A whitelisted function called with the wrong number of arguments.
    #[error("{name}() takes {expected} argument(s), {found} given")]
    Arity {
        name: String,
        expected: usize,
        found: usize,
    },
    /// A function argument outside its mathematical domain, e.g. `log(0)`.
    #[error("{0}() argument out of domain")]
    Domain(&'static str),
    /// A power of finite operands that overflowed.
    #[error("numeric overflow")]
    Overflow,
    /// The final value is NaN.
    #[error("result is not a number")]
    NotANumber,
    /// The final value is infinite, typically a division by zero.
    #[error("result is infinite")]
    Infinite,
}

impl EvalError {
    /// The user-facing kind this failure is reported as.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Infinite => ErrorKind::DivideByZero,
            _ => ErrorKind::InvalidExpression,
        }
    }
}

impl From<EvalError> for ErrorKind {
    fn from(err: EvalError) -> Self {
        err.kind()
    }
}
