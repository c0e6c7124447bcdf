//! Input normalization ahead of parsing.
//!
//! Strips whitespace, rewrites percent literals and rejects anything outside
//! the calculator's character set. This is only a fast reject; the grammar in
//! [`super::parser`] is what actually decides what is a valid expression.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::EvalError;

/// Longest accepted expression, counted in characters after trimming.
pub const MAX_EXPRESSION_LEN: usize = 1024;

lazy_static! {
    /// `50%` or `12.5%`, captured without the percent sign.
    static ref PERCENT_LITERAL: Regex = Regex::new(
        r"([0-9]+(\.[0-9]+)?)%"
    ).unwrap();

    /// Digits, operators, parentheses, separators and identifier characters.
    static ref ALLOWED_CHARS: Regex = Regex::new(
        r"^[0-9+\-*/().,%^a-zA-Z_]+$"
    ).unwrap();
}

/// Normalize raw user input.
///
/// Returns `Ok(None)` for blank input, which evaluates to zero without
/// going through the parser.
pub fn sanitize(raw: &str) -> Result<Option<String>, EvalError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    if trimmed.chars().count() > MAX_EXPRESSION_LEN {
        return Err(EvalError::TooLong {
            max: MAX_EXPRESSION_LEN,
        });
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    let rewritten = PERCENT_LITERAL.replace_all(&compact, "(${1}/100)");

    if !ALLOWED_CHARS.is_match(&rewritten) {
        return Err(EvalError::DisallowedCharacter);
    }

    Ok(Some(rewritten.into_owned()))
}
