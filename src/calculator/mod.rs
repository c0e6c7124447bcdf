//! Calculator module for evaluating arithmetic expressions.
//!
//! The pipeline runs in four stages:
//! - Sanitize the raw input (whitespace, percent literals, character set)
//! - Parse it into a syntax tree with a fixed grammar
//! - Evaluate the tree against closed operator and function tables
//! - Format the result canonically

mod error;
mod evaluation;
mod format;
mod lexer;
mod parser;
mod sanitize;

pub use error::ErrorKind;
pub use evaluation::evaluate_expression;
