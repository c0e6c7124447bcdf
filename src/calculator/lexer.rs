//! Tokenizer for sanitized expressions.

use super::error::EvalError;

#[derive(Clone, Debug, PartialEq)]
pub enum Token {
    Number(f64),
    Ident(String),

    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Caret,

    LParen,
    RParen,
    Comma,
}

/// Split an expression into tokens.
///
/// Supports:
/// - numbers `12`, `1.5`, `.5`, `2.`, with an optional exponent `1e-3`
/// - identifiers `[A-Za-z_][A-Za-z0-9_]*`
/// - operators `+ - * / % ^` and `**` as a synonym for `^`
/// - parentheses and commas
pub fn tokenize(input: &str) -> Result<Vec<Token>, EvalError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let simple = match c {
            '+' => Some(Token::Plus),
            '-' => Some(Token::Minus),
            '/' => Some(Token::Slash),
            '%' => Some(Token::Percent),
            '^' => Some(Token::Caret),
            '(' => Some(Token::LParen),
            ')' => Some(Token::RParen),
            ',' => Some(Token::Comma),
            _ => None,
        };
        if let Some(token) = simple {
            tokens.push(token);
            i += 1;
            continue;
        }

        if c == '*' {
            if chars.get(i + 1) == Some(&'*') {
                tokens.push(Token::Caret);
                i += 2;
            } else {
                tokens.push(Token::Star);
                i += 1;
            }
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            tokens.push(Token::Ident(chars[start..i].iter().collect()));
            continue;
        }

        if c.is_ascii_digit() || c == '.' {
            let (value, end) = lex_number(&chars, i)?;
            tokens.push(Token::Number(value));
            i = end;
            continue;
        }

        return Err(EvalError::UnexpectedChar(c));
    }

    Ok(tokens)
}

/// Read a numeric literal starting at `start`, returning its value and the
/// index just past it.
fn lex_number(chars: &[char], start: usize) -> Result<(f64, usize), EvalError> {
    let digits_from = |mut i: usize| {
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut i = digits_from(start);
    let int_digits = i - start;

    let mut frac_digits = 0;
    if chars.get(i) == Some(&'.') {
        let after = digits_from(i + 1);
        frac_digits = after - (i + 1);
        i = after;
    }

    let malformed = |end: usize| {
        let end = end.min(chars.len());
        EvalError::MalformedNumber(chars[start..end].iter().collect())
    };

    if int_digits == 0 && frac_digits == 0 {
        return Err(malformed(i));
    }

    if matches!(chars.get(i), Some('e' | 'E')) {
        let mut j = i + 1;
        if matches!(chars.get(j), Some('+' | '-')) {
            j += 1;
        }
        let end = digits_from(j);
        if end == j {
            return Err(malformed(end + 1));
        }
        i = end;
    }

    // `2pi`, `1.2.3`, `3_0`
    if let Some(&next) = chars.get(i)
        && (next.is_ascii_alphanumeric() || next == '_' || next == '.')
    {
        return Err(malformed(i + 1));
    }

    let text: String = chars[start..i].iter().collect();
    let value = text.parse::<f64>().map_err(|_| EvalError::MalformedNumber(text))?;
    Ok((value, i))
}
