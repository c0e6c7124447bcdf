//! Recursive descent parser producing an owned syntax tree.
//!
//! Grammar:
//!
//! ```text
//! expr    := term (('+'|'-') term)*
//! term    := factor (('*'|'/'|'%') factor)*
//! factor  := unary ('^' unary)*                  right associative
//! unary   := ('-'|'+')? primary
//! primary := NUMBER | IDENT | IDENT '(' args ')' | '(' expr ')'
//! args    := expr (',' expr)*
//! ```
//!
//! Identifiers are not resolved here; the evaluator owns the whitelist.

use super::error::EvalError;
use super::lexer::{Token, tokenize};

/// Deepest allowed nesting of parentheses and call argument lists.
pub const MAX_DEPTH: usize = 64;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Number(f64),
    Identifier(String),
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    Call {
        name: String,
        args: Vec<Node>,
    },
}

impl Node {
    fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Self::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Parse a sanitized expression into a syntax tree.
pub fn parse(text: &str) -> Result<Node, EvalError> {
    let tokens = tokenize(text)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };

    let node = parser.expr()?;
    match parser.peek() {
        None => Ok(node),
        Some(Token::RParen) => Err(EvalError::UnbalancedParens),
        Some(_) => Err(EvalError::TrailingInput),
    }
}

/// Cursor over the token stream.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// The next token without consuming it.
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    /// Consume and return the next token.
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Consume the next token if it equals `expected`.
    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// `term (('+'|'-') term)*`
    fn expr(&mut self) -> Result<Node, EvalError> {
        let mut node = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(node),
            };
            self.pos += 1;
            let right = self.term()?;
            node = Node::binary(op, node, right);
        }
    }

    /// `factor (('*'|'/'|'%') factor)*`
    fn term(&mut self) -> Result<Node, EvalError> {
        let mut node = self.factor()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Mod,
                _ => return Ok(node),
            };
            self.pos += 1;
            let right = self.factor()?;
            node = Node::binary(op, node, right);
        }
    }

    /// `unary ('^' unary)*`, folded right to left.
    fn factor(&mut self) -> Result<Node, EvalError> {
        let mut operands = vec![self.unary()?];
        while self.eat(&Token::Caret) {
            operands.push(self.unary()?);
        }

        // Fold from the right so that 2^3^2 == 2^(3^2).
        let mut node = operands.pop().ok_or(EvalError::EmptyOperand)?;
        while let Some(base) = operands.pop() {
            node = Node::binary(BinaryOp::Pow, base, node);
        }
        Ok(node)
    }

    /// At most one leading sign.
    fn unary(&mut self) -> Result<Node, EvalError> {
        let op = match self.peek() {
            Some(Token::Minus) => Some(UnaryOp::Neg),
            Some(Token::Plus) => Some(UnaryOp::Pos),
            _ => None,
        };

        match op {
            Some(op) => {
                self.pos += 1;
                let operand = self.primary()?;
                Ok(Node::Unary {
                    op,
                    operand: Box::new(operand),
                })
            }
            None => self.primary(),
        }
    }

    /// Number, identifier, call or parenthesized expression.
    fn primary(&mut self) -> Result<Node, EvalError> {
        match self.next() {
            Some(Token::Number(value)) => Ok(Node::Number(value)),
            Some(Token::Ident(name)) => {
                if !self.eat(&Token::LParen) {
                    return Ok(Node::Identifier(name));
                }
                self.enter()?;
                let mut args = vec![self.expr()?];
                while self.eat(&Token::Comma) {
                    args.push(self.expr()?);
                }
                self.close()?;
                Ok(Node::Call { name, args })
            }
            Some(Token::LParen) => {
                self.enter()?;
                let inner = self.expr()?;
                self.close()?;
                Ok(inner)
            }
            Some(Token::RParen) => {
                // `()` or `(1+)` is a missing operand, `1)` is caught by the caller.
                if self.depth > 0 {
                    Err(EvalError::EmptyOperand)
                } else {
                    Err(EvalError::UnbalancedParens)
                }
            }
            Some(_) | None => Err(EvalError::EmptyOperand),
        }
    }

    /// Open one nesting level, failing past `MAX_DEPTH`.
    fn enter(&mut self) -> Result<(), EvalError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(EvalError::TooDeep { max: MAX_DEPTH });
        }
        Ok(())
    }

    /// Expect the `)` that closes the current level.
    fn close(&mut self) -> Result<(), EvalError> {
        match self.next() {
            Some(Token::RParen) => {
                self.depth -= 1;
                Ok(())
            }
            None => Err(EvalError::UnbalancedParens),
            Some(_) => Err(EvalError::TrailingInput),
        }
    }
}
