//! Formula tokenizer and recursive-descent parser.
//!
//! Grammar (whitespace is insignificant):
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | primary
//! primary := NUMBER | CELLREF | FN '(' expr ',' expr ')' | '(' expr ')'
//! ```
//!
//! `FN` is `min` or `max` (case-insensitive). A `CELLREF` may mark its column
//! and/or row absolute with `$` (`$A$1`); everything else is stored relative
//! to the cell the formula is entered in.

use super::ast::{Formula, Func, RelRef};
use super::cell_ref::{CellRef, letters_to_col};
use crate::error::{EngineError, Result};

/// Upper bound on tokens per formula; also bounds the height of the tree.
const MAX_TOKENS: usize = 2048;
/// Upper bound on nested parentheses, function calls and unary operators.
const MAX_NESTING: usize = 256;

#[derive(Clone, Debug, PartialEq)]
enum TokenKind {
    Number(f64),
    Cell {
        target: CellRef,
        abs_col: bool,
        abs_row: bool,
    },
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

#[derive(Clone, Debug)]
struct Token {
    kind: TokenKind,
    position: usize,
}

struct Tokenizer {
    chars: Vec<char>,
    pos: usize,
}

impl Tokenizer {
    fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> String {
        let start = self.pos;
        while self.peek().is_some_and(&pred) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    fn tokenize(mut self) -> Result<Vec<Token>> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }
            let position = self.pos;
            let kind = match c {
                '+' => self.single(TokenKind::Plus),
                '-' => self.single(TokenKind::Minus),
                '*' => self.single(TokenKind::Star),
                '/' => self.single(TokenKind::Slash),
                '(' => self.single(TokenKind::LParen),
                ')' => self.single(TokenKind::RParen),
                ',' => self.single(TokenKind::Comma),
                '0'..='9' | '.' => self.number()?,
                '$' => self.reference()?,
                c if c.is_ascii_alphabetic() => self.reference()?,
                other => {
                    return Err(EngineError::syntax(
                        format!("unexpected character '{}'", other),
                        position,
                    ));
                }
            };
            if tokens.len() == MAX_TOKENS {
                return Err(EngineError::syntax("formula too long", position));
            }
            tokens.push(Token { kind, position });
        }
        Ok(tokens)
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.pos += 1;
        kind
    }

    fn number(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let mut text = self.take_while(|c| c.is_ascii_digit());
        if self.peek() == Some('.') {
            self.pos += 1;
            text.push('.');
            text.push_str(&self.take_while(|c| c.is_ascii_digit()));
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_at(1), Some('+' | '-'));
            let digit_at = if signed { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                for _ in 0..digit_at {
                    text.push(self.chars[self.pos]);
                    self.pos += 1;
                }
                text.push_str(&self.take_while(|c| c.is_ascii_digit()));
            }
        }
        text.parse::<f64>()
            .map(TokenKind::Number)
            .map_err(|_| EngineError::syntax(format!("invalid number '{}'", text), start))
    }

    fn reference(&mut self) -> Result<TokenKind> {
        let start = self.pos;
        let abs_col = self.eat('$');
        let letters = self.take_while(|c| c.is_ascii_alphabetic());
        let abs_row = self.eat('$');
        let digits = self.take_while(|c| c.is_ascii_digit());

        if !abs_col && !abs_row && digits.is_empty() {
            return Ok(TokenKind::Ident(letters));
        }
        if letters.is_empty() || digits.is_empty() {
            return Err(EngineError::syntax("malformed cell reference", start));
        }
        let col = letters_to_col(&letters)
            .ok_or_else(|| EngineError::syntax("column out of range", start))?;
        let row = digits
            .parse::<usize>()
            .ok()
            .and_then(|r| r.checked_sub(1))
            .ok_or_else(|| EngineError::syntax("row out of range", start))?;
        Ok(TokenKind::Cell {
            target: CellRef::new(col, row),
            abs_col,
            abs_row,
        })
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    end: usize,
    depth: usize,
    base: &'a CellRef,
}

impl<'a> Parser<'a> {
    fn parse_expr(&mut self) -> Result<Formula> {
        let mut expr = self.parse_term()?;
        loop {
            let func = if self.consume(&TokenKind::Plus) {
                Func::Add
            } else if self.consume(&TokenKind::Minus) {
                Func::Sub
            } else {
                break;
            };
            let rhs = self.parse_term()?;
            expr = Formula::Binary {
                func,
                left: Box::new(expr),
                right: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_term(&mut self) -> Result<Formula> {
        let mut expr = self.parse_unary()?;
        loop {
            let func = if self.consume(&TokenKind::Star) {
                Func::Mul
            } else if self.consume(&TokenKind::Slash) {
                Func::Div
            } else {
                break;
            };
            let rhs = self.parse_unary()?;
            expr = Formula::Binary {
                func,
                left: Box::new(expr),
                right: Box::new(rhs),
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Formula> {
        let position = self.position();
        let func = if self.consume(&TokenKind::Minus) {
            Func::Sub
        } else if self.consume(&TokenKind::Plus) {
            Func::Add
        } else {
            return self.parse_primary();
        };
        let operand = self.nested(position, Self::parse_unary)?;
        Ok(Formula::Unary {
            func,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Formula> {
        let Some(token) = self.next() else {
            return Err(EngineError::syntax("unexpected end of formula", self.end));
        };
        match token.kind {
            TokenKind::Number(n) => Ok(Formula::Number(n)),
            TokenKind::Cell {
                target,
                abs_col,
                abs_row,
            } => Ok(Formula::Reference(RelRef::between(
                self.base, &target, abs_col, abs_row,
            ))),
            TokenKind::Ident(name) => {
                let func = Func::from_name(&name).ok_or_else(|| {
                    EngineError::syntax(format!("unknown function '{}'", name), token.position)
                })?;
                self.nested(token.position, |p| {
                    p.expect(&TokenKind::LParen, "'('")?;
                    let left = p.parse_expr()?;
                    p.expect(&TokenKind::Comma, "','")?;
                    let right = p.parse_expr()?;
                    p.expect(&TokenKind::RParen, "')'")?;
                    Ok(Formula::Binary {
                        func,
                        left: Box::new(left),
                        right: Box::new(right),
                    })
                })
            }
            TokenKind::LParen => self.nested(token.position, |p| {
                let expr = p.parse_expr()?;
                p.expect(&TokenKind::RParen, "')'")?;
                Ok(expr)
            }),
            _ => Err(EngineError::syntax("expected a value", token.position)),
        }
    }

    fn nested(
        &mut self,
        position: usize,
        inner: impl FnOnce(&mut Self) -> Result<Formula>,
    ) -> Result<Formula> {
        if self.depth == MAX_NESTING {
            return Err(EngineError::syntax("formula nested too deeply", position));
        }
        self.depth += 1;
        let result = inner(self);
        self.depth -= 1;
        result
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Result<()> {
        if self.consume(kind) {
            Ok(())
        } else {
            Err(EngineError::syntax(
                format!("expected {}", what),
                self.position(),
            ))
        }
    }

    fn consume(&mut self, expected: &TokenKind) -> bool {
        if let Some(token) = self.tokens.get(self.pos)
            && std::mem::discriminant(&token.kind) == std::mem::discriminant(expected)
        {
            self.pos += 1;
            return true;
        }
        false
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn position(&self) -> usize {
        self.tokens.get(self.pos).map_or(self.end, |t| t.position)
    }
}

/// Parse `expr` as the formula of cell `base`.
pub fn parse(expr: &str, base: &CellRef) -> Result<Formula> {
    let tokens = Tokenizer::new(expr).tokenize()?;
    if tokens.is_empty() {
        return Err(EngineError::syntax("empty formula", 0));
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        end: expr.chars().count(),
        depth: 0,
        base,
    };
    let formula = parser.parse_expr()?;
    if parser.pos < parser.tokens.len() {
        return Err(EngineError::syntax("unexpected token", parser.position()));
    }
    Ok(formula)
}
