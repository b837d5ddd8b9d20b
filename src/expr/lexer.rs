//! Tokenizer for function expressions

use crate::error::{FxError, Result};

/// A lexical token with its byte offset in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    /// Identifier, possibly dotted (`Math.sin`)
    Ident(String),
    Plus,
    Minus,
    Star,
    /// `**`, exponentiation
    StarStar,
    Slash,
    Percent,
    /// `^`, exponentiation
    Caret,
    LParen,
    RParen,
    Comma,
}

/// Split an expression into tokens.
pub fn tokenize(source: &str) -> Result<Vec<Token>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i] as char;

        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;
        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => {
                if bytes.get(i + 1) == Some(&b'*') {
                    i += 1;
                    TokenKind::StarStar
                } else {
                    TokenKind::Star
                }
            }
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '^' => TokenKind::Caret,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '0'..='9' | '.' => {
                let (value, end) = lex_number(source, start)?;
                tokens.push(Token {
                    kind: TokenKind::Number(value),
                    position: start,
                });
                i = end;
                continue;
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let end = lex_ident(bytes, start);
                tokens.push(Token {
                    kind: TokenKind::Ident(source[start..end].to_string()),
                    position: start,
                });
                i = end;
                continue;
            }
            other => {
                return Err(FxError::ExpressionSyntax {
                    expression: source.to_string(),
                    position: start,
                    reason: format!("unexpected character '{}'", other),
                });
            }
        };

        tokens.push(Token {
            kind,
            position: start,
        });
        i += 1;
    }

    Ok(tokens)
}

fn lex_number(source: &str, start: usize) -> Result<(f64, usize)> {
    let bytes = source.as_bytes();
    let mut end = start;

    while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
        end += 1;
    }

    // Exponent: 1e3, 2.5E-4
    if end < bytes.len() && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut probe = end + 1;
        if probe < bytes.len() && (bytes[probe] == b'+' || bytes[probe] == b'-') {
            probe += 1;
        }
        if probe < bytes.len() && bytes[probe].is_ascii_digit() {
            end = probe;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
        }
    }

    let text = &source[start..end];
    text.parse::<f64>()
        .map(|value| (value, end))
        .map_err(|_| FxError::ExpressionSyntax {
            expression: source.to_string(),
            position: start,
            reason: format!("malformed number '{}'", text),
        })
}

fn lex_ident(bytes: &[u8], start: usize) -> usize {
    let is_ident = |b: u8| b.is_ascii_alphanumeric() || b == b'_';
    let mut end = start;

    loop {
        while end < bytes.len() && is_ident(bytes[end]) {
            end += 1;
        }
        // A dot continues the identifier only when a letter follows it
        if end + 1 < bytes.len()
            && bytes[end] == b'.'
            && (bytes[end + 1].is_ascii_alphabetic() || bytes[end + 1] == b'_')
        {
            end += 1;
            continue;
        }
        return end;
    }
}
