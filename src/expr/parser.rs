//! Recursive-descent parser and AST for function expressions
//!
//! Grammar, lowest to highest precedence:
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/' | '%') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := primary (('^' | '**') unary)?
//! primary := NUMBER | IDENT | IDENT '(' args ')' | '(' expr ')'
//! ```
//!
//! Identifiers are resolved while parsing: the variable, a whitelisted
//! constant, or a whitelisted function. Anything else is rejected, so a
//! parsed [`Expr`] can always be evaluated.
//!
//! Input is bounded in length and nesting depth. Evaluation, formatting and
//! dropping all walk the tree recursively, so both limits keep the tree
//! shallow enough for a default thread stack.

use std::fmt;

use crate::error::{FxError, Result};
use crate::expr::lexer::{tokenize, Token, TokenKind};

/// Symbol used for the free variable
pub const VARIABLE: &str = "x";

/// Deepest nesting of parentheses, calls, unary signs and exponents
pub const MAX_DEPTH: usize = 256;

/// Longest accepted expression, in tokens
pub const MAX_TOKENS: usize = 2048;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Pow,
}

/// Whitelisted math functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    Sinh,
    Cosh,
    Tanh,
    Sqrt,
    Cbrt,
    Abs,
    Exp,
    Ln,
    Log10,
    Log2,
    Floor,
    Ceil,
    Round,
    Trunc,
    Sign,
    Min,
    Max,
    Pow,
    Hypot,
}

impl Function {
    /// Look up a function by name. Accepts an optional `Math.` prefix.
    pub fn lookup(name: &str) -> Option<Self> {
        let name = name.strip_prefix("Math.").unwrap_or(name);
        let function = match name {
            "sin" => Function::Sin,
            "cos" => Function::Cos,
            "tan" => Function::Tan,
            "asin" => Function::Asin,
            "acos" => Function::Acos,
            "atan" => Function::Atan,
            "atan2" => Function::Atan2,
            "sinh" => Function::Sinh,
            "cosh" => Function::Cosh,
            "tanh" => Function::Tanh,
            "sqrt" => Function::Sqrt,
            "cbrt" => Function::Cbrt,
            "abs" => Function::Abs,
            "exp" => Function::Exp,
            "ln" | "log" => Function::Ln,
            "log10" => Function::Log10,
            "log2" => Function::Log2,
            "floor" => Function::Floor,
            "ceil" => Function::Ceil,
            "round" => Function::Round,
            "trunc" => Function::Trunc,
            "sign" => Function::Sign,
            "min" => Function::Min,
            "max" => Function::Max,
            "pow" => Function::Pow,
            "hypot" => Function::Hypot,
            _ => return None,
        };
        Some(function)
    }

    /// Number of arguments, `None` for variadic (`min`, `max`: one or more)
    pub fn arity(&self) -> Option<usize> {
        match self {
            Function::Atan2 | Function::Pow | Function::Hypot => Some(2),
            Function::Min | Function::Max => None,
            _ => Some(1),
        }
    }

    fn apply(&self, args: &[f64]) -> f64 {
        let a = args.first().copied().unwrap_or(f64::NAN);
        let b = args.get(1).copied().unwrap_or(f64::NAN);
        match self {
            Function::Sin => a.sin(),
            Function::Cos => a.cos(),
            Function::Tan => a.tan(),
            Function::Asin => a.asin(),
            Function::Acos => a.acos(),
            Function::Atan => a.atan(),
            Function::Atan2 => a.atan2(b),
            Function::Sinh => a.sinh(),
            Function::Cosh => a.cosh(),
            Function::Tanh => a.tanh(),
            Function::Sqrt => a.sqrt(),
            Function::Cbrt => a.cbrt(),
            Function::Abs => a.abs(),
            Function::Exp => a.exp(),
            Function::Ln => a.ln(),
            Function::Log10 => a.log10(),
            Function::Log2 => a.log2(),
            Function::Floor => a.floor(),
            // Half-way cases round towards +inf, as Math.round does
            Function::Round => (a + 0.5).floor(),
            Function::Ceil => a.ceil(),
            Function::Trunc => a.trunc(),
            Function::Sign => {
                if a == 0.0 || a.is_nan() {
                    a
                } else {
                    a.signum()
                }
            }
            Function::Min => args.iter().copied().fold(f64::INFINITY, f64::min),
            Function::Max => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Function::Pow => a.powf(b),
            Function::Hypot => a.hypot(b),
        }
    }
}

fn lookup_constant(name: &str) -> Option<f64> {
    match name.strip_prefix("Math.").unwrap_or(name) {
        "PI" | "pi" => Some(std::f64::consts::PI),
        "E" | "e" => Some(std::f64::consts::E),
        _ => None,
    }
}

/// Parsed expression tree
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable,
    Neg(Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Call(Function, Vec<Expr>),
}

impl Expr {
    /// Evaluate the tree with the variable bound to `x`.
    ///
    /// Pure arithmetic: the result may be NaN or infinite, callers decide
    /// what that means.
    pub fn eval(&self, x: f64) -> f64 {
        match self {
            Expr::Number(value) => *value,
            Expr::Variable => x,
            Expr::Neg(inner) => -inner.eval(x),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(x);
                let b = rhs.eval(x);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Rem => a % b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Expr::Call(function, args) => {
                let values: Vec<f64> = args.iter().map(|arg| arg.eval(x)).collect();
                function.apply(&values)
            }
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(value) => write!(f, "{}", value),
            Expr::Variable => write!(f, "{}", VARIABLE),
            Expr::Neg(inner) => write!(f, "(-{})", inner),
            Expr::Binary(op, lhs, rhs) => {
                let symbol = match op {
                    BinaryOp::Add => "+",
                    BinaryOp::Sub => "-",
                    BinaryOp::Mul => "*",
                    BinaryOp::Div => "/",
                    BinaryOp::Rem => "%",
                    BinaryOp::Pow => "^",
                };
                write!(f, "({} {} {})", lhs, symbol, rhs)
            }
            Expr::Call(function, args) => {
                write!(f, "{:?}(", function)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// Parse expression text into an [`Expr`].
pub fn parse(source: &str) -> Result<Expr> {
    let tokens = tokenize(source)?;
    if tokens.len() > MAX_TOKENS {
        return Err(FxError::ExpressionSyntax {
            expression: source.to_string(),
            position: tokens[MAX_TOKENS].position,
            reason: format!("expression longer than {} tokens", MAX_TOKENS),
        });
    }
    let mut parser = Parser {
        source,
        tokens,
        pos: 0,
        depth: 0,
    };

    let expr = parser.expr()?;
    match parser.peek() {
        None => Ok(expr),
        Some(token) => Err(parser.syntax_error(token.position, "unexpected trailing input")),
    }
}

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|t| &t.kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn syntax_error(&self, position: usize, reason: &str) -> FxError {
        FxError::ExpressionSyntax {
            expression: self.source.to_string(),
            position,
            reason: reason.to_string(),
        }
    }

    fn end_error(&self) -> FxError {
        self.syntax_error(self.source.len(), "unexpected end of expression")
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<()> {
        match self.advance() {
            Some(token) if token.kind == kind => Ok(()),
            Some(token) => Err(self.syntax_error(token.position, &format!("expected {}", what))),
            None => Err(self.end_error()),
        }
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, position: usize, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_DEPTH {
            return Err(self.syntax_error(position, "expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn expr(&mut self) -> Result<Expr> {
        let mut lhs = self.term()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Plus) => BinaryOp::Add,
                Some(TokenKind::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.term()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn term(&mut self) -> Result<Expr> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek_kind() {
                Some(TokenKind::Star) => BinaryOp::Mul,
                Some(TokenKind::Slash) => BinaryOp::Div,
                Some(TokenKind::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            self.pos += 1;
            let rhs = self.unary()?;
            lhs = Expr::Binary(op, Box::new(lhs), Box::new(rhs));
        }
    }

    fn unary(&mut self) -> Result<Expr> {
        let (position, negate) = match self.peek() {
            Some(Token {
                kind: TokenKind::Minus,
                position,
            }) => (*position, true),
            Some(Token {
                kind: TokenKind::Plus,
                position,
            }) => (*position, false),
            _ => return self.power(),
        };
        self.pos += 1;
        let inner = self.nested(position, Self::unary)?;
        Ok(if negate {
            Expr::Neg(Box::new(inner))
        } else {
            inner
        })
    }

    fn power(&mut self) -> Result<Expr> {
        let base = self.primary()?;
        match self.peek() {
            Some(Token {
                kind: TokenKind::Caret | TokenKind::StarStar,
                position,
            }) => {
                let position = *position;
                self.pos += 1;
                // Right-associative: 2^3^2 == 2^(3^2)
                let exponent = self.nested(position, Self::unary)?;
                Ok(Expr::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)))
            }
            _ => Ok(base),
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.advance().ok_or_else(|| self.end_error())?;
        match token.kind {
            TokenKind::Number(value) => Ok(Expr::Number(value)),
            TokenKind::LParen => self.nested(token.position, |parser| {
                let inner = parser.expr()?;
                parser.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }),
            TokenKind::Ident(name) => self.nested(token.position, |parser| parser.identifier(name)),
            _ => Err(self.syntax_error(token.position, "expected a number, variable or '('")),
        }
    }

    fn identifier(&mut self, name: String) -> Result<Expr> {
        if self.peek_kind() == Some(&TokenKind::LParen) {
            let function =
                Function::lookup(&name).ok_or(FxError::UnknownIdentifier { name: name.clone() })?;
            self.pos += 1;
            let args = self.arguments()?;
            let valid = match function.arity() {
                Some(expected) => args.len() == expected,
                None => !args.is_empty(),
            };
            if !valid {
                return Err(FxError::WrongArity {
                    name,
                    expected: function.arity().unwrap_or(1),
                    got: args.len(),
                });
            }
            return Ok(Expr::Call(function, args));
        }

        if name == VARIABLE {
            return Ok(Expr::Variable);
        }
        lookup_constant(&name)
            .map(Expr::Number)
            .ok_or(FxError::UnknownIdentifier { name })
    }

    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if self.peek_kind() == Some(&TokenKind::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expr()?);
            match self.advance() {
                Some(Token {
                    kind: TokenKind::Comma,
                    ..
                }) => continue,
                Some(Token {
                    kind: TokenKind::RParen,
                    ..
                }) => return Ok(args),
                Some(token) => return Err(self.syntax_error(token.position, "expected ',' or ')'")),
                None => return Err(self.end_error()),
            }
        }
    }
}
