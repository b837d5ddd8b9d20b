//! Function specification and fail-soft evaluation
//!
//! A [`FunctionSpec`] is compiled once from the user's text. Evaluation
//! never fails from the caller's point of view: a malformed expression or
//! a non-numeric result evaluates to `0` and is logged.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{FxError, Result};
use crate::expr::parser::{parse, Expr};

/// Keyword selecting the Collatz step instead of a formula
pub const COLLATZ_KEYWORD: &str = "collatz";

/// Expression shown when a session starts or is reset
pub const DEFAULT_EXPRESSION: &str = "Math.sin(x)";

#[derive(Debug, Clone)]
enum FunctionKind {
    Collatz,
    Expression(Expr),
    /// Text that failed to compile; kept so every evaluation can report it
    Invalid(String),
}

/// User-supplied function definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FunctionSpec {
    expression_text: String,
    kind: FunctionKind,
}

impl FunctionSpec {
    /// Compile a function definition.
    ///
    /// Never fails: invalid text yields a spec that evaluates to `0`
    /// everywhere. Use [`FunctionSpec::compile`] to get the error instead.
    pub fn new(expression_text: impl Into<String>) -> Self {
        let expression_text = expression_text.into();
        let kind = match Self::compile_kind(&expression_text) {
            Ok(kind) => kind,
            Err(e) => {
                warn!("Invalid function expression '{}': {}", expression_text, e);
                FunctionKind::Invalid(e.to_string())
            }
        };
        Self {
            expression_text,
            kind,
        }
    }

    /// Compile a function definition, surfacing syntax errors.
    pub fn compile(expression_text: impl Into<String>) -> Result<Self> {
        let expression_text = expression_text.into();
        let kind = Self::compile_kind(&expression_text)?;
        Ok(Self {
            expression_text,
            kind,
        })
    }

    fn compile_kind(text: &str) -> Result<FunctionKind> {
        if is_collatz(text) {
            return Ok(FunctionKind::Collatz);
        }
        parse(text).map(FunctionKind::Expression)
    }

    /// The text this spec was compiled from
    pub fn expression_text(&self) -> &str {
        &self.expression_text
    }

    pub fn is_collatz(&self) -> bool {
        matches!(self.kind, FunctionKind::Collatz)
    }

    /// True if the text compiled successfully
    pub fn is_valid(&self) -> bool {
        !matches!(self.kind, FunctionKind::Invalid(_))
    }

    /// Evaluate f(x), reporting failures.
    pub fn try_evaluate(&self, x: f64) -> Result<f64> {
        let y = match &self.kind {
            FunctionKind::Collatz => collatz_step(x),
            FunctionKind::Expression(expr) => expr.eval(x),
            FunctionKind::Invalid(reason) => {
                return Err(FxError::ExpressionSyntax {
                    expression: self.expression_text.clone(),
                    position: 0,
                    reason: reason.clone(),
                })
            }
        };
        if y.is_finite() {
            Ok(y)
        } else {
            Err(FxError::NonFiniteResult { x })
        }
    }

    /// Evaluate f(x), substituting `0` on any failure.
    pub fn evaluate(&self, x: f64) -> f64 {
        match self.try_evaluate(x) {
            Ok(y) => y,
            Err(e) if !self.is_valid() => {
                // Already reported once at compile time
                debug!("Evaluating invalid expression '{}': {}", self.expression_text, e);
                0.0
            }
            Err(e) if e.is_expression_error() => {
                warn!("Invalid function expression '{}': {}", self.expression_text, e);
                0.0
            }
            Err(e) => {
                error!("Evaluating '{}' failed: {}", self.expression_text, e);
                0.0
            }
        }
    }
}

impl Default for FunctionSpec {
    fn default() -> Self {
        Self::new(DEFAULT_EXPRESSION)
    }
}

impl PartialEq for FunctionSpec {
    fn eq(&self, other: &Self) -> bool {
        self.expression_text == other.expression_text
    }
}

impl From<String> for FunctionSpec {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

impl From<&str> for FunctionSpec {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<FunctionSpec> for String {
    fn from(spec: FunctionSpec) -> Self {
        spec.expression_text
    }
}

/// Case-insensitive check for the collatz keyword
pub fn is_collatz(text: &str) -> bool {
    text.eq_ignore_ascii_case(COLLATZ_KEYWORD)
}

/// One step of the Collatz map: `x/2` for even x, `3x + 1` otherwise.
///
/// Non-integers are never even, so they take the `3x + 1` branch.
pub fn collatz_step(x: f64) -> f64 {
    if x % 2.0 == 0.0 {
        x / 2.0
    } else {
        3.0 * x + 1.0
    }
}

/// Evaluate `expression_text` at `x`, compiling it on the fly.
///
/// Convenience for one-off evaluations; hot loops should build a
/// [`FunctionSpec`] once.
pub fn evaluate(expression_text: &str, x: f64) -> f64 {
    FunctionSpec::new(expression_text).evaluate(x)
}
