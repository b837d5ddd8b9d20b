//! Expression Module
//!
//! Sandboxed arithmetic over a single variable `x`:
//! - Tokenizer and recursive-descent parser (fixed grammar, whitelisted functions)
//! - `FunctionSpec`: compiled user function, including the `collatz` keyword
//! - Fail-soft evaluation (errors become `0` and are logged)

pub mod evaluator;
pub mod lexer;
pub mod parser;

pub use evaluator::{
    collatz_step, evaluate, is_collatz, FunctionSpec, COLLATZ_KEYWORD, DEFAULT_EXPRESSION,
};
pub use parser::{parse, BinaryOp, Expr, Function, VARIABLE};
