//! Symbolic expressions
//!
//! A closed expression tree ([`Expr`]) over [`Symbol`]s, numeric literals,
//! arithmetic operators and a fixed set of elementary functions. Vectors and
//! matrices of expressions are carried as [`Array`].
//!
//! Expressions can be built with ordinary Rust operators or parsed from text:
//!
//! ```
//! use ekfgen::expr::{parse, Expr};
//!
//! let x = Expr::symbol("x");
//! let dt = Expr::symbol("dt");
//! let built = x + dt * Expr::symbol("vx");
//!
//! assert_eq!(parse("x + dt * vx").unwrap(), built);
//! ```

mod array;
mod ast;
mod ops;
mod parser;

pub use array::{matrix_from_rows, Array, Matrix};
pub use ast::{Expr, Function, ParseError, Symbol, Token};
pub use parser::{parse, parse_all, tokenize, Parser};
