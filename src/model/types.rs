//! Value types used in JSON model files

use serde::{Deserialize, Serialize};

use crate::error::{EkfGenError, Result};
use crate::expr::{matrix_from_rows, parse, Array, Expr};

// ═══════════════════════════════════════════════════════════════════════════════
// Scalars
// ═══════════════════════════════════════════════════════════════════════════════

/// Either an expression or a numeric value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExpressionOrNumber {
    /// A numeric constant
    Number(f64),
    /// Expression text, e.g. `"x + dt * vx"`
    Expression(String),
}

impl ExpressionOrNumber {
    /// Parse into an expression; `context` names the location for error messages
    pub fn to_expr(&self, context: &str) -> Result<Expr> {
        match self {
            Self::Number(n) => Ok(Expr::Literal(*n)),
            Self::Expression(s) => parse(s).map_err(|e| EkfGenError::invalid_expr(context, e)),
        }
    }
}

impl From<f64> for ExpressionOrNumber {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for ExpressionOrNumber {
    fn from(s: &str) -> Self {
        Self::Expression(s.to_string())
    }
}

pub(crate) fn to_exprs(items: &[ExpressionOrNumber], context: &str) -> Result<Vec<Expr>> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| item.to_expr(&format!("{}[{}]", context, i)))
        .collect()
}

pub(crate) fn to_rows(rows: &[Vec<ExpressionOrNumber>], context: &str) -> Result<Vec<Vec<Expr>>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| to_exprs(row, &format!("{}[{}]", context, i)))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════════
// Extra arrays
// ═══════════════════════════════════════════════════════════════════════════════

/// Data of an extra array: a flat list or a list of rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArraySpec {
    Vector(Vec<ExpressionOrNumber>),
    Matrix(Vec<Vec<ExpressionOrNumber>>),
}

impl ArraySpec {
    pub fn to_array(&self, context: &str) -> Result<Array> {
        match self {
            Self::Vector(items) => Ok(Array::Vector(to_exprs(items, context)?)),
            Self::Matrix(rows) => Ok(Array::Matrix(matrix_from_rows(to_rows(rows, context)?)?)),
        }
    }
}

/// One named extra array, emitted after `H` in file order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostEntry {
    pub name: String,
    pub data: ArraySpec,
}
