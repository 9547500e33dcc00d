use nalgebra::DMatrix;

use crate::error::{EkfGenError, Result};
use crate::expr::ast::Expr;

/// Two-dimensional grid of expressions (Jacobians, supplied F/H, post matrices)
pub type Matrix = DMatrix<Expr>;

/// Build a matrix from rows, checking they all have the same length
pub fn matrix_from_rows(rows: Vec<Vec<Expr>>) -> Result<Matrix> {
    let nrows = rows.len();
    let ncols = rows.first().map(Vec::len).unwrap_or(0);
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
        return Err(EkfGenError::dimension_mismatch(
            format!("matrix row {}", i),
            format!("{} columns", ncols),
            format!("{} columns", row.len()),
        ));
    }
    let flat: Vec<Expr> = rows.into_iter().flatten().collect();
    Ok(Matrix::from_row_iterator(nrows, ncols, flat))
}

/// Either a vector or a matrix of expressions, as accepted by the renderer
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    Vector(Vec<Expr>),
    Matrix(Matrix),
}

impl Array {
    /// (rows, columns); a vector of length n is reported as (n, 1)
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Array::Vector(v) => (v.len(), 1),
            Array::Matrix(m) => (m.nrows(), m.ncols()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Array::Vector(v) => v.len(),
            Array::Matrix(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Elements in row-major order
    pub fn row_major(&self) -> Vec<&Expr> {
        match self {
            Array::Vector(v) => v.iter().collect(),
            Array::Matrix(m) => (0..m.nrows())
                .flat_map(|i| (0..m.ncols()).map(move |j| &m[(i, j)]))
                .collect(),
        }
    }
}

impl From<Vec<Expr>> for Array {
    fn from(v: Vec<Expr>) -> Self {
        Array::Vector(v)
    }
}

impl From<Matrix> for Array {
    fn from(m: Matrix) -> Self {
        Array::Matrix(m)
    }
}
