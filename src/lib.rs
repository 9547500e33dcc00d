//! Generate C headers for the TinyEKF Extended Kalman Filter library from
//! symbolic models.
//!
//! A model is a state vector, a transition function `px` and an observation
//! function `hx`. The generator substitutes named constants, computes the
//! Jacobians `F` and `H` symbolically when they are not supplied and writes a
//! header whose `model` function fills all four for TinyEKF's `ekf_step`.
//!
//! ```
//! use ekfgen::prelude::*;
//!
//! let spec = HeaderSpec::new(
//!     Expr::symbols_from(&["x", "v"]),
//!     parse_all(&["x + dt * v", "v"]).unwrap(),
//!     parse_all(&["x"]).unwrap(),
//! )
//! .with_constants(Constants::new().with("dt", 0.1));
//!
//! let header = compose(&spec, &HeaderOptions::default(), "cv-ekf.h").unwrap();
//! assert!(header.text.contains("const double F[4] = {1.0, 0.1, 0.0, 1.0};"));
//! ```

pub mod diff;
pub mod error;
pub mod expr;
pub mod header;
pub mod jacobian;
pub mod model;
pub mod render;
pub mod substitute;

pub use error::{EkfGenError, Result};
pub use expr::{Array, Expr, Matrix, Symbol};
pub use header::{compose, output_header, GeneratedHeader, HeaderOptions, HeaderSpec, Post};
pub use jacobian::jacobian;
pub use nalgebra::dmatrix;
pub use substitute::{substitute, Constants};

pub mod prelude {
    pub use crate::diff::{Differentiator, SymbolicDiff};
    pub use crate::expr::{
        matrix_from_rows, parse, parse_all, Array, Expr, Function, Matrix, Symbol,
    };
    pub use crate::header::{
        compose, output_header, GeneratedHeader, HeaderOptions, HeaderSpec, Post,
    };
    pub use crate::jacobian::{jacobian, jacobian_with};
    pub use crate::model::{generate_header, write_header, EkfModel};
    pub use crate::render::{render, CPrinter};
    pub use crate::substitute::{
        substitute, substitute_array, substitute_matrix, Constants, Substitution,
    };
    pub use crate::EkfGenError;
}
