//! JSON model files
//!
//! A model file names the state, gives `px` and `hx` as expression text and
//! optionally supplies `F`, `H`, constants, extra arrays and header naming:
//!
//! ```json
//! {
//!     "schema": "1.0",
//!     "name": "parabola-ekf",
//!     "state": ["x", "y", "vx", "vy"],
//!     "px": ["x + dt * vx", "y + dt * vy", "vx", "vy - g * dt"],
//!     "hx": ["x", "y"],
//!     "constants": { "g": 9.81 }
//! }
//! ```
//!
//! Symbols that are neither state entries nor constants (`dt` above) become
//! extra `double` parameters of the generated function.

#[allow(clippy::module_inception)]
mod model;
mod types;

use std::path::Path;

pub use model::{EkfModel, SUPPORTED_SCHEMA_VERSIONS};
pub use types::{ArraySpec, ExpressionOrNumber, PostEntry};

use crate::error::Result;
use crate::header::{compose, output_header, GeneratedHeader};

/// Parse a JSON model
pub fn parse_json(json: &str) -> Result<EkfModel> {
    EkfModel::from_str(json)
}

/// Parse a JSON model and compose its header in memory
pub fn generate_header(json: &str) -> Result<GeneratedHeader> {
    let model = EkfModel::from_str(json)?;
    let spec = model.into_spec()?;
    compose(&spec, &model.header_options(), &model.file_name())
}

/// Parse a JSON model and write its header to `path`
pub fn write_header(json: &str, path: impl AsRef<Path>) -> Result<GeneratedHeader> {
    let model = EkfModel::from_str(json)?;
    let spec = model.into_spec()?;
    output_header(path, &spec, &model.header_options())
}
