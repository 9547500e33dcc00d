//! Main JSON model struct

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EkfGenError, Result};
use crate::expr::{matrix_from_rows, Symbol};
use crate::header::{HeaderOptions, HeaderSpec};
use crate::model::types::*;
use crate::substitute::Constants;

/// Supported schema versions
pub const SUPPORTED_SCHEMA_VERSIONS: &[&str] = &["1.0"];

/// A filter model described in JSON
///
/// # Example
///
/// ```
/// use ekfgen::model::EkfModel;
///
/// let json = r#"{
///     "schema": "1.0",
///     "name": "cv",
///     "state": ["x", "v"],
///     "px": ["x + dt * v", "v"],
///     "hx": ["x"],
///     "constants": { "dt": 0.1 }
/// }"#;
///
/// let model = EkfModel::from_str(json).unwrap();
/// assert_eq!(model.state, vec!["x", "v"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EkfModel {
    /// Schema version
    pub schema: String,

    /// Model name; also names the header when no file name is given
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    // ─────────────────────────────────────────────────────────────────────────
    // Model functions
    // ─────────────────────────────────────────────────────────────────────────
    /// State symbol names, in filter order
    pub state: Vec<String>,

    /// State transition function, one entry per state
    pub px: Vec<ExpressionOrNumber>,

    /// Observation function
    pub hx: Vec<ExpressionOrNumber>,

    /// Transition Jacobian as rows; computed when absent
    #[serde(rename = "F", default, skip_serializing_if = "Option::is_none")]
    pub f: Option<Vec<Vec<ExpressionOrNumber>>>,

    /// Observation Jacobian as rows; computed when absent
    #[serde(rename = "H", default, skip_serializing_if = "Option::is_none")]
    pub h: Option<Vec<Vec<ExpressionOrNumber>>>,

    // ─────────────────────────────────────────────────────────────────────────
    // Substitution and extras
    // ─────────────────────────────────────────────────────────────────────────
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub constants: HashMap<String, ExpressionOrNumber>,

    /// Extra arrays, emitted in this order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post: Vec<PostEntry>,

    /// Naming of the generated C code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header: Option<HeaderOptions>,
}

impl EkfModel {
    /// Parse from a JSON string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(json: &str) -> Result<Self> {
        let model: Self = serde_json::from_str(json)?;
        model.check_schema_version()?;
        Ok(model)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn check_schema_version(&self) -> Result<()> {
        if !SUPPORTED_SCHEMA_VERSIONS.contains(&self.schema.as_str()) {
            return Err(EkfGenError::UnsupportedSchema {
                version: self.schema.clone(),
                supported: SUPPORTED_SCHEMA_VERSIONS.join(", "),
            });
        }
        Ok(())
    }

    /// Header options, falling back to the defaults
    pub fn header_options(&self) -> HeaderOptions {
        self.header.clone().unwrap_or_default()
    }

    /// File name used when the header is composed without a target path
    pub fn file_name(&self) -> String {
        format!("{}.h", self.name)
    }

    /// Parse every expression and build the composer input
    pub fn into_spec(&self) -> Result<HeaderSpec> {
        let state: Vec<ExpressionOrNumber> = self
            .state
            .iter()
            .map(|s| ExpressionOrNumber::Expression(s.clone()))
            .collect();
        let mut spec = HeaderSpec::new(
            to_exprs(&state, "state")?,
            to_exprs(&self.px, "px")?,
            to_exprs(&self.hx, "hx")?,
        );
        if let Some(rows) = &self.f {
            spec = spec.with_f(matrix_from_rows(to_rows(rows, "F")?)?);
        }
        if let Some(rows) = &self.h {
            spec = spec.with_h(matrix_from_rows(to_rows(rows, "H")?)?);
        }

        let mut constants = Constants::new();
        for (name, value) in &self.constants {
            let expr = value.to_expr(&format!("constants.{}", name))?;
            constants.insert(Symbol::new(name.clone()), expr);
        }
        spec = spec.with_constants(constants);

        for entry in &self.post {
            let data = entry.data.to_array(&format!("post.{}", entry.name))?;
            spec = spec.push_post(entry.name.clone(), data);
        }
        Ok(spec)
    }
}
