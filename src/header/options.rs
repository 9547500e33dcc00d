use serde::{Deserialize, Serialize};

use crate::error::{EkfGenError, Result};

/// Names used in the generated header.
///
/// The defaults match what TinyEKF expects: a `model` function, the
/// `Nsta`/`Mobs` dimension macros and `tiny_ekf.h` as the library header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeaderOptions {
    /// Name of the generated `static void` function
    pub function_name: String,
    /// Header included after the dimension macros
    pub library_include: String,
    pub state_dim_macro: String,
    pub obs_dim_macro: String,
    /// Include guard; derived from the output file name when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<String>,
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self {
            function_name: "model".to_string(),
            library_include: "tiny_ekf.h".to_string(),
            state_dim_macro: "Nsta".to_string(),
            obs_dim_macro: "Mobs".to_string(),
            guard: None,
        }
    }
}

impl HeaderOptions {
    pub fn with_function_name(mut self, name: impl Into<String>) -> Self {
        self.function_name = name.into();
        self
    }

    pub fn with_library_include(mut self, include: impl Into<String>) -> Self {
        self.library_include = include.into();
        self
    }

    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard = Some(guard.into());
        self
    }

    /// Check that every name that lands in C source is an identifier
    pub(crate) fn validate(&self) -> Result<()> {
        for name in [&self.function_name, &self.state_dim_macro, &self.obs_dim_macro] {
            check_identifier(name)?;
        }
        if let Some(guard) = &self.guard {
            check_identifier(guard)?;
        }
        if self.library_include.is_empty()
            || self
                .library_include
                .chars()
                .any(|c| c == '"' || c == '\n' || c == '\r')
        {
            return Err(EkfGenError::invalid_identifier(self.library_include.clone()));
        }
        Ok(())
    }

    /// The configured guard, or one built from `file_name`
    pub(crate) fn guard_for(&self, file_name: &str) -> String {
        match &self.guard {
            Some(guard) => guard.clone(),
            None => guard_from_file_name(file_name),
        }
    }
}

const C_KEYWORDS: &[&str] = &[
    "auto", "break", "case", "char", "const", "continue", "default", "do", "double", "else",
    "enum", "extern", "float", "for", "goto", "if", "inline", "int", "long", "register",
    "restrict", "return", "short", "signed", "sizeof", "static", "struct", "switch", "typedef",
    "union", "unsigned", "void", "volatile", "while",
];

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let head_ok = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    head_ok && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !C_KEYWORDS.contains(&name)
}

pub(crate) fn check_identifier(name: &str) -> Result<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(EkfGenError::invalid_identifier(name))
    }
}

/// `parabola-ekf.h` → `PARABOLA_EKF_H`
pub(crate) fn guard_from_file_name(file_name: &str) -> String {
    let mut guard: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    if guard.is_empty() {
        return "EKF_MODEL_H".to_string();
    }
    if guard.starts_with(|c: char| c.is_ascii_digit()) {
        guard.insert(0, '_');
    }
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("dt"));
        assert!(is_identifier("_scale2"));
        assert!(!is_identifier("2x"));
        assert!(!is_identifier("a-b"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("double"));
    }

    #[test]
    fn test_guard_from_file_name() {
        assert_eq!(guard_from_file_name("parabola-ekf.h"), "PARABOLA_EKF_H");
        assert_eq!(guard_from_file_name("3d.h"), "_3D_H");
        assert_eq!(guard_from_file_name(""), "EKF_MODEL_H");
    }

    #[test]
    fn test_defaults_from_empty_json() {
        let opts: HeaderOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(opts, HeaderOptions::default());
        assert_eq!(opts.function_name, "model");
        assert_eq!(opts.state_dim_macro, "Nsta");
    }

    #[test]
    fn test_rejects_bad_names() {
        let opts = HeaderOptions::default().with_function_name("my model");
        assert!(matches!(
            opts.validate(),
            Err(EkfGenError::InvalidIdentifier { .. })
        ));
        let opts = HeaderOptions::default().with_library_include("a\"b.h");
        assert!(opts.validate().is_err());
    }
}
