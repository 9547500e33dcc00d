//! Replacement of named constants throughout a set of expressions
//!
//! A [`Constants`] map is resolved once into a [`Substitution`]: values that refer
//! to other constants are expanded until no key is left, so applying a
//! substitution twice gives the same result as applying it once.
//!
//! Keys that never occur in the expressions are accepted and simply unused.

use std::collections::{BTreeSet, HashMap};

use crate::error::{EkfGenError, Result};
use crate::expr::{Array, Expr, Matrix, Symbol};

/// Symbol name → value to substitute. Iteration order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constants {
    values: HashMap<Symbol, Expr>,
}

impl Constants {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a constant, returning the previous value
    pub fn insert(&mut self, name: impl Into<Symbol>, value: impl Into<Expr>) -> Option<Expr> {
        self.values.insert(name.into(), value.into())
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, name: impl Into<Symbol>, value: impl Into<Expr>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &Symbol) -> Option<&Expr> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &Symbol) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Symbol, &Expr)> {
        self.values.iter()
    }

    /// Keys reached neither from `exprs` nor through the values of keys that
    /// are, sorted by name
    pub fn unused_keys<'a>(&self, exprs: impl IntoIterator<Item = &'a Expr>) -> Vec<Symbol> {
        let mut seen = BTreeSet::new();
        for e in exprs {
            e.collect_symbols(&mut seen);
        }
        let mut pending: Vec<Symbol> = seen.iter().cloned().collect();
        while let Some(sym) = pending.pop() {
            if let Some(value) = self.values.get(&sym) {
                let mut reached = BTreeSet::new();
                value.collect_symbols(&mut reached);
                for next in reached {
                    if seen.insert(next.clone()) {
                        pending.push(next);
                    }
                }
            }
        }
        let mut unused: Vec<Symbol> = self
            .values
            .keys()
            .filter(|k| !seen.contains(*k))
            .cloned()
            .collect();
        unused.sort();
        unused
    }
}

impl<K: Into<Symbol>, V: Into<Expr>> FromIterator<(K, V)> for Constants {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<HashMap<Symbol, Expr>> for Constants {
    fn from(values: HashMap<Symbol, Expr>) -> Self {
        Self { values }
    }
}

/// A resolved constants map, ready to apply
#[derive(Debug, Clone)]
pub struct Substitution {
    resolved: HashMap<Symbol, Expr>,
}

impl Substitution {
    /// Resolve `constants` so that no value refers to another key.
    ///
    /// Fails with [`EkfGenError::CyclicConstant`] when constants are defined in
    /// terms of each other in a loop.
    pub fn new(constants: &Constants) -> Result<Self> {
        let mut resolved = HashMap::with_capacity(constants.len());
        let mut keys: Vec<&Symbol> = constants.values.keys().collect();
        keys.sort();
        for key in keys {
            let mut visiting = Vec::new();
            resolve(key, constants, &mut resolved, &mut visiting)?;
        }
        Ok(Self { resolved })
    }

    pub fn apply(&self, e: &Expr) -> Expr {
        e.map_symbols(&mut |s| self.resolved.get(s).cloned())
    }

    pub fn apply_all(&self, exprs: &[Expr]) -> Vec<Expr> {
        exprs.iter().map(|e| self.apply(e)).collect()
    }

    pub fn apply_matrix(&self, m: &Matrix) -> Matrix {
        m.map(|e| self.apply(&e))
    }

    pub fn apply_array(&self, a: &Array) -> Array {
        match a {
            Array::Vector(v) => Array::Vector(self.apply_all(v)),
            Array::Matrix(m) => Array::Matrix(self.apply_matrix(m)),
        }
    }
}

fn resolve(
    key: &Symbol,
    constants: &Constants,
    resolved: &mut HashMap<Symbol, Expr>,
    visiting: &mut Vec<Symbol>,
) -> Result<Expr> {
    if let Some(done) = resolved.get(key) {
        return Ok(done.clone());
    }
    if visiting.contains(key) {
        return Err(EkfGenError::CyclicConstant {
            name: key.to_string(),
        });
    }
    let raw = match constants.get(key) {
        Some(raw) => raw,
        None => return Ok(Expr::Symbol(key.clone())),
    };
    visiting.push(key.clone());
    let value = raw.try_map_symbols(&mut |s| {
        if constants.contains(s) {
            resolve(s, constants, resolved, visiting).map(Some)
        } else {
            Ok(None)
        }
    })?;
    visiting.pop();
    resolved.insert(key.clone(), value.clone());
    Ok(value)
}

/// Substitute `constants` into every expression, preserving order
pub fn substitute(exprs: &[Expr], constants: &Constants) -> Result<Vec<Expr>> {
    Ok(Substitution::new(constants)?.apply_all(exprs))
}

pub fn substitute_matrix(m: &Matrix, constants: &Constants) -> Result<Matrix> {
    Ok(Substitution::new(constants)?.apply_matrix(m))
}

pub fn substitute_array(a: &Array, constants: &Constants) -> Result<Array> {
    Ok(Substitution::new(constants)?.apply_array(a))
}
