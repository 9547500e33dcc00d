//! Jacobian matrices of expression vectors

use crate::diff::{simplify, Differentiator, SymbolicDiff};
use crate::error::{EkfGenError, Result};
use crate::expr::{Expr, Matrix, Symbol};

/// Jacobian of `outputs` with respect to `inputs` using [`SymbolicDiff`].
///
/// The result has one row per output and one column per input:
/// entry `(i, j)` is ∂outputs\[i\]/∂inputs\[j\].
pub fn jacobian(outputs: &[Expr], inputs: &[Expr]) -> Result<Matrix> {
    jacobian_with(&SymbolicDiff, outputs, inputs)
}

/// Jacobian using a caller-supplied differentiation capability.
///
/// Every input must be a bare symbol. Entries whose output does not mention
/// the input are the literal `0.0` without consulting `differentiator`; all
/// other entries are passed through [`Differentiator::simplify`], and any
/// result that still reduces to zero is replaced by the literal `0.0`.
pub fn jacobian_with(
    differentiator: &dyn Differentiator,
    outputs: &[Expr],
    inputs: &[Expr],
) -> Result<Matrix> {
    let vars = input_symbols(inputs)?;
    let cols = vars.len();
    let mut entries = Vec::with_capacity(outputs.len() * cols);
    for (i, out) in outputs.iter().enumerate() {
        for var in &vars {
            let entry = if out.contains(var) {
                let d = differentiator.diff(out, var);
                canonical_zero(differentiator.simplify(&d))
            } else {
                Expr::zero()
            };
            tracing::trace!(row = i, var = %var, entry = %entry, "jacobian entry");
            entries.push(entry);
        }
    }
    Ok(Matrix::from_row_iterator(outputs.len(), cols, entries))
}

fn input_symbols(inputs: &[Expr]) -> Result<Vec<Symbol>> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, e)| {
            e.as_symbol()
                .cloned()
                .ok_or_else(|| EkfGenError::InvalidDifferentiationTarget {
                    index,
                    expr: e.to_string(),
                })
        })
        .collect()
}

// Numerically-zero trees such as `0 * q - 0` or `-0.0` become `0.0`
fn canonical_zero(e: Expr) -> Expr {
    if e.is_zero() || simplify(&e).is_zero() {
        Expr::zero()
    } else {
        e
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::parse;

    fn exprs(items: &[&str]) -> Vec<Expr> {
        items.iter().map(|s| parse(s).unwrap()).collect()
    }

    struct Unsimplified;

    // Returns numerically-zero but structurally non-trivial results
    impl Differentiator for Unsimplified {
        fn diff(&self, _e: &Expr, _v: &Symbol) -> Expr {
            parse("0 * q - 0").unwrap()
        }
    }

    #[test]
    fn test_shape_and_order() {
        let outputs = exprs(&["x * y", "x + 2 * y", "y ^ 2"]);
        let inputs = Expr::symbols_from(&["x", "y"]);
        let j = jacobian(&outputs, &inputs).unwrap();

        assert_eq!((j.nrows(), j.ncols()), (3, 2));
        assert_eq!(j[(0, 0)], Expr::symbol("y"));
        assert_eq!(j[(0, 1)], Expr::symbol("x"));
        assert_eq!(j[(1, 0)], Expr::Literal(1.0));
        assert_eq!(j[(1, 1)], Expr::Literal(2.0));
        assert_eq!(j[(2, 0)], Expr::Literal(0.0));
        assert_eq!(j[(2, 1)], parse("2 * y").unwrap());
    }

    #[test]
    fn test_absent_variable_gives_zero_column() {
        let outputs = exprs(&["sin(x) * y", "exp(z)", "3"]);
        let j = jacobian(&outputs, &Expr::symbols_from(&["w"])).unwrap();
        assert_eq!(j.ncols(), 1);
        assert!(j.iter().all(|e| *e == Expr::Literal(0.0)));
    }

    #[test]
    fn test_compound_input_rejected() {
        let inputs = vec![Expr::symbol("x"), parse("x + y").unwrap()];
        let err = jacobian(&exprs(&["x"]), &inputs).unwrap_err();
        assert!(matches!(
            err,
            EkfGenError::InvalidDifferentiationTarget { index: 1, .. }
        ));
    }

    #[test]
    fn test_deterministic() {
        let outputs = exprs(&["atan2(y, x)", "sqrt(x^2 + y^2)"]);
        let inputs = Expr::symbols_from(&["x", "y"]);
        let a = jacobian(&outputs, &inputs).unwrap();
        let b = jacobian(&outputs, &inputs).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_plugged_differentiator_still_canonical() {
        let j = jacobian_with(&Unsimplified, &exprs(&["x"]), &Expr::symbols_from(&["x"]));
        assert_eq!(j.unwrap()[(0, 0)], Expr::Literal(0.0));
    }

    #[test]
    fn test_empty_inputs_and_outputs() {
        let j = jacobian(&[], &Expr::symbols_from(&["x", "y"])).unwrap();
        assert_eq!((j.nrows(), j.ncols()), (0, 2));
        let j = jacobian(&exprs(&["x"]), &[]).unwrap();
        assert_eq!((j.nrows(), j.ncols()), (1, 0));
    }
}
