//! Differentiation capability
//!
//! The Jacobian engine only needs "given `e` and `v`, produce ∂e/∂v". That
//! capability is the [`Differentiator`] trait; [`SymbolicDiff`] is the built-in
//! rule-based implementation.

mod simplify;

pub use simplify::simplify;

use simplify::{add, div, mul, neg, pow, sub};

use crate::expr::{Expr, Function, Symbol};

/// Produces partial derivatives of expressions
pub trait Differentiator {
    /// ∂e/∂v
    fn diff(&self, e: &Expr, v: &Symbol) -> Expr;

    /// Bring a derivative to canonical form. The default leaves it untouched.
    fn simplify(&self, e: &Expr) -> Expr {
        e.clone()
    }
}

/// Rule-based symbolic differentiation with the simplifier from [`simplify`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolicDiff;

impl Differentiator for SymbolicDiff {
    fn diff(&self, e: &Expr, v: &Symbol) -> Expr {
        simplify(&derivative(e, v))
    }

    fn simplify(&self, e: &Expr) -> Expr {
        simplify(e)
    }
}

fn lit(v: f64) -> Expr {
    Expr::Literal(v)
}

fn derivative(e: &Expr, v: &Symbol) -> Expr {
    if !e.contains(v) {
        return lit(0.0);
    }
    match e {
        Expr::Literal(_) => lit(0.0),
        Expr::Symbol(s) => lit(if s == v { 1.0 } else { 0.0 }),
        Expr::Neg(a) => neg(derivative(a, v)),
        Expr::Add(a, b) => add(derivative(a, v), derivative(b, v)),
        Expr::Sub(a, b) => sub(derivative(a, v), derivative(b, v)),
        Expr::Mul(a, b) => add(
            mul(derivative(a, v), (**b).clone()),
            mul((**a).clone(), derivative(b, v)),
        ),
        Expr::Div(a, b) => {
            let da = derivative(a, v);
            if !b.contains(v) {
                return div(da, (**b).clone());
            }
            let num = sub(
                mul(da, (**b).clone()),
                mul((**a).clone(), derivative(b, v)),
            );
            div(num, pow((**b).clone(), lit(2.0)))
        }
        Expr::Pow(base, exponent) => power_rule(base, exponent, v),
        Expr::Call(func, a) => mul(outer_derivative(*func, a), derivative(a, v)),
        Expr::Atan2(y, x) => {
            // d atan2(y, x) = (x dy - y dx) / (x^2 + y^2)
            let num = sub(
                mul((**x).clone(), derivative(y, v)),
                mul((**y).clone(), derivative(x, v)),
            );
            let den = add(
                pow((**x).clone(), lit(2.0)),
                pow((**y).clone(), lit(2.0)),
            );
            div(num, den)
        }
    }
}

fn power_rule(base: &Expr, exponent: &Expr, v: &Symbol) -> Expr {
    let b = base.clone();
    let n = exponent.clone();
    if !exponent.contains(v) {
        // n * b^(n - 1) * db
        let reduced = match &n {
            Expr::Literal(k) => lit(k - 1.0),
            _ => sub(n.clone(), lit(1.0)),
        };
        return mul(mul(n, pow(b, reduced)), derivative(base, v));
    }
    let ln_b = Expr::call(Function::Ln, b.clone());
    if !base.contains(v) {
        // b^n * ln(b) * dn
        return mul(mul(pow(b, n), ln_b), derivative(exponent, v));
    }
    // b^n * (dn * ln(b) + n * db / b)
    let inner = add(
        mul(derivative(exponent, v), ln_b),
        div(mul(n.clone(), derivative(base, v)), b.clone()),
    );
    mul(pow(b, n), inner)
}

// f'(a) for each elementary function
fn outer_derivative(func: Function, a: &Expr) -> Expr {
    let one_minus_sq = || sub(lit(1.0), pow(a.clone(), lit(2.0)));
    let a = a.clone();
    match func {
        Function::Sin => Expr::call(Function::Cos, a),
        Function::Cos => neg(Expr::call(Function::Sin, a)),
        Function::Tan => div(lit(1.0), pow(Expr::call(Function::Cos, a), lit(2.0))),
        Function::Asin => div(lit(1.0), Expr::call(Function::Sqrt, one_minus_sq())),
        Function::Acos => neg(div(lit(1.0), Expr::call(Function::Sqrt, one_minus_sq()))),
        Function::Atan => div(lit(1.0), add(lit(1.0), pow(a, lit(2.0)))),
        Function::Sinh => Expr::call(Function::Cosh, a),
        Function::Cosh => Expr::call(Function::Sinh, a),
        Function::Tanh => sub(lit(1.0), pow(Expr::call(Function::Tanh, a), lit(2.0))),
        Function::Exp => Expr::call(Function::Exp, a),
        Function::Ln => div(lit(1.0), a),
        Function::Sqrt => div(lit(1.0), mul(lit(2.0), Expr::call(Function::Sqrt, a))),
        Function::Abs => div(a.clone(), Expr::call(Function::Abs, a)),
    }
}
