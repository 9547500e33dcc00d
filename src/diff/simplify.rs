//! Local rewriting rules that bring derivative expressions to a canonical form.
//!
//! The rules are applied bottom-up in a single pass; each rule only looks at a
//! node and its already-simplified children, so the result is a fixed point.

use crate::expr::Expr;

/// Simplify `e` bottom-up.
///
/// Numeric sub-trees are folded, additive and multiplicative identities are
/// removed and any product with a literal zero collapses to `0.0`. `-0.0`
/// never survives.
pub fn simplify(e: &Expr) -> Expr {
    match e {
        Expr::Literal(v) => literal(*v),
        Expr::Symbol(_) => e.clone(),
        Expr::Neg(a) => neg(simplify(a)),
        Expr::Add(a, b) => add(simplify(a), simplify(b)),
        Expr::Sub(a, b) => sub(simplify(a), simplify(b)),
        Expr::Mul(a, b) => mul(simplify(a), simplify(b)),
        Expr::Div(a, b) => div(simplify(a), simplify(b)),
        Expr::Pow(a, b) => pow(simplify(a), simplify(b)),
        Expr::Call(func, a) => {
            let a = simplify(a);
            if let Expr::Literal(v) = a {
                let folded = func.apply(v);
                if folded.is_finite() {
                    return literal(folded);
                }
            }
            Expr::Call(*func, Box::new(a))
        }
        Expr::Atan2(y, x) => {
            let (y, x) = (simplify(y), simplify(x));
            match (&y, &x) {
                (Expr::Literal(a), Expr::Literal(b)) => literal(a.atan2(*b)),
                _ => Expr::Atan2(Box::new(y), Box::new(x)),
            }
        }
    }
}

fn literal(v: f64) -> Expr {
    // folds -0.0 into 0.0
    if v == 0.0 {
        Expr::Literal(0.0)
    } else {
        Expr::Literal(v)
    }
}

pub(crate) fn neg(a: Expr) -> Expr {
    match a {
        Expr::Literal(v) => literal(-v),
        Expr::Neg(inner) => *inner,
        other => Expr::Neg(Box::new(other)),
    }
}

pub(crate) fn add(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Literal(x), Expr::Literal(y)) => literal(x + y),
        (a, b) if a.is_zero() => b,
        (a, b) if b.is_zero() => a,
        (a, Expr::Neg(b)) => sub(a, *b),
        (a, b) => Expr::Add(Box::new(a), Box::new(b)),
    }
}

pub(crate) fn sub(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Literal(x), Expr::Literal(y)) => literal(x - y),
        (a, b) if b.is_zero() => a,
        (a, b) if a.is_zero() => neg(b),
        (a, b) if a == b => literal(0.0),
        (a, Expr::Neg(b)) => add(a, *b),
        (a, b) => Expr::Sub(Box::new(a), Box::new(b)),
    }
}

pub(crate) fn mul(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Literal(x), Expr::Literal(y)) => literal(x * y),
        (a, b) if a.is_zero() || b.is_zero() => literal(0.0),
        (a, b) if a.is_one() => b,
        (a, b) if b.is_one() => a,
        (Expr::Literal(x), b) if x == -1.0 => neg(b),
        (a, Expr::Literal(y)) if y == -1.0 => neg(a),
        (Expr::Neg(a), Expr::Neg(b)) => mul(*a, *b),
        (a, b) => Expr::Mul(Box::new(a), Box::new(b)),
    }
}

pub(crate) fn div(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Literal(x), Expr::Literal(y)) if y != 0.0 => literal(x / y),
        (a, _) if a.is_zero() => literal(0.0),
        (a, b) if b.is_one() => a,
        (a, b) => Expr::Div(Box::new(a), Box::new(b)),
    }
}

pub(crate) fn pow(a: Expr, b: Expr) -> Expr {
    match (a, b) {
        (Expr::Literal(x), Expr::Literal(y)) if x.powf(y).is_finite() => literal(x.powf(y)),
        (_, b) if b.is_zero() => literal(1.0),
        (a, b) if b.is_one() => a,
        (a, _) if a.is_one() => literal(1.0),
        (a, b) => Expr::Pow(Box::new(a), Box::new(b)),
    }
}
