// Expression tree types shared by substitution, differentiation and rendering
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};

/// A named atom: a state variable, a constant or a free parameter.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Symbol::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Symbol(name)
    }
}

/// Elementary single-argument functions understood by the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Exp,
    Ln,
    Sqrt,
    Abs,
}

impl Function {
    pub const ALL: [Function; 13] = [
        Self::Sin,
        Self::Cos,
        Self::Tan,
        Self::Asin,
        Self::Acos,
        Self::Atan,
        Self::Sinh,
        Self::Cosh,
        Self::Tanh,
        Self::Exp,
        Self::Ln,
        Self::Sqrt,
        Self::Abs,
    ];

    /// Name of the function in `<math.h>`
    pub fn c_name(&self) -> &'static str {
        match self {
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Exp => "exp",
            Self::Ln => "log",
            Self::Sqrt => "sqrt",
            Self::Abs => "fabs",
        }
    }

    /// Look up a function by the name used in expression text
    pub fn from_name(name: &str) -> Option<Self> {
        let func = match name {
            "sin" => Self::Sin,
            "cos" => Self::Cos,
            "tan" => Self::Tan,
            "asin" => Self::Asin,
            "acos" => Self::Acos,
            "atan" => Self::Atan,
            "sinh" => Self::Sinh,
            "cosh" => Self::Cosh,
            "tanh" => Self::Tanh,
            "exp" => Self::Exp,
            "ln" | "log" => Self::Ln,
            "sqrt" => Self::Sqrt,
            "abs" | "fabs" => Self::Abs,
            _ => return None,
        };
        Some(func)
    }

    pub fn apply(&self, v: f64) -> f64 {
        match self {
            Self::Sin => v.sin(),
            Self::Cos => v.cos(),
            Self::Tan => v.tan(),
            Self::Asin => v.asin(),
            Self::Acos => v.acos(),
            Self::Atan => v.atan(),
            Self::Sinh => v.sinh(),
            Self::Cosh => v.cosh(),
            Self::Tanh => v.tanh(),
            Self::Exp => v.exp(),
            Self::Ln => v.ln(),
            Self::Sqrt => v.sqrt(),
            Self::Abs => v.abs(),
        }
    }
}

/// Symbolic expression.
///
/// Expressions are immutable values: substitution and differentiation always
/// build a new tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Literal(f64),
    Symbol(Symbol),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
    Call(Function, Box<Expr>),
    Atan2(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn symbol(name: impl Into<String>) -> Self {
        Expr::Symbol(Symbol::new(name))
    }

    /// A list of symbols, e.g. `Expr::symbols_from(&["x", "y"])`
    pub fn symbols_from(names: &[&str]) -> Vec<Expr> {
        names.iter().map(|n| Expr::symbol(*n)).collect()
    }

    pub fn zero() -> Self {
        Expr::Literal(0.0)
    }

    pub fn one() -> Self {
        Expr::Literal(1.0)
    }

    pub fn pow(self, exponent: impl Into<Expr>) -> Self {
        Expr::Pow(Box::new(self), Box::new(exponent.into()))
    }

    pub fn call(func: Function, arg: impl Into<Expr>) -> Self {
        Expr::Call(func, Box::new(arg.into()))
    }

    pub fn atan2(y: impl Into<Expr>, x: impl Into<Expr>) -> Self {
        Expr::Atan2(Box::new(y.into()), Box::new(x.into()))
    }

    pub fn sin(self) -> Self {
        Expr::call(Function::Sin, self)
    }

    pub fn cos(self) -> Self {
        Expr::call(Function::Cos, self)
    }

    pub fn exp(self) -> Self {
        Expr::call(Function::Exp, self)
    }

    pub fn ln(self) -> Self {
        Expr::call(Function::Ln, self)
    }

    pub fn sqrt(self) -> Self {
        Expr::call(Function::Sqrt, self)
    }

    pub fn is_symbol(&self) -> bool {
        matches!(self, Expr::Symbol(_))
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Expr::Symbol(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_literal(&self) -> Option<f64> {
        match self {
            Expr::Literal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Literal(v) if *v == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Literal(v) if *v == 1.0)
    }

    /// Whether `symbol` occurs anywhere in the tree
    pub fn contains(&self, symbol: &Symbol) -> bool {
        match self {
            Expr::Literal(_) => false,
            Expr::Symbol(s) => s == symbol,
            Expr::Neg(e) | Expr::Call(_, e) => e.contains(symbol),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b)
            | Expr::Atan2(a, b) => a.contains(symbol) || b.contains(symbol),
        }
    }

    /// All symbols referenced by the expression, sorted by name
    pub fn symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    pub(crate) fn collect_symbols(&self, out: &mut BTreeSet<Symbol>) {
        match self {
            Expr::Literal(_) => {}
            Expr::Symbol(s) => {
                out.insert(s.clone());
            }
            Expr::Neg(e) | Expr::Call(_, e) => e.collect_symbols(out),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b)
            | Expr::Atan2(a, b) => {
                a.collect_symbols(out);
                b.collect_symbols(out);
            }
        }
    }

    /// Rebuild the tree, replacing every symbol leaf with `f(symbol)`.
    ///
    /// Returning `Ok(None)` keeps the symbol as it is.
    pub fn try_map_symbols<E>(
        &self,
        f: &mut dyn FnMut(&Symbol) -> Result<Option<Expr>, E>,
    ) -> Result<Expr, E> {
        let out = match self {
            Expr::Literal(v) => Expr::Literal(*v),
            Expr::Symbol(s) => match f(s)? {
                Some(replacement) => replacement,
                None => Expr::Symbol(s.clone()),
            },
            Expr::Neg(e) => Expr::Neg(Box::new(e.try_map_symbols(f)?)),
            Expr::Call(func, e) => Expr::Call(*func, Box::new(e.try_map_symbols(f)?)),
            Expr::Add(a, b) => {
                let (a, b) = map_pair(a, b, f)?;
                Expr::Add(a, b)
            }
            Expr::Sub(a, b) => {
                let (a, b) = map_pair(a, b, f)?;
                Expr::Sub(a, b)
            }
            Expr::Mul(a, b) => {
                let (a, b) = map_pair(a, b, f)?;
                Expr::Mul(a, b)
            }
            Expr::Div(a, b) => {
                let (a, b) = map_pair(a, b, f)?;
                Expr::Div(a, b)
            }
            Expr::Pow(a, b) => {
                let (a, b) = map_pair(a, b, f)?;
                Expr::Pow(a, b)
            }
            Expr::Atan2(a, b) => {
                let (a, b) = map_pair(a, b, f)?;
                Expr::Atan2(a, b)
            }
        };
        Ok(out)
    }

    /// Infallible form of [`try_map_symbols`](Self::try_map_symbols)
    pub fn map_symbols(&self, f: &mut dyn FnMut(&Symbol) -> Option<Expr>) -> Expr {
        let result: Result<Expr, std::convert::Infallible> =
            self.try_map_symbols(&mut |s| Ok(f(s)));
        match result {
            Ok(e) => e,
            Err(never) => match never {},
        }
    }

    /// Evaluate numerically. Unbound symbols evaluate to NaN.
    pub fn eval(&self, values: &HashMap<Symbol, f64>) -> f64 {
        match self {
            Expr::Literal(v) => *v,
            Expr::Symbol(s) => values.get(s).copied().unwrap_or(f64::NAN),
            Expr::Neg(e) => -e.eval(values),
            Expr::Add(a, b) => a.eval(values) + b.eval(values),
            Expr::Sub(a, b) => a.eval(values) - b.eval(values),
            Expr::Mul(a, b) => a.eval(values) * b.eval(values),
            Expr::Div(a, b) => a.eval(values) / b.eval(values),
            Expr::Pow(a, b) => a.eval(values).powf(b.eval(values)),
            Expr::Call(func, e) => func.apply(e.eval(values)),
            Expr::Atan2(y, x) => y.eval(values).atan2(x.eval(values)),
        }
    }
}

type Pair = (Box<Expr>, Box<Expr>);

fn map_pair<E>(
    a: &Expr,
    b: &Expr,
    f: &mut dyn FnMut(&Symbol) -> Result<Option<Expr>, E>,
) -> Result<Pair, E> {
    Ok((Box::new(a.try_map_symbols(f)?), Box::new(b.try_map_symbols(f)?)))
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Literal(v)
    }
}

impl From<Symbol> for Expr {
    fn from(s: Symbol) -> Self {
        Expr::Symbol(s)
    }
}

impl From<&Expr> for Expr {
    fn from(e: &Expr) -> Self {
        e.clone()
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Symbol(s) => write!(f, "{}", s),
            Expr::Neg(e) => write!(f, "-({})", e),
            Expr::Add(a, b) => write!(f, "({} + {})", a, b),
            Expr::Sub(a, b) => write!(f, "({} - {})", a, b),
            Expr::Mul(a, b) => write!(f, "({} * {})", a, b),
            Expr::Div(a, b) => write!(f, "({} / {})", a, b),
            Expr::Pow(a, b) => write!(f, "({} ^ {})", a, b),
            Expr::Call(func, e) => write!(f, "{}({})", func.c_name(), e),
            Expr::Atan2(y, x) => write!(f, "atan2({}, {})", y, x),
        }
    }
}

/// Token produced by the expression tokenizer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Num(f64),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Op(char),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub pos: usize,
    pub found: Option<Token>,
    pub expected: Vec<String>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.expected.is_empty() {
            write!(
                f,
                "parse error at token {} found={:?} expected={:?}",
                self.pos, self.found, self.expected
            )
        } else if let Some(tok) = &self.found {
            write!(f, "parse error at token {} found={:?}", self.pos, tok)
        } else {
            write!(f, "parse error at token {} found=<end>", self.pos)
        }
    }
}

impl std::error::Error for ParseError {}
