//! C source rendering of expressions and expression arrays
//!
//! Every array becomes a single `const double` declaration whose initializer
//! lists the elements in row-major order. Operator precedence in the printed
//! text follows C, so the printed element re-parses to the same value.

use std::collections::HashMap;

use crate::expr::{Array, Expr, Symbol};

/// Separator between initializer elements
pub const SEPARATOR: &str = ", ";

// Binding strength of the printed forms, loosest first
const PREC_ADD: u8 = 1;
const PREC_MUL: u8 = 2;
const PREC_UNARY: u8 = 3;
const PREC_ATOM: u8 = 4;

/// Prints expressions as C source.
///
/// Symbols listed in the naming table are printed as the table says (for
/// example `x[0]` for the first state entry); all others print as their name.
#[derive(Debug, Clone, Default)]
pub struct CPrinter {
    names: HashMap<Symbol, String>,
}

impl CPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Printer that names each symbol of `state` as `array[i]`
    pub fn with_state(array: &str, state: &[Symbol]) -> Self {
        let names = state
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), format!("{}[{}]", array, i)))
            .collect();
        Self { names }
    }

    pub fn rename(&mut self, symbol: impl Into<Symbol>, text: impl Into<String>) {
        self.names.insert(symbol.into(), text.into());
    }

    /// C text of a single expression
    pub fn print(&self, e: &Expr) -> String {
        let mut out = String::new();
        self.write(e, &mut out);
        out
    }

    /// `const double NAME[SIZE] = {...};`
    ///
    /// An empty array still declares one element, since C has no zero-length
    /// arrays; a trailing comment records the original shape.
    pub fn render(&self, name: &str, data: &Array) -> String {
        if data.is_empty() {
            let (rows, cols) = data.shape();
            return format!(
                "const double {}[1] = {{0.0}}; /* empty {}x{} */",
                name, rows, cols
            );
        }
        let elements: Vec<String> = data.row_major().into_iter().map(|e| self.print(e)).collect();
        format!(
            "const double {}[{}] = {{{}}};",
            name,
            elements.len(),
            elements.join(SEPARATOR)
        )
    }

    fn write(&self, e: &Expr, out: &mut String) {
        match e {
            Expr::Literal(v) => out.push_str(&format_number(*v)),
            Expr::Symbol(s) => match self.names.get(s) {
                Some(text) => out.push_str(text),
                None => out.push_str(s.name()),
            },
            Expr::Neg(a) => {
                out.push('-');
                self.operand(a, PREC_UNARY, false, out);
            }
            Expr::Add(a, b) => self.binary(a, " + ", b, PREC_ADD, out),
            Expr::Sub(a, b) => self.binary(a, " - ", b, PREC_ADD, out),
            Expr::Mul(a, b) => self.binary(a, " * ", b, PREC_MUL, out),
            Expr::Div(a, b) => self.binary(a, " / ", b, PREC_MUL, out),
            Expr::Pow(a, b) => self.call("pow", &[a, b], out),
            Expr::Call(func, a) => self.call(func.c_name(), &[a], out),
            Expr::Atan2(y, x) => self.call("atan2", &[y, x], out),
        }
    }

    fn binary(&self, a: &Expr, op: &str, b: &Expr, prec: u8, out: &mut String) {
        self.operand(a, prec, false, out);
        out.push_str(op);
        self.operand(b, prec, true, out);
    }

    fn call(&self, name: &str, args: &[&Expr], out: &mut String) {
        out.push_str(name);
        out.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(SEPARATOR);
            }
            self.write(arg, out);
        }
        out.push(')');
    }

    // Left-associative: a right operand of equal precedence is wrapped.
    // Negations and negative literals are always wrapped so that `- -x` and
    // `a * -b` never reach the output.
    fn operand(&self, e: &Expr, parent: u8, right: bool, out: &mut String) {
        let wrap = is_negative(e) || {
            let own = precedence(e);
            own < parent || (right && own == parent)
        };
        if wrap {
            out.push('(');
            self.write(e, out);
            out.push(')');
        } else {
            self.write(e, out);
        }
    }
}

fn precedence(e: &Expr) -> u8 {
    match e {
        Expr::Add(..) | Expr::Sub(..) => PREC_ADD,
        Expr::Mul(..) | Expr::Div(..) => PREC_MUL,
        Expr::Neg(_) => PREC_UNARY,
        _ => PREC_ATOM,
    }
}

fn is_negative(e: &Expr) -> bool {
    match e {
        Expr::Neg(_) => true,
        // -INFINITY already carries its own parentheses
        Expr::Literal(v) => *v < 0.0 && v.is_finite(),
        _ => false,
    }
}

/// Shortest decimal text that reads back as the same `double`
pub fn format_number(v: f64) -> String {
    if v.is_nan() {
        "NAN".to_string()
    } else if v.is_infinite() {
        if v > 0.0 {
            "INFINITY".to_string()
        } else {
            "(-INFINITY)".to_string()
        }
    } else if v == 0.0 {
        "0.0".to_string()
    } else {
        format!("{:?}", v)
    }
}

/// Render `data` under `name` with a printer that has no naming table
pub fn render(name: &str, data: &Array) -> String {
    CPrinter::new().render(name, data)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::expr::{matrix_from_rows, parse};

    fn p(text: &str) -> String {
        CPrinter::new().print(&parse(text).unwrap())
    }

    #[test]
    fn test_numbers() {
        assert_eq!(format_number(1.0), "1.0");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(-0.0), "0.0");
        assert_eq!(format_number(1e-7), "1e-7");
        assert_eq!(format_number(f64::NAN), "NAN");
        assert_eq!(format_number(f64::NEG_INFINITY), "(-INFINITY)");
    }

    #[test]
    fn test_precedence() {
        assert_eq!(p("a - (b - c)"), "a - (b - c)");
        assert_eq!(p("(a - b) - c"), "a - b - c");
        assert_eq!(p("a / (b * c)"), "a / (b * c)");
        assert_eq!(p("(a + b) * c"), "(a + b) * c");
        assert_eq!(p("a * -b"), "a * (-b)");
        assert_eq!(p("x - -2"), "x - (-2.0)");
        assert_eq!(p("-(-x)"), "-(-x)");
        assert_eq!(p("-(a + b)"), "-(a + b)");
    }

    #[test]
    fn test_functions() {
        assert_eq!(p("x ^ 2"), "pow(x, 2.0)");
        assert_eq!(p("ln(abs(x))"), "log(fabs(x))");
        assert_eq!(p("atan2(y, x + 1)"), "atan2(y, x + 1.0)");
    }

    #[test]
    fn test_state_naming() {
        let printer = CPrinter::with_state("x", &[Symbol::new("px"), Symbol::new("vx")]);
        assert_eq!(printer.print(&parse("px + dt * vx").unwrap()), "x[0] + dt * x[1]");
    }

    #[test]
    fn test_row_major_flattening() {
        let m = matrix_from_rows(vec![
            vec![Expr::from(1.0), Expr::from(2.0), Expr::from(3.0)],
            vec![Expr::from(4.0), Expr::from(5.0), Expr::from(6.0)],
        ])
        .unwrap();
        assert_eq!(
            render("F", &Array::Matrix(m)),
            "const double F[6] = {1.0, 2.0, 3.0, 4.0, 5.0, 6.0};"
        );
    }

    #[test]
    fn test_single_row() {
        let m = matrix_from_rows(vec![vec![Expr::one(), Expr::zero()]]).unwrap();
        assert_eq!(render("H", &Array::Matrix(m)), "const double H[2] = {1.0, 0.0};");
    }

    #[test]
    fn test_empty() {
        assert_eq!(
            render("extra", &Array::Vector(vec![])),
            "const double extra[1] = {0.0}; /* empty 0x1 */"
        );
        let m = matrix_from_rows(vec![vec![], vec![]]).unwrap();
        assert_eq!(
            render("H", &Array::Matrix(m)),
            "const double H[1] = {0.0}; /* empty 2x0 */"
        );
    }

    #[test]
    fn test_printed_text_reparses_to_same_value() {
        let point = std::collections::HashMap::from([
            (Symbol::new("a"), 1.7),
            (Symbol::new("b"), -0.4),
            (Symbol::new("c"), 3.2),
        ]);
        let cases = [
            "a - (b - c) / (a * -c)",
            "-(a + b) ^ 2 - -c",
            "sqrt(a ^ 2 + b ^ 2) * cos(c) / (1 - b)",
            "atan2(b, a) - exp(-a * b) + 1e-7",
            "a / b / c - a / (b / c)",
        ];
        for text in cases {
            let original = parse(text).unwrap();
            let printed = CPrinter::new().print(&original);
            let reparsed = parse(&printed).unwrap();
            assert_relative_eq!(
                original.eval(&point),
                reparsed.eval(&point),
                max_relative = 1e-12
            );
        }
    }
}
