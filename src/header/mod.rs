//! Header composition
//!
//! Turns a symbolic model into a C header for TinyEKF. The header defines the
//! `Nsta`/`Mobs` dimension macros, includes the library header and provides a
//! `model` function that fills `fx`, `F`, `hx` and `H` (plus any extra arrays)
//! for the current state `x`.
//!
//! Processing is fixed:
//!
//! 1. constants are substituted into the state, `px`, `hx`, a supplied `F`/`H`
//!    and the extra arrays;
//! 2. `F` = ∂px/∂state and `H` = ∂hx/∂state are computed unless supplied;
//! 3. `fx`, `F`, `hx` and `H` are rendered, then each extra array in order;
//! 4. the fragments are wrapped in the boilerplate and, for
//!    [`output_header`], written to disk.

mod options;
mod output;

use std::collections::BTreeSet;
use std::path::Path;

pub use options::HeaderOptions;

use crate::error::{EkfGenError, Result};
use crate::expr::{Array, Expr, Function, Matrix, Symbol};
use crate::jacobian::jacobian;
use crate::render::CPrinter;
use crate::substitute::{Constants, Substitution};

use options::check_identifier;

/// Extra arrays appended after the standard four, in this order
pub type Post = Vec<(String, Array)>;

// Declarations every header contains
const STANDARD_NAMES: [&str; 5] = ["x", "fx", "F", "hx", "H"];

// Library names the generated code calls or expands, besides the math functions
const LIBRARY_NAMES: [&str; 5] = ["pow", "atan2", "memcpy", "NAN", "INFINITY"];

/// Everything needed to generate one header
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderSpec {
    /// State symbols, in filter order
    pub state: Vec<Expr>,
    /// State transition function
    pub px: Vec<Expr>,
    /// Observation function
    pub hx: Vec<Expr>,
    /// Transition Jacobian; computed from `px` when absent
    pub f: Option<Matrix>,
    /// Observation Jacobian; computed from `hx` when absent
    pub h: Option<Matrix>,
    pub constants: Constants,
    pub post: Post,
}

impl HeaderSpec {
    pub fn new(state: Vec<Expr>, px: Vec<Expr>, hx: Vec<Expr>) -> Self {
        Self {
            state,
            px,
            hx,
            f: None,
            h: None,
            constants: Constants::new(),
            post: Vec::new(),
        }
    }

    pub fn with_f(mut self, f: Matrix) -> Self {
        self.f = Some(f);
        self
    }

    pub fn with_h(mut self, h: Matrix) -> Self {
        self.h = Some(h);
        self
    }

    pub fn with_constants(mut self, constants: Constants) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_post(mut self, post: Post) -> Self {
        self.post = post;
        self
    }

    /// Append one extra array after those already present
    pub fn push_post(mut self, name: impl Into<String>, data: impl Into<Array>) -> Self {
        self.post.push((name.into(), data.into()));
        self
    }
}

/// A composed header
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedHeader {
    /// Complete file contents
    pub text: String,
    /// Value of the state dimension macro
    pub state_dim: usize,
    /// Value of the observation dimension macro
    pub obs_dim: usize,
    /// Free symbols, in the order they are appended to the function signature
    pub parameters: Vec<String>,
}

/// Compose the header text for `spec` without touching the filesystem.
///
/// `file_name` only feeds the banner and the derived include guard.
pub fn compose(
    spec: &HeaderSpec,
    options: &HeaderOptions,
    file_name: &str,
) -> Result<GeneratedHeader> {
    options.validate()?;
    let n = spec.state.len();
    let m = spec.hx.len();
    check_dimensions(spec, n, m)?;

    let substitution = Substitution::new(&spec.constants)?;
    let state = substitution.apply_all(&spec.state);
    let px = substitution.apply_all(&spec.px);
    let hx = substitution.apply_all(&spec.hx);
    let f = spec.f.as_ref().map(|f| substitution.apply_matrix(f));
    let h = spec.h.as_ref().map(|h| substitution.apply_matrix(h));
    let post: Vec<(&str, Array)> = spec
        .post
        .iter()
        .map(|(name, data)| (name.as_str(), substitution.apply_array(data)))
        .collect();
    tracing::debug!(constants = spec.constants.len(), "constants substituted");

    let unused = {
        let exprs = spec
            .state
            .iter()
            .chain(&spec.px)
            .chain(&spec.hx)
            .chain(spec.f.iter().flat_map(|f| f.iter()))
            .chain(spec.h.iter().flat_map(|h| h.iter()))
            .chain(spec.post.iter().flat_map(|(_, data)| data.row_major()));
        spec.constants.unused_keys(exprs)
    };
    for key in &unused {
        tracing::debug!(constant = %key, "constant does not occur in the model");
    }

    let state_syms = state_symbols(&state)?;
    let parameters = free_symbols(&state_syms, &px, &hx, f.as_ref(), h.as_ref(), &post);
    let guard = options.guard_for(file_name);
    check_names(options, &guard, &post, &parameters)?;

    let f = match f {
        Some(f) => f,
        None => {
            let f = jacobian(&px, &state)?;
            tracing::debug!(rows = f.nrows(), cols = f.ncols(), "computed F");
            f
        }
    };
    let h = match h {
        Some(h) => h,
        None => {
            let h = jacobian(&hx, &state)?;
            tracing::debug!(rows = h.nrows(), cols = h.ncols(), "computed H");
            h
        }
    };

    let printer = CPrinter::with_state("x", &state_syms);
    let dim_n = extent(&options.state_dim_macro, n);
    let dim_m = extent(&options.obs_dim_macro, m);
    let mut outputs = vec![
        Output::new(
            "fx",
            printer.render("fx", &Array::Vector(px)),
            n,
            format!("[{}]", dim_n),
        ),
        Output::new(
            "F",
            printer.render("F", &Array::Matrix(f)),
            n * n,
            format!("[{}][{}]", dim_n, dim_n),
        ),
        Output::new(
            "hx",
            printer.render("hx", &Array::Vector(hx)),
            m,
            format!("[{}]", dim_m),
        ),
        Output::new(
            "H",
            printer.render("H", &Array::Matrix(h)),
            m * n,
            format!("[{}][{}]", dim_m, dim_n),
        ),
    ];
    for (name, data) in &post {
        let size = data.len();
        outputs.push(Output::new(
            name,
            printer.render(name, data),
            size,
            format!("[{}]", size.max(1)),
        ));
    }
    tracing::debug!(arrays = outputs.len(), "arrays rendered");

    let text = assemble(options, file_name, &guard, n, m, &outputs, &parameters);
    Ok(GeneratedHeader {
        text,
        state_dim: n,
        obs_dim: m,
        parameters: parameters.into_iter().map(|s| s.name().to_string()).collect(),
    })
}

/// Compose the header for `spec` and write it to `path`.
///
/// The file is replaced atomically; when writing fails the previous contents
/// (if any) are untouched and [`EkfGenError::OutputWriteFailure`] is returned.
pub fn output_header(
    path: impl AsRef<Path>,
    spec: &HeaderSpec,
    options: &HeaderOptions,
) -> Result<GeneratedHeader> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let header = compose(spec, options, &file_name)?;
    output::write_atomic(path, &header.text)?;
    Ok(header)
}

// One rendered array and the output parameter it is copied into
struct Output {
    name: String,
    declaration: String,
    len: usize,
    extent: String,
}

impl Output {
    fn new(name: &str, declaration: String, len: usize, extent: String) -> Self {
        Self {
            name: name.to_string(),
            declaration,
            len,
            extent,
        }
    }
}

fn check_dimensions(spec: &HeaderSpec, n: usize, m: usize) -> Result<()> {
    if spec.px.len() != n {
        return Err(EkfGenError::dimension_mismatch(
            "px",
            format!("length {}", n),
            format!("length {}", spec.px.len()),
        ));
    }
    if let Some(f) = &spec.f {
        if f.shape() != (n, n) {
            return Err(EkfGenError::dimension_mismatch(
                "F",
                format!("{}x{}", n, n),
                format!("{}x{}", f.nrows(), f.ncols()),
            ));
        }
    }
    if let Some(h) = &spec.h {
        if h.shape() != (m, n) {
            return Err(EkfGenError::dimension_mismatch(
                "H",
                format!("{}x{}", m, n),
                format!("{}x{}", h.nrows(), h.ncols()),
            ));
        }
    }
    Ok(())
}

fn state_symbols(state: &[Expr]) -> Result<Vec<Symbol>> {
    let mut seen = BTreeSet::new();
    let mut symbols = Vec::with_capacity(state.len());
    for (index, e) in state.iter().enumerate() {
        let sym = e
            .as_symbol()
            .ok_or_else(|| EkfGenError::InvalidDifferentiationTarget {
                index,
                expr: e.to_string(),
            })?;
        if !seen.insert(sym.clone()) {
            return Err(EkfGenError::DuplicateSymbol {
                name: sym.to_string(),
            });
        }
        symbols.push(sym.clone());
    }
    Ok(symbols)
}

// Symbols left after substitution that are not state entries. Derivatives
// never introduce new symbols, so this can be taken before differentiating.
fn free_symbols(
    state: &[Symbol],
    px: &[Expr],
    hx: &[Expr],
    f: Option<&Matrix>,
    h: Option<&Matrix>,
    post: &[(&str, Array)],
) -> BTreeSet<Symbol> {
    let mut all = BTreeSet::new();
    let exprs = px
        .iter()
        .chain(hx)
        .chain(f.into_iter().flat_map(|f| f.iter()))
        .chain(h.into_iter().flat_map(|h| h.iter()))
        .chain(post.iter().flat_map(|(_, data)| data.row_major()));
    for e in exprs {
        e.collect_symbols(&mut all);
    }
    for s in state {
        all.remove(s);
    }
    all
}

// Array extent for a dimension; ISO C has no zero-size arrays
fn extent(dim_macro: &str, len: usize) -> &str {
    if len == 0 {
        "1"
    } else {
        dim_macro
    }
}

fn check_names(
    options: &HeaderOptions,
    guard: &str,
    post: &[(&str, Array)],
    parameters: &BTreeSet<Symbol>,
) -> Result<()> {
    let mut taken: BTreeSet<String> = STANDARD_NAMES
        .iter()
        .flat_map(|name| [name.to_string(), format!("{}_out", name)])
        .collect();
    taken.extend(Function::ALL.iter().map(|f| f.c_name().to_string()));
    taken.extend(LIBRARY_NAMES.iter().map(|name| name.to_string()));

    let mut claim = |name: String| -> Result<()> {
        if taken.insert(name.clone()) {
            Ok(())
        } else {
            Err(EkfGenError::DuplicateName { name })
        }
    };
    claim(options.function_name.clone())?;
    claim(options.state_dim_macro.clone())?;
    claim(options.obs_dim_macro.clone())?;
    claim(guard.to_string())?;
    for (name, _) in post {
        check_identifier(name)?;
        claim(name.to_string())?;
        claim(format!("{}_out", name))?;
    }
    for param in parameters {
        check_identifier(param.name())?;
        claim(param.name().to_string())?;
    }
    Ok(())
}

fn assemble(
    options: &HeaderOptions,
    file_name: &str,
    guard: &str,
    n: usize,
    m: usize,
    outputs: &[Output],
    parameters: &BTreeSet<Symbol>,
) -> String {
    let mut params = vec![format!(
        "const double x[{}]",
        extent(&options.state_dim_macro, n)
    )];
    params.extend(
        outputs
            .iter()
            .map(|o| format!("double {}_out{}", o.name, o.extent)),
    );
    params.extend(parameters.iter().map(|p| format!("double {}", p)));

    let mut body = String::new();
    for o in outputs {
        body.push_str(&format!("    {}\n", o.declaration));
    }
    body.push('\n');
    for o in outputs.iter().filter(|o| o.len > 0) {
        body.push_str(&format!(
            "    memcpy({name}_out, {name}, sizeof({name}));\n",
            name = o.name
        ));
    }

    let banner = if file_name.is_empty() {
        "/* Generated by ekfgen. Do not edit. */".to_string()
    } else {
        format!("/* {}: generated by ekfgen. Do not edit. */", file_name)
    };

    format!(
        r#"{banner}

#ifndef {guard}
#define {guard}

#include <math.h>
#include <string.h>

#define {dim_n} {n}
#define {dim_m} {m}

#include "{library}"

static void {function}({params})
{{
{body}}}

#endif /* {guard} */
"#,
        banner = banner,
        guard = guard,
        dim_n = options.state_dim_macro,
        n = n,
        dim_m = options.obs_dim_macro,
        m = m,
        library = options.library_include,
        function = options.function_name,
        params = params.join(", "),
        body = body,
    )
}
