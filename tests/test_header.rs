//! Integration tests for header composition
//!
//! These tests run the whole pipeline: substitution, Jacobians, rendering and
//! the written file.

use std::fs;
use std::path::PathBuf;

use ekfgen::prelude::*;

fn exprs(items: &[&str]) -> Vec<Expr> {
    parse_all(items).expect("test expressions parse")
}

fn declarations(text: &str) -> Vec<&str> {
    text.lines()
        .map(str::trim)
        .filter(|l| l.starts_with("const double "))
        .collect()
}

fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("ekfgen-{}-{}", tag, std::process::id()));
    fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

// ═══════════════════════════════════════════════════════════════════════════════
// Jacobians
// ═══════════════════════════════════════════════════════════════════════════════

mod jacobians {
    use super::*;

    #[test]
    fn test_substituted_before_differentiation() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x", "y"]),
            exprs(&["x + dt * vx", "y + dt * vy"]),
            exprs(&["x"]),
        )
        .with_constants(Constants::new().with("dt", 0.1));

        let header = compose(&spec, &HeaderOptions::default(), "planar.h").unwrap();
        assert!(header
            .text
            .contains("const double fx[2] = {x[0] + 0.1 * vx, x[1] + 0.1 * vy};"));
        assert!(header.text.contains("const double F[4] = {1.0, 0.0, 0.0, 1.0};"));
        assert_eq!(header.parameters, vec!["vx", "vy"]);
    }

    #[test]
    fn test_single_observation_row() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x", "y"]),
            exprs(&["x", "y"]),
            exprs(&["x"]),
        );
        let header = compose(&spec, &HeaderOptions::default(), "obs.h").unwrap();
        assert!(header.text.contains("const double H[2] = {1.0, 0.0};"));
        assert!(header.text.contains("double H_out[Mobs][Nsta]"));
        assert_eq!((header.state_dim, header.obs_dim), (2, 1));
    }

    #[test]
    fn test_nonlinear_entries() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["r", "theta"]),
            exprs(&["r", "theta + w"]),
            exprs(&["r * cos(theta)", "r * sin(theta)"]),
        );
        let text = compose(&spec, &HeaderOptions::default(), "polar.h").unwrap().text;
        assert!(text.contains(
            "const double H[4] = {cos(x[1]), x[0] * (-sin(x[1])), sin(x[1]), x[0] * cos(x[1])};"
        ));
    }

    #[test]
    fn test_supplied_and_computed_agree() {
        let state = Expr::symbols_from(&["a", "b"]);
        let px = exprs(&["a + k * b", "b"]);
        let hx = exprs(&["a"]);
        let constants = Constants::new().with("k", 2.0);

        let computed = HeaderSpec::new(state.clone(), px.clone(), hx.clone())
            .with_constants(constants.clone());
        let supplied = HeaderSpec::new(state, px, hx)
            .with_f(matrix_from_rows(vec![exprs(&["1", "k"]), exprs(&["0", "1"])]).unwrap())
            .with_h(ekfgen::dmatrix![Expr::one(), Expr::zero()])
            .with_constants(constants);

        let options = HeaderOptions::default();
        let a = compose(&computed, &options, "k.h").unwrap();
        let b = compose(&supplied, &options, "k.h").unwrap();
        assert_eq!(a.text, b.text);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Layout
// ═══════════════════════════════════════════════════════════════════════════════

mod layout {
    use super::*;

    #[test]
    fn test_empty_post_has_four_declarations() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x"]),
            exprs(&["x"]),
            exprs(&["x"]),
        );
        let text = compose(&spec, &HeaderOptions::default(), "one.h").unwrap().text;
        let decls = declarations(&text);
        assert_eq!(decls.len(), 4);
        assert!(decls[0].starts_with("const double fx["));
        assert!(decls[1].starts_with("const double F["));
        assert!(decls[2].starts_with("const double hx["));
        assert!(decls[3].starts_with("const double H["));
    }

    #[test]
    fn test_post_in_insertion_order() {
        let q = matrix_from_rows(vec![exprs(&["q", "0"]), exprs(&["0", "q"])]).unwrap();
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x"]),
            exprs(&["x"]),
            exprs(&["x"]),
        )
        .with_post(vec![
            ("Q".to_string(), Array::Matrix(q)),
            ("R".to_string(), Array::Vector(exprs(&["0.5"]))),
            ("P0".to_string(), Array::Vector(exprs(&["1e-7"]))),
        ])
        .with_constants(Constants::new().with("q", 0.01));

        let text = compose(&spec, &HeaderOptions::default(), "noise.h").unwrap().text;
        let decls = declarations(&text);
        assert_eq!(
            &decls[4..],
            &[
                "const double Q[4] = {0.01, 0.0, 0.0, 0.01};",
                "const double R[1] = {0.5};",
                "const double P0[1] = {1e-7};",
            ]
        );
        assert!(text.contains("double Q_out[4], double R_out[1], double P0_out[1])"));
        assert!(text.contains("memcpy(P0_out, P0, sizeof(P0));"));
    }

    #[test]
    fn test_empty_post_array() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x"]),
            exprs(&["x"]),
            exprs(&["x"]),
        )
        .push_post("unused", Vec::<Expr>::new());
        let text = compose(&spec, &HeaderOptions::default(), "e.h").unwrap().text;
        assert!(text.contains("const double unused[1] = {0.0}; /* empty 0x1 */"));
        assert!(!text.contains("memcpy(unused_out"));
    }

    #[test]
    fn test_unused_constant_is_harmless() {
        let base = HeaderSpec::new(
            Expr::symbols_from(&["x", "y"]),
            exprs(&["x + y", "y"]),
            exprs(&["x"]),
        );
        let with_k = base.clone().with_constants(Constants::new().with("k", 5.0));
        let options = HeaderOptions::default();
        assert_eq!(
            compose(&base, &options, "k.h").unwrap(),
            compose(&with_k, &options, "k.h").unwrap()
        );
    }

    #[test]
    fn test_byte_for_byte_reproducible() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x", "y", "vx", "vy"]),
            exprs(&["x + dt * vx", "y + dt * vy", "vx", "vy - g * dt"]),
            exprs(&["sqrt(x^2 + y^2)", "atan2(y, x)"]),
        )
        .with_constants(Constants::new().with("g", 9.81).with("dt", 0.05).with("unused", 1.0));
        let options = HeaderOptions::default();
        let first = compose(&spec, &options, "r.h").unwrap();
        for _ in 0..5 {
            assert_eq!(compose(&spec.clone(), &options, "r.h").unwrap().text, first.text);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

mod errors {
    use super::*;

    #[test]
    fn test_px_length_mismatch() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x", "y"]),
            exprs(&["x"]),
            exprs(&["x"]),
        );
        let err = compose(&spec, &HeaderOptions::default(), "bad.h").unwrap_err();
        match err {
            EkfGenError::DimensionMismatch { what, .. } => assert_eq!(what, "px"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_supplied_h_wrong_shape() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x", "y"]),
            exprs(&["x", "y"]),
            exprs(&["x"]),
        )
        .with_h(matrix_from_rows(vec![exprs(&["1"])]).unwrap());
        let err = compose(&spec, &HeaderOptions::default(), "bad.h").unwrap_err();
        match err {
            EkfGenError::DimensionMismatch {
                what,
                expected,
                found,
            } => {
                assert_eq!(what, "H");
                assert_eq!(expected, "1x2");
                assert_eq!(found, "1x1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parameter_shadowing_math_function() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x"]),
            exprs(&["x * exp"]),
            exprs(&["exp(x)"]),
        );
        match compose(&spec, &HeaderOptions::default(), "m.h") {
            Err(EkfGenError::DuplicateName { name }) => assert_eq!(name, "exp"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_parameters_shadowing_library_names() {
        for name in ["memcpy", "NAN", "pow", "atan2", "fabs", "M_EKF_H"] {
            let px = format!("x * {}", name);
            let spec = HeaderSpec::new(
                Expr::symbols_from(&["x"]),
                exprs(&[px.as_str()]),
                exprs(&["x"]),
            );
            assert!(
                matches!(
                    compose(&spec, &HeaderOptions::default(), "m-ekf.h"),
                    Err(EkfGenError::DuplicateName { .. })
                ),
                "{name} accepted as a parameter"
            );
        }

        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x"]),
            exprs(&["x * k"]),
            exprs(&["x"]),
        );
        let header = compose(&spec, &HeaderOptions::default(), "m-ekf.h").unwrap();
        assert_eq!(header.parameters, vec!["k".to_string()]);
    }

    #[test]
    fn test_cyclic_constants() {
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x"]),
            exprs(&["x * a"]),
            exprs(&["x"]),
        )
        .with_constants(
            Constants::new()
                .with("a", parse("b").unwrap())
                .with("b", parse("a").unwrap()),
        );
        assert!(matches!(
            compose(&spec, &HeaderOptions::default(), "c.h"),
            Err(EkfGenError::CyclicConstant { .. })
        ));
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Output
// ═══════════════════════════════════════════════════════════════════════════════

mod output {
    use super::*;

    #[test]
    fn test_writes_file() {
        let dir = scratch_dir("write");
        let path = dir.join("parabola-ekf.h");
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x"]),
            exprs(&["x"]),
            exprs(&["x"]),
        );
        let header = output_header(&path, &spec, &HeaderOptions::default()).unwrap();
        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, header.text);
        assert!(written.contains("#ifndef PARABOLA_EKF_H"));

        let leftovers: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_directory_reports_path() {
        let path = std::env::temp_dir()
            .join("ekfgen-missing-dir")
            .join("deeper")
            .join("out.h");
        let spec = HeaderSpec::new(
            Expr::symbols_from(&["x"]),
            exprs(&["x"]),
            exprs(&["x"]),
        );
        match output_header(&path, &spec, &HeaderOptions::default()) {
            Err(EkfGenError::OutputWriteFailure { path: reported, .. }) => {
                assert_eq!(reported, path)
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_failed_composition_leaves_file_untouched() {
        let dir = scratch_dir("untouched");
        let path = dir.join("keep.h");
        fs::write(&path, "previous").unwrap();

        let spec = HeaderSpec::new(Expr::symbols_from(&["x"]), vec![], vec![]);
        assert!(output_header(&path, &spec, &HeaderOptions::default()).is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
        fs::remove_dir_all(&dir).unwrap();
    }
}
