//! Writes `parabola-ekf.h` for a projectile tracked by noisy x/y position.
//!
//! ```text
//! cargo run --example parabola -- [output path]
//! ```
//!
//! The header plugs into a TinyEKF loop as
//! `model(ekf.x, ekf.fx, ekf.F, ekf.hx, ekf.H, Q, R, dt)`.

use anyhow::{Context, Result};
use ekfgen::prelude::*;

fn main() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "parabola-ekf.h".to_string());

    let state = Expr::symbols_from(&["x", "y", "vx", "vy"]);
    let px = parse_all(&["x + dt * vx", "y + dt * vy", "vx", "vy - g * dt"])?;
    let hx = parse_all(&["x", "y"])?;

    let q = matrix_from_rows(
        (0..4)
            .map(|i| {
                (0..4)
                    .map(|j| if i == j { Expr::symbol("q") } else { Expr::zero() })
                    .collect::<Vec<_>>()
            })
            .collect(),
    )?;
    let r = matrix_from_rows(vec![
        vec![Expr::symbol("r"), Expr::zero()],
        vec![Expr::zero(), Expr::symbol("r")],
    ])?;

    let spec = HeaderSpec::new(state, px, hx)
        .with_constants(
            Constants::new()
                .with("g", 9.81)
                .with("q", 1e-4)
                .with("r", 0.25),
        )
        .push_post("Q", q)
        .push_post("R", r);

    let header = output_header(&path, &spec, &HeaderOptions::default())
        .with_context(|| format!("generating {}", path))?;

    println!(
        "wrote {} (Nsta = {}, Mobs = {}, extra parameters: {})",
        path,
        header.state_dim,
        header.obs_dim,
        header.parameters.join(", ")
    );
    Ok(())
}
