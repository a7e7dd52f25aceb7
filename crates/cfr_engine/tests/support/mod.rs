#![allow(dead_code)]

use cfr_engine::{Cmf, Matrix, Pcf};
use cfr_poly::Poly;
use std::collections::BTreeMap;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn poly(s: &str) -> Poly {
    s.parse().expect("valid polynomial")
}

pub fn matrix(grid: &[&[&str]]) -> Matrix {
    Matrix::parse_rows(grid).expect("valid matrix")
}

pub fn pcf(a: &str, b: &str) -> Pcf {
    Pcf::new(poly(a), poly(b))
}

fn field(entries: Vec<(&str, Matrix)>) -> Cmf {
    let matrices: BTreeMap<String, Matrix> = entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    Cmf::new(matrices).expect("conserving field")
}

pub fn e_cmf() -> Cmf {
    field(vec![
        ("x", matrix(&[&["1", "-y - 1"], &["-1", "x + y + 2"]])),
        ("y", matrix(&[&["0", "-y - 1"], &["-1", "x + y + 1"]])),
    ])
}

pub fn pi_cmf() -> Cmf {
    field(vec![
        ("x", matrix(&[&["x", "-x"], &["-y", "2x + y + 1"]])),
        ("y", matrix(&[&["1 + y", "-x"], &["-1 - y", "x + 2y + 1"]])),
    ])
}

/// Field of the pair `f = x + y`, `fbar = 1 + 3(x - y)`
pub fn ffbar_cmf() -> Cmf {
    Cmf::ffbar(&poly("x + y"), &poly("1 + 3x - 3y")).expect("valid pair")
}

/// Three-axis field over the Gauss hypergeometric parameters
pub fn hypergeometric_cmf() -> Cmf {
    let b = "(1 + 2a)*(1 + 2b)";
    field(vec![
        ("a", matrix(&[&["1 + 2a", b], &["1", "5 + 4a + 2b + 4c"]])),
        ("b", matrix(&[&["1 + 2b", b], &["1", "5 + 2a + 4b + 4c"]])),
        ("c", matrix(&[&["-1 - 2c", b], &["1", "3 + 2a + 2b + 2c"]])),
    ])
}
