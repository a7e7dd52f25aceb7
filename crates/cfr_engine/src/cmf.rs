//! Conservative matrix fields.
//!
//! A field assigns a matrix `M_x` to every axis `x` such that walking one
//! step along `x` then `y` equals walking along `y` then `x`:
//! `M_x(p) · M_y(p + e_x) == M_y(p) · M_x(p + e_y)`. Walks are then path
//! independent, and every trajectory reduces to a one-variable recurrence.

use cfr_poly::Poly;
use num_bigint::BigInt;
use num_rational::BigRational;
use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::companion::PcfFromMatrix;
use crate::config::AnalysisConfig;
use crate::error::{RecurrenceError, Result};
use crate::limit::Limit;
use crate::matrix::Matrix;
use crate::pcf::Pcf;
use crate::position::Position;
use crate::N_SYMBOL;

#[derive(Debug, Clone, PartialEq)]
pub struct Cmf {
    matrices: BTreeMap<String, Matrix>,
}

/// Outcome of analyzing one trajectory of a field
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryReport {
    pub trajectory: Position,
    /// Start after skipping the continued fraction's singular points
    pub start: Position,
    pub pcf: Pcf,
    /// Shortest decimal within the precision of the limit
    pub limit: String,
    pub precision: i64,
    pub delta: f64,
}

impl Cmf {
    /// Validated field; conservation of the forward steps is checked
    pub fn new(matrices: BTreeMap<String, Matrix>) -> Result<Self> {
        Self::with_config(matrices, &AnalysisConfig::default())
    }

    /// Validated field; backward steps are checked too when
    /// `config.check_negatives` is set
    pub fn with_config(matrices: BTreeMap<String, Matrix>, config: &AnalysisConfig) -> Result<Self> {
        let cmf = Self::new_unchecked(matrices)?;
        cmf.assert_conserving(config.check_negatives)?;
        Ok(cmf)
    }

    /// Checks the axis names and dimensions but not conservation
    pub fn new_unchecked(matrices: BTreeMap<String, Matrix>) -> Result<Self> {
        if matrices.contains_key(N_SYMBOL) {
            return Err(RecurrenceError::ReservedSymbol(N_SYMBOL.to_string()));
        }
        let mut dimension = None;
        for matrix in matrices.values() {
            matrix.require_square()?;
            match dimension {
                None => dimension = Some(matrix.rows()),
                Some(n) if n != matrix.rows() => {
                    return Err(RecurrenceError::Shape {
                        rows: matrix.rows(),
                        cols: matrix.cols(),
                    })
                }
                Some(_) => {}
            }
        }
        Ok(Self { matrices })
    }

    pub fn axes(&self) -> Vec<String> {
        self.matrices.keys().cloned().collect()
    }

    /// Free symbols that are not axes
    pub fn parameters(&self) -> BTreeSet<String> {
        let axes: BTreeSet<String> = self.matrices.keys().cloned().collect();
        self.free_symbols().difference(&axes).cloned().collect()
    }

    pub fn free_symbols(&self) -> BTreeSet<String> {
        self.matrices.values().flat_map(Matrix::free_symbols).collect()
    }

    /// Number of axes
    pub fn dim(&self) -> usize {
        self.matrices.len()
    }

    /// Size of the matrices
    pub fn n(&self) -> usize {
        self.matrices.values().next().map_or(0, Matrix::rows)
    }

    /// Step matrix along `axis`; backward steps are `M(axis - 1)^-1`
    pub fn m(&self, axis: &str, forward: bool) -> Result<Matrix> {
        let matrix = self.matrices.get(axis).ok_or_else(|| RecurrenceError::KeyMismatch {
            expected: self.axes(),
            found: vec![axis.to_string()],
        })?;
        if forward {
            Ok(matrix.clone())
        } else {
            Ok(matrix.inverse()?.shift(axis, -1))
        }
    }

    pub fn axis_vector(&self, axis: &str, forward: bool) -> Position {
        Position::axis_vector(&self.axes(), axis, forward)
    }

    /// All ones
    pub fn default_origin(&self) -> Position {
        Position::uniform(&self.axes(), 1)
    }

    /// Conservation for every axis pair, optionally for backward steps too
    pub fn assert_conserving(&self, check_negatives: bool) -> Result<()> {
        let axes = self.axes();
        let signs: &[(bool, bool)] = if check_negatives {
            &[(true, true), (false, true), (true, false), (false, false)]
        } else {
            &[(true, true)]
        };
        for (i, x) in axes.iter().enumerate() {
            for y in &axes[i + 1..] {
                for &(x_forward, y_forward) in signs {
                    if !self.are_conserving(x, y, x_forward, y_forward)? {
                        return Err(RecurrenceError::Conservation {
                            x: signed_axis(x, x_forward),
                            y: signed_axis(y, y_forward),
                        });
                    }
                }
                tracing::debug!(target: "cfr::cmf", %x, %y, "conserving");
            }
        }
        Ok(())
    }

    fn are_conserving(&self, x: &str, y: &str, x_forward: bool, y_forward: bool) -> Result<bool> {
        let mx = self.m(x, x_forward)?;
        let my = self.m(y, y_forward)?;
        let x_step = if x_forward { 1 } else { -1 };
        let y_step = if y_forward { 1 } else { -1 };
        let mxy = mx.checked_mul(&my.shift(x, x_step))?;
        let myx = my.checked_mul(&mx.shift(y, y_step))?;
        Ok(mxy == myx)
    }

    /// Substitutes parameters; the result is not re-validated
    pub fn subs(&self, values: &BTreeMap<String, Poly>) -> Result<Self> {
        let matrices = self
            .matrices
            .iter()
            .map(|(axis, m)| Ok((axis.clone(), m.subs(values)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Self::new_unchecked(matrices)
    }

    /// Coboundary equivalent field: every axis matrix becomes
    /// `U · M_x · U(x + 1)^-1`. Conservation carries over, and walks change
    /// only by `U` at the two ends.
    pub fn coboundary(&self, u: &Matrix) -> Result<Self> {
        let matrices = self
            .matrices
            .iter()
            .map(|(axis, m)| Ok((axis.clone(), m.coboundary(u, axis)?)))
            .collect::<Result<BTreeMap<_, _>>>()?;
        Self::new_unchecked(matrices)
    }

    pub fn simplify(&self) -> Self {
        Self {
            matrices: self
                .matrices
                .iter()
                .map(|(axis, m)| (axis.clone(), m.simplify()))
                .collect(),
        }
    }

    fn check_keys<T>(&self, position: &Position<T>) -> Result<()> {
        if position.key_vec() != self.axes() {
            return Err(RecurrenceError::KeyMismatch {
                expected: self.axes(),
                found: position.key_vec(),
            });
        }
        Ok(())
    }

    /// `axis -> start[axis] + (n - 1)·trajectory[axis]`
    pub fn variable_reduction_substitution(
        trajectory: &Position,
        start: &Position,
    ) -> Result<BTreeMap<String, Poly>> {
        if !trajectory.same_keys(start) {
            return Err(RecurrenceError::KeyMismatch {
                expected: trajectory.key_vec(),
                found: start.key_vec(),
            });
        }
        let k = Poly::var(N_SYMBOL) - Poly::one();
        Ok(trajectory
            .iter()
            .map(|(axis, step)| {
                let s = start.get(axis).copied().unwrap_or_default();
                (axis.clone(), Poly::from(s) + &k * &Poly::from(*step))
            })
            .collect())
    }

    /// One step along `trajectory`: the axis walks in axis order, each
    /// starting where the previous one ended.
    ///
    /// Without `start` the matrix is in the axis variables. With `start`
    /// it is reduced to the single variable `n` (step `n` starts at
    /// `start + (n-1)·trajectory`) and normalized.
    pub fn trajectory_matrix(&self, trajectory: &Position, start: Option<&Position>) -> Result<Matrix> {
        self.check_keys(trajectory)?;
        if let Some(start) = start {
            self.check_keys(start)?;
        }
        let axes = self.axes();
        let mut position = Position::symbolic(&axes);
        let mut m = Matrix::eye(self.n());
        for axis in &axes {
            let depth = trajectory.get(axis).copied().unwrap_or_default();
            let forward = depth >= 0;
            let step = Position::axis_vector(&axes, axis, forward);
            let walked = self.m(axis, forward)?.walk(&step, depth.unsigned_abs() as usize, &position)?;
            m = m.checked_mul(&walked)?;
            position += &(&step * depth.abs()).to_poly();
        }
        let m = m.simplify();
        match start {
            None => Ok(m),
            Some(start) => {
                let values = Self::variable_reduction_substitution(trajectory, start)?;
                Ok(m.subs(&values)?.simplify().normalize())
            }
        }
    }

    /// `iterations` total steps become `iterations / |trajectory|_1`
    /// trajectory steps, rounded down. Also returns the sorted distinct
    /// step counts.
    fn trajectory_steps(trajectory: &Position, iterations: &[usize]) -> Result<(Vec<usize>, Vec<usize>)> {
        let mut seen = BTreeSet::new();
        if !iterations.iter().all(|i| seen.insert(*i)) {
            return Err(RecurrenceError::DuplicateIterations);
        }
        let size = trajectory.l1() as usize;
        if size == 0 {
            return Err(RecurrenceError::ZeroTrajectory(trajectory.to_string()));
        }
        let steps: Vec<usize> = iterations.iter().map(|i| i / size).collect();
        let mut distinct = steps.clone();
        distinct.sort_unstable();
        distinct.dedup();
        Ok((steps, distinct))
    }

    /// Results for the distinct step counts, back in request order
    fn in_request_order<T: Clone>(steps: &[usize], distinct: &[usize], results: &[T]) -> Vec<T> {
        steps
            .iter()
            .filter_map(|s| distinct.binary_search(s).ok().map(|i| results[i].clone()))
            .collect()
    }

    fn reduced(&self, trajectory: &Position, start: Option<&Position>) -> Result<Matrix> {
        let origin = self.default_origin();
        self.trajectory_matrix(trajectory, Some(start.unwrap_or(&origin)))
    }

    pub fn walk(&self, trajectory: &Position, iterations: usize, start: Option<&Position>) -> Result<Matrix> {
        let mut walks = self.walk_many(trajectory, &[iterations], start)?;
        walks.pop().ok_or(RecurrenceError::InvalidDepth)
    }

    /// Walks of `iterations` total steps each, from `start` (default origin
    /// when `None`)
    pub fn walk_many(
        &self,
        trajectory: &Position,
        iterations: &[usize],
        start: Option<&Position>,
    ) -> Result<Vec<Matrix>> {
        let (steps, distinct) = Self::trajectory_steps(trajectory, iterations)?;
        let m = self.reduced(trajectory, start)?;
        let walked = m.walk_many(&unit_step(), &distinct, &unit_step())?;
        Ok(Self::in_request_order(&steps, &distinct, &walked))
    }

    pub fn limit(&self, trajectory: &Position, iterations: usize, start: Option<&Position>) -> Result<Limit> {
        let mut limits = self.limit_many(trajectory, &[iterations], start)?;
        limits.pop().ok_or(RecurrenceError::InvalidDepth)
    }

    /// Limits after `iterations` total steps each; the previous convergent
    /// is one trajectory step earlier
    pub fn limit_many(
        &self,
        trajectory: &Position,
        iterations: &[usize],
        start: Option<&Position>,
    ) -> Result<Vec<Limit>> {
        let (steps, distinct) = Self::trajectory_steps(trajectory, iterations)?;
        if let Some((&short, _)) = iterations.iter().zip(&steps).find(|(_, &s)| s == 0) {
            return Err(RecurrenceError::ShortWalk {
                iterations: short,
                size: trajectory.l1() as usize,
            });
        }
        let limits = self
            .reduced(trajectory, start)?
            .limit_many(&unit_step(), &distinct, &unit_step())?;
        Ok(Self::in_request_order(&steps, &distinct, &limits))
    }

    /// Convergence exponent after `depth` trajectory steps; blind when
    /// `limit` is `None`
    pub fn delta(
        &self,
        trajectory: &Position,
        depth: usize,
        start: Option<&Position>,
        limit: Option<&BigRational>,
        config: &AnalysisConfig,
    ) -> Result<f64> {
        let m = self.reduced(trajectory, start)?;
        let reference = match limit {
            Some(l) => l.clone(),
            None => m
                .limit(&unit_step(), depth * config.blind_delta_factor, &unit_step())?
                .as_rational_number()?,
        };
        m.limit(&unit_step(), depth, &unit_step())?.delta(&reference)
    }

    /// `delta` for trajectory depths `1..=depth` from one walk
    pub fn delta_sequence(
        &self,
        trajectory: &Position,
        depth: usize,
        start: Option<&Position>,
        limit: Option<&BigRational>,
        config: &AnalysisConfig,
    ) -> Result<Vec<f64>> {
        let m = self.reduced(trajectory, start)?;
        let mut depths: Vec<usize> = (1..=depth).collect();
        let blind = limit.is_none();
        if blind {
            depths.push(depth * config.blind_delta_factor);
        }
        let mut limits = m.limit_many(&unit_step(), &depths, &unit_step())?;
        let reference = match limit {
            Some(l) => l.clone(),
            None => limits
                .pop()
                .ok_or(RecurrenceError::InvalidDepth)?
                .as_rational_number()?,
        };
        limits.iter().map(|l| l.delta(&reference)).collect()
    }

    /// Continued fraction equivalent to the trajectory, anchored at the
    /// default origin
    pub fn as_pcf(&self, trajectory: &Position) -> Result<PcfFromMatrix> {
        self.trajectory_matrix(trajectory, Some(&self.default_origin()))?
            .as_pcf(true)
    }

    /// Reduces `trajectory` to a continued fraction, moves `start` past
    /// its singular points, and evaluates it to `config.depth`
    pub fn analyze_trajectory(
        &self,
        trajectory: &Position,
        start: &Position,
        config: &AnalysisConfig,
    ) -> Result<TrajectoryReport> {
        let m = self.trajectory_matrix(trajectory, Some(start))?;
        let mut pcf = m.as_polynomial().normalize().as_pcf(true)?.pcf;

        let offset = pcf
            .singular_points()?
            .iter()
            .filter_map(|p| p.get(N_SYMBOL).cloned())
            .max()
            .unwrap_or_else(|| BigInt::from(0));
        let offset = i64::try_from(offset).map_err(|_| RecurrenceError::InvalidDepth)?;
        let mut start = start.clone();
        if offset > 0 {
            start += &(trajectory * offset);
            pcf = pcf.shift(offset);
            tracing::debug!(target: "cfr::scan", %trajectory, offset, "skipping singular points");
        }

        let limit = pcf.limit(config.depth)?;
        let report = TrajectoryReport {
            trajectory: trajectory.clone(),
            start,
            limit: limit.as_rounded_number()?,
            precision: limit.precision()?,
            delta: pcf.delta_with_config(config.depth, None, config)?,
            pcf,
        };
        tracing::debug!(target: "cfr::scan", %trajectory, pcf = %report.pcf, precision = report.precision, "trajectory analyzed");
        Ok(report)
    }

    /// `analyze_trajectory` for each trajectory, in input order. Failures
    /// are logged and left out.
    pub fn trajectory_scan(
        &self,
        trajectories: &[Position],
        start: &Position,
        config: &AnalysisConfig,
    ) -> Vec<TrajectoryReport> {
        let analyze = |trajectory: &Position| match self.analyze_trajectory(trajectory, start, config) {
            Ok(report) => Some(report),
            Err(e) => {
                tracing::warn!(target: "cfr::scan", %trajectory, error = %e, "trajectory skipped");
                None
            }
        };
        if config.parallel {
            trajectories.par_iter().filter_map(analyze).collect()
        } else {
            trajectories.iter().filter_map(analyze).collect()
        }
    }
}

fn unit_step() -> Position {
    Position::new().with(N_SYMBOL, 1)
}

fn signed_axis(axis: &str, forward: bool) -> String {
    if forward {
        axis.to_string()
    } else {
        format!("-{axis}")
    }
}

impl fmt::Display for Cmf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CMF(")?;
        for (i, (axis, m)) in self.matrices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{axis}: {m}")?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position;

    fn m(grid: &[&[&str]]) -> Matrix {
        Matrix::parse_rows(grid).expect("valid matrix")
    }

    fn field(entries: &[(&str, Matrix)]) -> BTreeMap<String, Matrix> {
        entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn e_cmf() -> Cmf {
        Cmf::new(field(&[
            ("x", m(&[&["1", "-y - 1"], &["-1", "x + y + 2"]])),
            ("y", m(&[&["0", "-y - 1"], &["-1", "x + y + 1"]])),
        ]))
        .expect("conserving")
    }

    /// f = x + y, fbar = 1 + c(x - y)
    fn ffbar_cmf(c: &str) -> Cmf {
        let b = format!("x*({c}*x + 1)");
        let a = format!("x + y - 1 - ({c})*(x + 1 - y)");
        let fbar = format!("1 + ({c})*(x - y)");
        Cmf::new(field(&[
            ("x", m(&[&["0", b.as_str()], &["1", a.as_str()]])),
            ("y", m(&[&[fbar.as_str(), b.as_str()], &["1", "x + y"]])),
        ]))
        .expect("conserving")
    }

    #[test]
    fn test_rejects_non_conserving() {
        let matrix = m(&[&["x", "x + 17"], &["y*x", "3y - x + 5"]]);
        let matrices = field(&[("x", matrix.clone()), ("y", matrix)]);
        let unchecked = Cmf::new_unchecked(matrices.clone()).expect("valid axes");
        assert!(matches!(
            unchecked.assert_conserving(false),
            Err(RecurrenceError::Conservation { .. })
        ));
        assert!(Cmf::new(matrices).is_err());
    }

    #[test]
    fn test_reserved_symbol_and_dimension() {
        assert_eq!(
            Cmf::new(field(&[("n", Matrix::eye(2))])),
            Err(RecurrenceError::ReservedSymbol("n".to_string()))
        );
        assert!(matches!(
            Cmf::new(field(&[("x", Matrix::eye(2)), ("y", Matrix::eye(3))])),
            Err(RecurrenceError::Shape { .. })
        ));
    }

    #[test]
    fn test_symbols() {
        let cmf = ffbar_cmf("c");
        assert_eq!(cmf.axes(), vec!["x".to_string(), "y".to_string()]);
        assert_eq!(cmf.parameters(), BTreeSet::from(["c".to_string()]));
        assert_eq!(cmf.free_symbols().len(), 3);
        assert_eq!(cmf.dim(), 2);
        assert_eq!(cmf.n(), 2);
    }

    #[test]
    fn test_backward_negates_forward() {
        let cmf = e_cmf();
        for axis in ["x", "y"] {
            let forward = cmf.m(axis, true).expect("axis");
            let backward = cmf.m(axis, false).expect("invertible");
            assert_eq!(&forward * &backward.shift(axis, 1), Matrix::eye(2));
            assert_eq!(&backward * &forward.shift(axis, -1), Matrix::eye(2));
        }
        assert!(cmf.m("z", true).is_err());
    }

    #[test]
    fn test_check_negatives() {
        let matrices = e_cmf().matrices.clone();
        let config = AnalysisConfig {
            check_negatives: true,
            ..AnalysisConfig::default()
        };
        assert!(Cmf::with_config(matrices, &config).is_ok());
    }

    #[test]
    fn test_trajectory_matrix_axis() {
        let cmf = e_cmf();
        let symbolic = Position::symbolic(&cmf.axes());
        let expected = cmf
            .m("x", true)
            .expect("axis")
            .walk(&position! {"x" => 1, "y" => 0}, 3, &symbolic)
            .expect("walks");
        let actual = cmf
            .trajectory_matrix(&position! {"x" => 3, "y" => 0}, None)
            .expect("valid keys");
        assert_eq!(actual, expected.simplify());
    }

    #[test]
    fn test_trajectory_matrix_diagonal() {
        let cmf = e_cmf();
        let mx = cmf.m("x", true).expect("axis");
        let my = cmf.m("y", true).expect("axis");
        let actual = cmf
            .trajectory_matrix(&position! {"x" => 1, "y" => 1}, None)
            .expect("valid keys");
        assert_eq!(actual, (&mx * &my.shift("x", 1)).simplify());
    }

    #[test]
    fn test_trajectory_matrix_negative_axis() {
        let cmf = e_cmf();
        let symbolic = Position::symbolic(&cmf.axes());
        let expected = cmf
            .m("x", false)
            .expect("invertible")
            .walk(&position! {"x" => -1, "y" => 0}, 3, &symbolic)
            .expect("walks");
        let actual = cmf
            .trajectory_matrix(&position! {"x" => -3, "y" => 0}, None)
            .expect("valid keys");
        assert_eq!(actual, expected.simplify());
    }

    #[test]
    fn test_trajectory_matrix_substitute() {
        let cmf = e_cmf();
        let trajectory = position! {"x" => 1, "y" => 1};
        let values: BTreeMap<String, Poly> = [
            ("x".to_string(), "n + 2".parse::<Poly>().expect("valid")),
            ("y".to_string(), "n + 4".parse::<Poly>().expect("valid")),
        ]
        .into_iter()
        .collect();
        let expected = cmf
            .trajectory_matrix(&trajectory, None)
            .expect("valid keys")
            .subs(&values)
            .expect("no poles")
            .simplify()
            .normalize();
        let actual = cmf
            .trajectory_matrix(&trajectory, Some(&position! {"x" => 3, "y" => 5}))
            .expect("valid keys");
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_key_mismatch() {
        let cmf = e_cmf();
        assert!(matches!(
            cmf.trajectory_matrix(&position! {"x" => 1}, None),
            Err(RecurrenceError::KeyMismatch { .. })
        ));
        assert!(matches!(
            cmf.trajectory_matrix(&position! {"x" => 1, "y" => 1}, Some(&position! {"x" => 1, "z" => 1})),
            Err(RecurrenceError::KeyMismatch { .. })
        ));
    }

    #[test]
    fn test_coboundary_keeps_conservation() {
        let cmf = e_cmf();
        let u = m(&[&["1", "x"], &["y", "x*y + 1"]]);
        let equivalent = cmf.coboundary(&u).expect("invertible");
        equivalent.assert_conserving(false).expect("conserving");
        assert_eq!(
            equivalent.m("y", true).expect("axis"),
            cmf.m("y", true).expect("axis").coboundary(&u, "y").expect("invertible")
        );

        let trajectory = position! {"x" => 1, "y" => 1};
        let start = cmf.default_origin();
        let end = position! {"x" => 4, "y" => 4};
        let walked = cmf.walk(&trajectory, 6, Some(&start)).expect("walks");
        let at = |p: &Position| u.subs(&p.to_subs()).expect("numeric");
        let expected = at(&start)
            .checked_mul(&walked)
            .and_then(|w| w.checked_mul(&at(&end).inverse()?))
            .expect("invertible");
        let actual = equivalent.walk(&trajectory, 6, Some(&start)).expect("walks");
        assert_eq!(actual.normalize(), expected.normalize());
    }

    #[test]
    fn test_walk_axis() {
        let cmf = e_cmf();
        let trajectory = position! {"x" => 1, "y" => 0};
        let expected = cmf
            .m("x", true)
            .expect("axis")
            .walk(&trajectory, 17, &cmf.default_origin())
            .expect("walks");
        assert_eq!(cmf.walk(&trajectory, 17, None).expect("walks"), expected);
    }

    #[test]
    fn test_walk_divides_by_trajectory_size() {
        let cmf = e_cmf();
        let trajectory = position! {"x" => 1, "y" => 1};
        let reduced = cmf
            .trajectory_matrix(&trajectory, Some(&cmf.default_origin()))
            .expect("valid keys");
        let expected = reduced.walk(&unit_step(), 9, &unit_step()).expect("walks");
        assert_eq!(cmf.walk(&trajectory, 18, None).expect("walks"), expected);
        assert_eq!(cmf.walk(&trajectory, 19, None).expect("walks"), expected);
    }

    #[test]
    fn test_walk_list() {
        let cmf = e_cmf();
        let trajectory = position! {"x" => 2, "y" => 3};
        let iterations = [5, 10, 15, 85, 145];
        let many = cmf.walk_many(&trajectory, &iterations, None).expect("walks");
        for (i, walked) in iterations.iter().zip(&many) {
            assert_eq!(&cmf.walk(&trajectory, *i, None).expect("walks"), walked);
        }
        assert!(matches!(
            cmf.walk(&position! {"x" => 0, "y" => 0}, 3, None),
            Err(RecurrenceError::ZeroTrajectory(_))
        ));
    }

    #[test]
    fn test_limit_diagonal() {
        let cmf = e_cmf();
        let trajectory = position! {"x" => 1, "y" => 1};
        let reduced = cmf
            .trajectory_matrix(&trajectory, Some(&cmf.default_origin()))
            .expect("valid keys");
        let expected = reduced.limit(&unit_step(), 17, &unit_step()).expect("converges");
        assert_eq!(cmf.limit(&trajectory, 34, None).expect("converges"), expected);
    }

    #[test]
    fn test_limit_list_shares_trajectory_steps() {
        let cmf = e_cmf();
        let trajectory = position! {"x" => 1, "y" => 1};
        let limits = cmf.limit_many(&trajectory, &[18, 19], None).expect("converges");
        assert_eq!(limits.len(), 2);
        assert_eq!(limits[0], limits[1]);
        assert_eq!(limits[0], cmf.limit(&trajectory, 18, None).expect("converges"));
        assert!(matches!(
            cmf.limit_many(&trajectory, &[18, 18], None),
            Err(RecurrenceError::DuplicateIterations)
        ));
    }

    #[test]
    fn test_limit_below_one_step() {
        let cmf = e_cmf();
        let trajectory = position! {"x" => 1, "y" => 1};
        assert_eq!(
            cmf.limit(&trajectory, 1, None),
            Err(RecurrenceError::ShortWalk { iterations: 1, size: 2 })
        );
    }

    #[test]
    fn test_as_pcf() {
        let cmf = ffbar_cmf("3");
        let from = cmf.as_pcf(&position! {"x" => 1, "y" => 1}).expect("reducible");
        let expected = Pcf::new(
            "5 + 10n".parse::<Poly>().expect("valid"),
            "1 - 9n^2".parse::<Poly>().expect("valid"),
        );
        assert_eq!(from.pcf, expected);
    }

    #[test]
    fn test_as_pcf_parametric() {
        let cmf = ffbar_cmf("c");
        let from = cmf.as_pcf(&position! {"x" => 1, "y" => 1}).expect("reducible");
        let expected = Pcf::new(
            "(1 + 2n)*(c + 2)".parse::<Poly>().expect("valid"),
            "1 - c^2*n^2".parse::<Poly>().expect("valid"),
        );
        assert_eq!(from.pcf, expected);
    }

    #[test]
    fn test_subs_and_simplify_keep_axes() {
        let cmf = ffbar_cmf("c");
        let values: BTreeMap<String, Poly> = [("c".to_string(), Poly::from(3))].into_iter().collect();
        let substituted = cmf.subs(&values).expect("no poles");
        assert!(substituted.parameters().is_empty());
        assert_eq!(substituted.simplify().axes(), cmf.axes());
        assert!(substituted.assert_conserving(false).is_ok());
    }

    #[test]
    fn test_delta_sequence_agrees_with_delta() {
        let cmf = e_cmf();
        let trajectory = position! {"x" => 1, "y" => 1};
        let config = AnalysisConfig::default();
        let sequence = cmf
            .delta_sequence(&trajectory, 20, None, None, &config)
            .expect("numeric");
        let reference = cmf
            .trajectory_matrix(&trajectory, Some(&cmf.default_origin()))
            .expect("valid keys")
            .limit(&unit_step(), 40, &unit_step())
            .expect("converges")
            .as_rational_number()
            .expect("numeric");
        for (depth, value) in (1..=20).zip(&sequence) {
            let single = cmf
                .delta(&trajectory, depth, None, Some(&reference), &config)
                .expect("numeric");
            assert_eq!(single, *value);
        }
    }

    #[test]
    fn test_analyze_trajectory() {
        let cmf = ffbar_cmf("3");
        let config = AnalysisConfig {
            depth: 200,
            ..AnalysisConfig::default()
        };
        let trajectory = position! {"x" => 1, "y" => 1};
        let report = cmf
            .analyze_trajectory(&trajectory, &cmf.default_origin(), &config)
            .expect("analyzable");
        assert_eq!(report.start, cmf.default_origin());
        assert!(report.precision > 3);
        let value: f64 = report.limit.parse().expect("decimal");
        let cbrt4 = 4f64.powf(1.0 / 3.0);
        let expected = (cbrt4 + 1.0) / (cbrt4 - 1.0);
        assert!((value - expected).abs() < 1e-3);
    }

    #[test]
    fn test_trajectory_scan_keeps_order_and_drops_failures() {
        let cmf = ffbar_cmf("3");
        let config = AnalysisConfig {
            depth: 30,
            ..AnalysisConfig::default()
        };
        let trajectories = vec![
            position! {"x" => 1, "y" => 1},
            position! {"x" => 1},
            position! {"x" => 1, "y" => 1},
        ];
        let origin = cmf.default_origin();
        let reports = cmf.trajectory_scan(&trajectories, &origin, &config);
        let sequential = cmf.trajectory_scan(
            &trajectories,
            &origin,
            &AnalysisConfig {
                parallel: false,
                ..config.clone()
            },
        );
        let single = cmf
            .analyze_trajectory(&trajectories[0], &origin, &config)
            .expect("analyzable");
        assert_eq!(reports, vec![single.clone(), single]);
        assert_eq!(reports, sequential);
    }
}
