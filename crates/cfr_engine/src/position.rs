//! Positions and trajectories: axis name → value, with vector arithmetic.
//!
//! A `Position<i64>` doubles as a trajectory (integer step per axis).
//! Symbolic positions (`Position<Poly>`) show up when a walk starts at a
//! symbolic point, e.g. `{x: x, y: y}` or `{x: 1 + 2(n-1)}`.

use cfr_poly::Poly;
use num_bigint::BigInt;
use num_traits::Zero;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Position<T = i64> {
    values: BTreeMap<String, T>,
}

impl<T> Default for Position<T> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }
}

impl<T> Position<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `axis` set to `value`
    pub fn with(mut self, axis: &str, value: T) -> Self {
        self.values.insert(axis.to_string(), value);
        self
    }

    pub fn get(&self, axis: &str) -> Option<&T> {
        self.values.get(axis)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &T)> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.values.values()
    }

    pub fn key_vec(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, axis: &str) -> bool {
        self.values.contains_key(axis)
    }

    pub fn same_keys<U>(&self, other: &Position<U>) -> bool {
        self.values.len() == other.values.len() && self.values.keys().eq(other.values.keys())
    }

    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> Position<U> {
        Position {
            values: self.values.iter().map(|(k, v)| (k.clone(), f(v))).collect(),
        }
    }

    pub fn as_map(&self) -> &BTreeMap<String, T> {
        &self.values
    }
}

impl<T: Clone + Into<Poly>> Position<T> {
    /// Substitution map `axis → value` for matrix entries
    pub fn to_subs(&self) -> BTreeMap<String, Poly> {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone().into()))
            .collect()
    }

    pub fn to_poly(&self) -> Position<Poly> {
        self.map(|v| v.clone().into())
    }
}

impl Position<i64> {
    /// Sum of absolute steps
    pub fn l1(&self) -> u64 {
        self.values.values().map(|v| v.unsigned_abs()).sum()
    }

    /// Largest absolute value (L∞ norm), 0 if empty
    pub fn longest(&self) -> u64 {
        self.values.values().map(|v| v.unsigned_abs()).max().unwrap_or(0)
    }

    /// Smallest nonzero absolute value, 0 if empty
    pub fn shortest(&self) -> u64 {
        self.values
            .values()
            .filter(|v| **v != 0)
            .map(|v| v.unsigned_abs())
            .min()
            .unwrap_or(0)
    }

    pub fn signs(&self) -> Self {
        self.map(|v| v.signum())
    }

    /// Unit step along `axis` (negative if `!forward`), zero elsewhere
    pub fn axis_vector(axes: &[String], axis: &str, forward: bool) -> Self {
        let step = if forward { 1 } else { -1 };
        Self {
            values: axes
                .iter()
                .map(|a| (a.clone(), if a == axis { step } else { 0 }))
                .collect(),
        }
    }

    /// The same value on every axis
    pub fn uniform(axes: &[String], value: i64) -> Self {
        Self {
            values: axes.iter().map(|a| (a.clone(), value)).collect(),
        }
    }
}

impl Position<Poly> {
    /// `{axis: axis}` for each axis
    pub fn symbolic(axes: &[String]) -> Self {
        Self {
            values: axes.iter().map(|a| (a.clone(), Poly::var(a))).collect(),
        }
    }

    /// True iff every value is an integer constant
    pub fn is_integer(&self) -> bool {
        self.values
            .values()
            .all(|v| v.constant_value().is_some_and(|c| c.is_integer()))
    }

    pub fn to_integer(&self) -> Option<Position<BigInt>> {
        let mut values = BTreeMap::new();
        for (k, v) in &self.values {
            let c = v.constant_value().filter(|c| c.is_integer())?;
            values.insert(k.clone(), c.to_integer());
        }
        Some(Position { values })
    }

    /// Lcm of the coefficient denominators over all values
    pub fn denominator_lcm(&self) -> BigInt {
        use num_integer::Integer;
        self.values
            .values()
            .fold(BigInt::from(1), |acc, v| acc.lcm(&v.denominator_lcm()))
    }
}

impl<T> FromIterator<(String, T)> for Position<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl<'a, T> FromIterator<(&'a str, T)> for Position<T> {
    fn from_iter<I: IntoIterator<Item = (&'a str, T)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        }
    }
}

impl<T> From<BTreeMap<String, T>> for Position<T> {
    fn from(values: BTreeMap<String, T>) -> Self {
        Self { values }
    }
}

impl<'a, T> IntoIterator for &'a Position<T> {
    type Item = (&'a String, &'a T);
    type IntoIter = std::collections::btree_map::Iter<'a, String, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

// =============================================================================
// Arithmetic (missing keys count as zero)
// =============================================================================

impl<T: Clone + Zero + Add<Output = T>> AddAssign<&Position<T>> for Position<T> {
    fn add_assign(&mut self, other: &Position<T>) {
        for (k, v) in &other.values {
            let entry = self.values.entry(k.clone()).or_insert_with(T::zero);
            *entry = entry.clone() + v.clone();
        }
    }
}

impl<T: Clone + Zero + Add<Output = T> + Neg<Output = T>> SubAssign<&Position<T>> for Position<T> {
    fn sub_assign(&mut self, other: &Position<T>) {
        *self += &-other;
    }
}

impl<T: Clone + Zero + Add<Output = T>> Add for &Position<T> {
    type Output = Position<T>;

    fn add(self, other: &Position<T>) -> Position<T> {
        let mut result = self.clone();
        result += other;
        result
    }
}

impl<T: Clone + Zero + Add<Output = T>> Add for Position<T> {
    type Output = Position<T>;

    fn add(mut self, other: Position<T>) -> Position<T> {
        self += &other;
        self
    }
}

impl<T: Clone + Zero + Add<Output = T> + Neg<Output = T>> Sub for &Position<T> {
    type Output = Position<T>;

    fn sub(self, other: &Position<T>) -> Position<T> {
        let mut result = self.clone();
        result -= other;
        result
    }
}

impl<T: Clone + Zero + Add<Output = T> + Neg<Output = T>> Sub for Position<T> {
    type Output = Position<T>;

    fn sub(mut self, other: Position<T>) -> Position<T> {
        self -= &other;
        self
    }
}

impl<T: Clone + Neg<Output = T>> Neg for &Position<T> {
    type Output = Position<T>;

    fn neg(self) -> Position<T> {
        self.map(|v| -v.clone())
    }
}

impl<T: Clone + Neg<Output = T>> Neg for Position<T> {
    type Output = Position<T>;

    fn neg(self) -> Position<T> {
        -&self
    }
}

impl<T: Clone + Mul<i64, Output = T>> Mul<i64> for &Position<T> {
    type Output = Position<T>;

    fn mul(self, k: i64) -> Position<T> {
        self.map(|v| v.clone() * k)
    }
}

impl<T: Clone + Mul<i64, Output = T>> Mul<i64> for Position<T> {
    type Output = Position<T>;

    fn mul(self, k: i64) -> Position<T> {
        &self * k
    }
}

impl Mul<&Position<i64>> for i64 {
    type Output = Position<i64>;

    fn mul(self, p: &Position<i64>) -> Position<i64> {
        p * self
    }
}

impl Mul<Position<i64>> for i64 {
    type Output = Position<i64>;

    fn mul(self, p: Position<i64>) -> Position<i64> {
        &p * self
    }
}

impl<T: fmt::Display> fmt::Display for Position<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        write!(f, "}}")
    }
}

/// Build an integer position from `axis => value` pairs
#[macro_export]
macro_rules! position {
    () => {
        $crate::Position::<i64>::new()
    };
    ($($axis:expr => $value:expr),+ $(,)?) => {
        [$(($axis, $value)),+].into_iter().collect::<$crate::Position<i64>>()
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let p1 = position! {"x" => 17, "y" => 3};
        let p2 = position! {"y" => 4, "z" => 3};
        assert_eq!(&p1 + &p2, position! {"x" => 17, "y" => 7, "z" => 3});
    }

    #[test]
    fn test_add_assign_and_sub() {
        let mut p = position! {"x" => 17, "y" => 3};
        p += &position! {"y" => 4, "z" => 3};
        assert_eq!(p, position! {"x" => 17, "y" => 7, "z" => 3});
        let q = position! {"x" => 17, "y" => 3} - position! {"y" => 4, "z" => 3};
        assert_eq!(q, position! {"x" => 17, "y" => -1, "z" => -3});
    }

    #[test]
    fn test_scale_and_neg() {
        let p = position! {"x" => 1, "y" => -2, "z" => 3};
        let expected = position! {"x" => -7, "y" => 14, "z" => -21};
        assert_eq!(-7 * &p, expected);
        assert_eq!(&p * -7, expected);
        assert_eq!(-&p, position! {"x" => -1, "y" => 2, "z" => -3});
    }

    #[test]
    fn test_norms() {
        let p = position! {"x" => 1, "y" => 2, "z" => -3};
        assert_eq!(p.longest(), 3);
        assert_eq!(p.shortest(), 1);
        assert_eq!(p.l1(), 6);
        assert_eq!(p.signs(), position! {"x" => 1, "y" => 1, "z" => -1});
        let empty = position! {};
        assert_eq!(empty.longest(), 0);
        assert_eq!(empty.shortest(), 0);
        assert_eq!(empty.signs(), empty);
    }

    #[test]
    fn test_symbolic_positions() {
        let axes = vec!["x".to_string(), "y".to_string()];
        let sym = Position::symbolic(&axes);
        assert!(!sym.is_integer());
        let shifted = &sym + &Position::axis_vector(&axes, "x", true).to_poly();
        assert_eq!(shifted.get("x"), Some(&(Poly::var("x") + 1)));
        let concrete = position! {"x" => 2, "y" => -5}.to_poly();
        assert!(concrete.is_integer());
        assert_eq!(
            concrete.to_integer().and_then(|p| p.get("y").cloned()),
            Some(BigInt::from(-5))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(position! {"x" => 1, "y" => -2}.to_string(), "{x: 1, y: -2}");
    }
}
