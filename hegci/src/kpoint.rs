//! Plane-wave orbitals labelled by integer momentum vectors.

use itertools::Itertools;
use rustc_hash::FxHashMap;
use std::ops::{Add, Neg, Sub};

/// A 3D integer momentum vector labelling a plane-wave orbital.
///
/// Components fit in an `i8` for every cutoff this solver supports; equality
/// and hashing are componentwise.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct KPoint {
    /// x-component in units of `2π / L`.
    pub x: i8,
    /// y-component in units of `2π / L`.
    pub y: i8,
    /// z-component in units of `2π / L`.
    pub z: i8,
}

impl KPoint {
    /// Creates a k-point from its components.
    #[must_use]
    pub const fn new(x: i8, y: i8, z: i8) -> Self {
        Self { x, y, z }
    }

    /// Returns the squared Euclidean norm.
    #[must_use]
    pub fn norm_sq(self) -> i32 {
        let (x, y, z) = (i32::from(self.x), i32::from(self.y), i32::from(self.z));
        x * x + y * y + z * z
    }

    /// Returns `true` for the zero vector.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.x == 0 && self.y == 0 && self.z == 0
    }

    fn sort_key(self) -> (i32, i8, i8, i8) {
        (self.norm_sq(), self.x, self.y, self.z)
    }
}

impl Add for KPoint {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for KPoint {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for KPoint {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

/// All k-points within a momentum cutoff, in a deterministic order, together
/// with an index lookup table and the set of pairwise differences.
#[derive(Clone, Debug)]
pub struct KPointGrid {
    points: Vec<KPoint>,
    index: FxHashMap<KPoint, usize>,
    differences: Vec<KPoint>,
}

impl KPointGrid {
    /// Enumerates all integer triples with `‖k‖² ≤ rcut²`, sorted ascending by
    /// `(‖k‖², kx, ky, kz)`. Growing `rcut` extends the sequence without
    /// permuting existing entries, which keeps orbital indices stable across
    /// cutoff ladders.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(rcut: f64) -> Self {
        let max = rcut.floor().max(0.0) as i8;
        let rcut_sq = rcut * rcut;

        let mut points = Vec::new();
        for x in -max..=max {
            for y in -max..=max {
                for z in -max..=max {
                    let point = KPoint::new(x, y, z);
                    if f64::from(point.norm_sq()) <= rcut_sq {
                        points.push(point);
                    }
                }
            }
        }
        points.sort_by_key(|point| point.sort_key());

        let index = points
            .iter()
            .enumerate()
            .map(|(position, &point)| (point, position))
            .collect();

        // The zero vector labels no momentum transfer and is left out.
        let mut differences: Vec<KPoint> = points
            .iter()
            .cartesian_product(points.iter())
            .map(|(&p, &q)| p - q)
            .filter(|diff| !diff.is_zero())
            .unique()
            .collect();
        differences.sort_by_key(|diff| diff.sort_key());

        Self {
            points,
            index,
            differences,
        }
    }

    /// The ordered k-points.
    #[must_use]
    pub fn points(&self) -> &[KPoint] {
        &self.points
    }

    /// Number of k-points, i.e. the number of spatial orbitals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns `true` if the cutoff admits no k-point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Position of `point` in [`Self::points`], if it lies within the cutoff.
    #[must_use]
    pub fn index_of(&self, point: KPoint) -> Option<usize> {
        self.index.get(&point).copied()
    }

    /// The unique non-zero pairwise differences `p − q`, in a deterministic
    /// order. The set is closed under negation.
    #[must_use]
    pub fn differences(&self) -> &[KPoint] {
        &self.differences
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustc_hash::FxHashSet;

    #[test]
    fn grid_within_unit_cutoff() {
        let grid = KPointGrid::new(1.0);

        assert_eq!(grid.len(), 7);
        assert_eq!(grid.points()[0], KPoint::new(0, 0, 0));
        assert!(grid.points().iter().all(|point| point.norm_sq() <= 1));
    }

    #[test]
    fn grid_sizes() {
        assert_eq!(KPointGrid::new(1.5).len(), 19);
        assert_eq!(KPointGrid::new(2.0).len(), 33);
    }

    #[test]
    fn index_matches_position() {
        let grid = KPointGrid::new(2.0);

        for (position, &point) in grid.points().iter().enumerate() {
            assert_eq!(grid.index_of(point), Some(position));
        }
        assert_eq!(grid.index_of(KPoint::new(3, 0, 0)), None);
    }

    #[test]
    fn ordering_is_ascending_in_norm() {
        let grid = KPointGrid::new(2.0);

        for pair in grid.points().windows(2) {
            assert!(pair[0].norm_sq() <= pair[1].norm_sq());
        }
    }

    #[test]
    fn larger_cutoff_extends_smaller_grid() {
        let small = KPointGrid::new(1.0);
        let large = KPointGrid::new(2.0);

        assert_eq!(&large.points()[..small.len()], small.points());
    }

    #[test]
    fn differences_closed_under_negation() {
        let grid = KPointGrid::new(1.5);
        let diffs: FxHashSet<KPoint> = grid.differences().iter().copied().collect();

        assert_eq!(diffs.len(), grid.differences().len());
        assert!(!diffs.contains(&KPoint::new(0, 0, 0)));
        assert!(grid.differences().iter().all(|&diff| diffs.contains(&-diff)));
    }

    #[test]
    fn arithmetic() {
        let p = KPoint::new(1, -2, 0);
        let q = KPoint::new(0, 1, 1);

        assert_eq!(p + q, KPoint::new(1, -1, 1));
        assert_eq!(p - q, KPoint::new(1, -3, -1));
        assert_eq!(-p, KPoint::new(-1, 2, 0));
        assert_eq!(p.norm_sq(), 5);
    }
}
