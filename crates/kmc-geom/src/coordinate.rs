// SPDX-License-Identifier: Apache-2.0
use std::cmp::Ordering;
use std::ops::{Add, Index, IndexMut, Mul, Neg, Sub};

/// A point or displacement in the lattice's ambient 3-space.
///
/// Ordering is lexicographic with `x` most significant, matching the sort
/// key used to build match lists (distance first, then this order as a
/// tie-break). `f64::total_cmp` is used component-wise so the order is a
/// total order even in the presence of `NaN`, which callers must otherwise
/// never produce.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Coordinate {
    x: f64,
    y: f64,
    z: f64,
}

impl Coordinate {
    /// Creates a coordinate from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin.
    #[must_use]
    pub const fn origin() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// The x component.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// The y component.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }

    /// The z component.
    #[must_use]
    pub const fn z(&self) -> f64 {
        self.z
    }

    /// Returns the components as an array.
    #[must_use]
    pub const fn data(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Dot product with another coordinate.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Componentwise (elementwise) product, a.k.a. the diagonal of the
    /// outer product of `self` with `other`.
    #[must_use]
    pub fn outer_prod_diag(&self, other: &Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }

    /// Euclidean norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.dot(self).sqrt()
    }

    /// Euclidean distance to another coordinate.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f64 {
        (*self - *other).norm()
    }

    /// Euclidean distance to the origin.
    #[must_use]
    pub fn distance_to_origin(&self) -> f64 {
        self.norm()
    }
}

impl Add for Coordinate {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Coordinate {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Neg for Coordinate {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Mul<f64> for Coordinate {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl std::ops::AddAssign for Coordinate {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Index<usize> for Coordinate {
    type Output = f64;

    /// Indexes by axis, `0 => x`, `1 => y`, anything else `=> z`, matching
    /// the clamping behaviour of the original `operator[]`.
    fn index(&self, i: usize) -> &f64 {
        match i {
            0 => &self.x,
            1 => &self.y,
            _ => &self.z,
        }
    }
}

impl IndexMut<usize> for Coordinate {
    fn index_mut(&mut self, i: usize) -> &mut f64 {
        match i {
            0 => &mut self.x,
            1 => &mut self.y,
            _ => &mut self.z,
        }
    }
}

impl Eq for Coordinate {}

impl PartialOrd for Coordinate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.x
            .total_cmp(&other.x)
            .then_with(|| self.y.total_cmp(&other.y))
            .then_with(|| self.z.total_cmp(&other.z))
    }
}
