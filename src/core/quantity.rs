//! Dimensional scalars.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{
    Add, AddAssign, Div, DivAssign, Mul, MulAssign, Neg, Rem, RemAssign, Sub, SubAssign,
};

use num_rational::Ratio;

use crate::core::dimensions::Dimensions;
use crate::core::error::{Error, Result};

/// A physical quantity: a double-precision magnitude expressed in SI base
/// units, tagged with its [`Dimensions`].
///
/// Quantities are closed under the usual arithmetic. Multiplication and
/// division combine dimension signatures; addition, subtraction, remainder
/// and ordering require identical signatures. The operator forms of the
/// latter panic on mismatched signatures (these are programmer errors, like
/// an out-of-bounds index); [`Quantity::try_add`], [`Quantity::try_sub`],
/// [`Quantity::try_rem`] and [`Quantity::convert_to`] are the checked forms,
/// and `partial_cmp` across different signatures yields `None`.
///
/// Two quantities are equal iff both the magnitude and the signature are
/// equal. A quantity compares equal to a bare `f64` only when it is
/// dimensionless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantity {
    magnitude: f64,
    dimensions: Dimensions,
}

impl Quantity {
    /// Builds a quantity from a base-unit magnitude and a signature.
    pub const fn new(magnitude: f64, dimensions: Dimensions) -> Self {
        Self { magnitude, dimensions }
    }

    /// The magnitude in SI base units.
    pub fn magnitude(&self) -> f64 {
        self.magnitude
    }

    /// The dimension signature.
    pub fn dimensions(&self) -> Dimensions {
        self.dimensions
    }

    /// True when the signature is empty.
    pub fn is_dimensionless(&self) -> bool {
        self.dimensions.is_none()
    }

    /// Expresses the quantity as a multiple of `unit`.
    ///
    /// This is the single ingress point for turning quantities into raw
    /// floating-point values: `duration.convert_to(units::s)?` yields
    /// seconds or fails with [`Error::DimensionMismatch`].
    pub fn convert_to(&self, unit: Quantity) -> Result<f64> {
        if self.dimensions == unit.dimensions {
            Ok(self.magnitude / unit.magnitude)
        } else {
            Err(Error::DimensionMismatch {
                expected: unit.dimensions,
                actual: self.dimensions,
            })
        }
    }

    /// Checked addition.
    pub fn try_add(self, other: Quantity) -> Result<Quantity> {
        if self.dimensions == other.dimensions {
            Ok(Self::new(self.magnitude + other.magnitude, self.dimensions))
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: other.dimensions,
            })
        }
    }

    /// Checked subtraction.
    pub fn try_sub(self, other: Quantity) -> Result<Quantity> {
        self.try_add(-other)
    }

    /// Checked remainder.
    pub fn try_rem(self, other: Quantity) -> Result<Quantity> {
        if self.dimensions == other.dimensions {
            Ok(Self::new(self.magnitude % other.magnitude, self.dimensions))
        } else {
            Err(Error::DimensionMismatch {
                expected: self.dimensions,
                actual: other.dimensions,
            })
        }
    }

    /// Raises the quantity to an integer power; the signature scales by `n`.
    pub fn powi(self, n: i32) -> Quantity {
        Self::new(
            self.magnitude.powi(n),
            self.dimensions.scaled(Ratio::from_integer(n)),
        )
    }

    /// Square root; every exponent of the signature is halved.
    pub fn sqrt(self) -> Quantity {
        Self::new(self.magnitude.sqrt(), self.dimensions.scaled(Ratio::new(1, 2)))
    }

    /// Absolute value, same signature.
    pub fn abs(self) -> Quantity {
        Self::new(self.magnitude.abs(), self.dimensions)
    }
}

impl PartialEq<f64> for Quantity {
    fn eq(&self, other: &f64) -> bool {
        self.is_dimensionless() && self.magnitude == *other
    }
}

impl PartialEq<Quantity> for f64 {
    fn eq(&self, other: &Quantity) -> bool {
        other == self
    }
}

impl PartialOrd for Quantity {
    fn partial_cmp(&self, other: &Quantity) -> Option<Ordering> {
        if self.dimensions == other.dimensions {
            self.magnitude.partial_cmp(&other.magnitude)
        } else {
            None
        }
    }
}

fn expect_same_dimensions(left: &Quantity, right: &Quantity, operation: &str) {
    assert!(
        left.dimensions == right.dimensions,
        "invalid dimensions in {operation}: {} vs {}",
        left.dimensions,
        right.dimensions,
    );
}

impl Add for Quantity {
    type Output = Quantity;
    fn add(self, other: Quantity) -> Quantity {
        expect_same_dimensions(&self, &other, "addition");
        Quantity::new(self.magnitude + other.magnitude, self.dimensions)
    }
}

impl Sub for Quantity {
    type Output = Quantity;
    fn sub(self, other: Quantity) -> Quantity {
        expect_same_dimensions(&self, &other, "subtraction");
        Quantity::new(self.magnitude - other.magnitude, self.dimensions)
    }
}

impl Rem for Quantity {
    type Output = Quantity;
    fn rem(self, other: Quantity) -> Quantity {
        expect_same_dimensions(&self, &other, "remainder");
        Quantity::new(self.magnitude % other.magnitude, self.dimensions)
    }
}

impl Neg for Quantity {
    type Output = Quantity;
    fn neg(self) -> Quantity {
        Quantity::new(-self.magnitude, self.dimensions)
    }
}

impl Mul for Quantity {
    type Output = Quantity;
    fn mul(self, other: Quantity) -> Quantity {
        Quantity::new(
            self.magnitude * other.magnitude,
            self.dimensions.combined(&other.dimensions, 1),
        )
    }
}

impl Div for Quantity {
    type Output = Quantity;
    fn div(self, other: Quantity) -> Quantity {
        Quantity::new(
            self.magnitude / other.magnitude,
            self.dimensions.combined(&other.dimensions, -1),
        )
    }
}

impl Mul<f64> for Quantity {
    type Output = Quantity;
    fn mul(self, scalar: f64) -> Quantity {
        Quantity::new(self.magnitude * scalar, self.dimensions)
    }
}

impl Mul<Quantity> for f64 {
    type Output = Quantity;
    fn mul(self, quantity: Quantity) -> Quantity {
        quantity * self
    }
}

impl Div<f64> for Quantity {
    type Output = Quantity;
    fn div(self, scalar: f64) -> Quantity {
        Quantity::new(self.magnitude / scalar, self.dimensions)
    }
}

impl Div<Quantity> for f64 {
    type Output = Quantity;
    fn div(self, quantity: Quantity) -> Quantity {
        Quantity::new(
            self / quantity.magnitude,
            Dimensions::NONE.combined(&quantity.dimensions, -1),
        )
    }
}

impl AddAssign for Quantity {
    fn add_assign(&mut self, other: Quantity) {
        *self = *self + other;
    }
}

impl SubAssign for Quantity {
    fn sub_assign(&mut self, other: Quantity) {
        *self = *self - other;
    }
}

impl RemAssign for Quantity {
    fn rem_assign(&mut self, other: Quantity) {
        *self = *self % other;
    }
}

impl MulAssign<f64> for Quantity {
    fn mul_assign(&mut self, scalar: f64) {
        *self = *self * scalar;
    }
}

impl DivAssign<f64> for Quantity {
    fn div_assign(&mut self, scalar: f64) {
        *self = *self / scalar;
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.magnitude, self.dimensions)
    }
}
