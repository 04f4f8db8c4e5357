//! Dimension signatures of physical quantities.

use std::fmt;

use num_rational::Ratio;

/// The dimension signature of a [`Quantity`](crate::Quantity): one signed
/// rational exponent for each of the seven SI base dimensions.
///
/// Exponents are rationals rather than integers so that roots stay exact:
/// `sqrt(9 m²)` is `3 m`, and `sqrt(q)` of an odd-exponent quantity keeps
/// its half-integer signature instead of silently truncating it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Dimensions {
    /// Exponent of length (metre).
    pub length: Ratio<i32>,
    /// Exponent of mass (kilogram).
    pub mass: Ratio<i32>,
    /// Exponent of time (second).
    pub time: Ratio<i32>,
    /// Exponent of electric current (ampere).
    pub current: Ratio<i32>,
    /// Exponent of thermodynamic temperature (kelvin).
    pub temperature: Ratio<i32>,
    /// Exponent of amount of substance (mole).
    pub amount: Ratio<i32>,
    /// Exponent of luminous intensity (candela).
    pub luminous_intensity: Ratio<i32>,
}

impl Dimensions {
    /// Builds a signature from integer exponents, in SI base-dimension order
    /// (length, mass, time, current, temperature, amount, luminous intensity).
    pub const fn new(
        length: i32,
        mass: i32,
        time: i32,
        current: i32,
        temperature: i32,
        amount: i32,
        luminous_intensity: i32,
    ) -> Self {
        Self {
            length: Ratio::new_raw(length, 1),
            mass: Ratio::new_raw(mass, 1),
            time: Ratio::new_raw(time, 1),
            current: Ratio::new_raw(current, 1),
            temperature: Ratio::new_raw(temperature, 1),
            amount: Ratio::new_raw(amount, 1),
            luminous_intensity: Ratio::new_raw(luminous_intensity, 1),
        }
    }

    /// The empty signature of a dimensionless quantity.
    pub const NONE: Self = Self::new(0, 0, 0, 0, 0, 0, 0);
    /// Length (metre).
    pub const LENGTH: Self = Self::new(1, 0, 0, 0, 0, 0, 0);
    /// Mass (kilogram).
    pub const MASS: Self = Self::new(0, 1, 0, 0, 0, 0, 0);
    /// Time (second).
    pub const TIME: Self = Self::new(0, 0, 1, 0, 0, 0, 0);
    /// Electric current (ampere).
    pub const CURRENT: Self = Self::new(0, 0, 0, 1, 0, 0, 0);
    /// Thermodynamic temperature (kelvin).
    pub const TEMPERATURE: Self = Self::new(0, 0, 0, 0, 1, 0, 0);
    /// Amount of substance (mole).
    pub const AMOUNT: Self = Self::new(0, 0, 0, 0, 0, 1, 0);
    /// Luminous intensity (candela).
    pub const LUMINOUS_INTENSITY: Self = Self::new(0, 0, 0, 0, 0, 0, 1);

    /// Frequency (1/s). Angles are dimensionless, so angular frequencies
    /// share this signature.
    pub const FREQUENCY: Self = Self::new(0, 0, -1, 0, 0, 0, 0);
    /// Magnetic flux density (tesla, kg/(A·s²)).
    pub const FLUX_DENSITY: Self = Self::new(0, 1, -2, -1, 0, 0, 0);
    /// Diffusion coefficient (m²/s).
    pub const DIFFUSION: Self = Self::new(2, 0, -1, 0, 0, 0, 0);
    /// Dephasing order (rad/m, i.e. 1/m).
    pub const DEPHASING: Self = Self::new(-1, 0, 0, 0, 0, 0, 0);
    /// Gradient moment (T·s/m).
    pub const GRADIENT_AREA: Self = Self::new(-1, 1, -1, -1, 0, 0, 0);

    /// True when every exponent is zero.
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    pub(crate) fn combined(&self, other: &Self, sign: i32) -> Self {
        let s = Ratio::from_integer(sign);
        Self {
            length: self.length + s * other.length,
            mass: self.mass + s * other.mass,
            time: self.time + s * other.time,
            current: self.current + s * other.current,
            temperature: self.temperature + s * other.temperature,
            amount: self.amount + s * other.amount,
            luminous_intensity: self.luminous_intensity + s * other.luminous_intensity,
        }
    }

    pub(crate) fn scaled(&self, factor: Ratio<i32>) -> Self {
        Self {
            length: self.length * factor,
            mass: self.mass * factor,
            time: self.time * factor,
            current: self.current * factor,
            temperature: self.temperature * factor,
            amount: self.amount * factor,
            luminous_intensity: self.luminous_intensity * factor,
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let exponents = [
            ("L", self.length),
            ("M", self.mass),
            ("T", self.time),
            ("I", self.current),
            ("Θ", self.temperature),
            ("N", self.amount),
            ("J", self.luminous_intensity),
        ];

        if self.is_none() {
            return write!(f, "[ dimensionless ]");
        }

        write!(f, "[")?;
        for (symbol, exponent) in exponents {
            if exponent != Ratio::new_raw(0, 1) {
                write!(f, " {symbol}^{exponent}")?;
            }
        }
        write!(f, " ]")
    }
}
