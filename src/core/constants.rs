//! Physical constants.
#![allow(non_upper_case_globals)]

use crate::core::dimensions::Dimensions;
use crate::core::quantity::Quantity;

/// Gyromagnetic ratio of the proton, 2π · 42.57747892 MHz/T, in rad/(s·T).
pub const gamma: Quantity = Quantity::new(
    2.0 * std::f64::consts::PI * 42.577_478_92e6,
    Dimensions::new(0, -1, 1, 1, 0, 0, 0),
);

/// Gyromagnetic ratio of the proton divided by 2π, 42.57747892 MHz/T.
pub const gamma_bar: Quantity = Quantity::new(
    42.577_478_92e6,
    Dimensions::new(0, -1, 1, 1, 0, 0, 0),
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::units;

    #[test]
    fn gamma_consistency() {
        let ratio = gamma / gamma_bar;
        assert!(ratio.is_dimensionless());
        assert!((ratio.magnitude() - 2.0 * std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn gamma_dimensions() {
        // γ·G·τ is a dephasing order in rad/m.
        let k = gamma * (1.0 * units::mT / units::m) * (1.0 * units::ms);
        assert_eq!(k.dimensions(), Dimensions::DEPHASING);
    }
}
