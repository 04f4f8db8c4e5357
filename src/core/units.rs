//! Unit constants.
//!
//! Units are plain [`Quantity`] values: `1000.0 * ms` is a second, and
//! compound units are built by expression, e.g. `2.0 * mT / m` for a
//! gradient or `3.0 * um * um / ms` for a diffusion coefficient. The
//! lowercase names follow the usual physics notation.
#![allow(non_upper_case_globals)]

use crate::core::dimensions::Dimensions;
use crate::core::quantity::Quantity;

/// The dimensionless unit, for bare ratios and saturation factors.
pub const one: Quantity = Quantity::new(1.0, Dimensions::NONE);

/// Second.
pub const s: Quantity = Quantity::new(1.0, Dimensions::TIME);
/// Millisecond.
pub const ms: Quantity = Quantity::new(1e-3, Dimensions::TIME);
/// Microsecond.
pub const us: Quantity = Quantity::new(1e-6, Dimensions::TIME);

/// Hertz.
pub const Hz: Quantity = Quantity::new(1.0, Dimensions::FREQUENCY);
/// Kilohertz.
pub const kHz: Quantity = Quantity::new(1e3, Dimensions::FREQUENCY);
/// Megahertz.
pub const MHz: Quantity = Quantity::new(1e6, Dimensions::FREQUENCY);

/// Metre.
pub const m: Quantity = Quantity::new(1.0, Dimensions::LENGTH);
/// Decimetre.
pub const dm: Quantity = Quantity::new(1e-1, Dimensions::LENGTH);
/// Centimetre.
pub const cm: Quantity = Quantity::new(1e-2, Dimensions::LENGTH);
/// Millimetre.
pub const mm: Quantity = Quantity::new(1e-3, Dimensions::LENGTH);
/// Micrometre.
pub const um: Quantity = Quantity::new(1e-6, Dimensions::LENGTH);

/// Tesla.
pub const T: Quantity = Quantity::new(1.0, Dimensions::FLUX_DENSITY);
/// Millitesla.
pub const mT: Quantity = Quantity::new(1e-3, Dimensions::FLUX_DENSITY);
/// Microtesla.
pub const uT: Quantity = Quantity::new(1e-6, Dimensions::FLUX_DENSITY);

/// Radian. Angles are dimensionless.
pub const rad: Quantity = Quantity::new(1.0, Dimensions::NONE);
/// Degree.
pub const deg: Quantity = Quantity::new(std::f64::consts::PI / 180.0, Dimensions::NONE);
