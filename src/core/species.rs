//! Tissue description: relaxation rates, diffusion tensor, chemical shift.

use crate::core::dimensions::Dimensions;
use crate::core::error::{Error, Result};
use crate::core::quantity::Quantity;
use crate::core::units;

/// Relaxation, diffusion and chemical-shift parameters of a single
/// population of spins.
///
/// All values are stored as raw SI magnitudes; unit conversion happens here,
/// at construction, and nowhere else in the crate. Relaxation parameters may
/// be given either as rates (`10.0 * Hz`) or as times (`100.0 * ms`); a rate
/// of zero disables the corresponding relaxation.
///
/// ```
/// use epgsim::{Species, units::*};
///
/// let water = Species::new(1000.0 * ms, 100.0 * ms)?
///     .with_diffusion(3.0 * um * um / ms)?;
/// assert_eq!(water.r1(), 1.0 * Hz);
/// # Ok::<(), epgsim::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Species {
    /// Longitudinal relaxation rate, 1/s.
    pub(crate) r1: f64,
    /// Transverse relaxation rate, 1/s.
    pub(crate) r2: f64,
    /// Symmetric diffusion tensor, m²/s.
    pub(crate) d: [[f64; 3]; 3],
    /// Frequency offset (chemical shift or susceptibility), Hz.
    pub(crate) delta_omega: f64,
}

/// Converts a relaxation parameter, given as either a rate or a time, into
/// a non-negative rate in 1/s.
fn relaxation_rate(parameter: Quantity) -> Result<f64> {
    let rate = if parameter.dimensions() == Dimensions::TIME {
        let time = parameter.convert_to(units::s)?;
        if time <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "relaxation time must be positive, got {time} s"
            )));
        }
        1.0 / time
    } else {
        parameter.convert_to(units::Hz)?
    };
    if rate < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "relaxation rate must be non-negative, got {rate} Hz"
        )));
    }
    Ok(rate)
}

impl Species {
    /// Builds a species from its longitudinal and transverse relaxation
    /// parameters, each given as either a time (T1, T2) or a rate (R1, R2).
    /// Diffusion and frequency offset default to zero.
    pub fn new(r1_or_t1: Quantity, r2_or_t2: Quantity) -> Result<Self> {
        Ok(Self {
            r1: relaxation_rate(r1_or_t1)?,
            r2: relaxation_rate(r2_or_t2)?,
            d: [[0.0; 3]; 3],
            delta_omega: 0.0,
        })
    }

    /// Sets an isotropic diffusion coefficient, broadcast to diag(d, d, d).
    pub fn with_diffusion(mut self, d: Quantity) -> Result<Self> {
        let d = d.convert_to(units::m * units::m / units::s)?;
        self.d = [[d, 0.0, 0.0], [0.0, d, 0.0], [0.0, 0.0, d]];
        Ok(self)
    }

    /// Sets the full diffusion tensor. The tensor must be symmetric; it is
    /// expected to be positive semi-definite (not checked).
    pub fn with_diffusion_tensor(mut self, d: [[Quantity; 3]; 3]) -> Result<Self> {
        let mut tensor = [[0.0; 3]; 3];
        for (row, quantities) in tensor.iter_mut().zip(&d) {
            for (element, quantity) in row.iter_mut().zip(quantities) {
                *element = quantity.convert_to(units::m * units::m / units::s)?;
            }
        }
        for i in 0..3 {
            for j in 0..i {
                if tensor[i][j] != tensor[j][i] {
                    return Err(Error::InvalidArgument(
                        "diffusion tensor must be symmetric".into(),
                    ));
                }
            }
        }
        self.d = tensor;
        Ok(self)
    }

    /// Sets the frequency offset. The value is a cyclic frequency: over an
    /// interval τ it accrues a phase of 2π·Δf·τ on the transverse states.
    pub fn with_delta_omega(mut self, delta_omega: Quantity) -> Result<Self> {
        self.delta_omega = delta_omega.convert_to(units::Hz)?;
        Ok(self)
    }

    /// Longitudinal relaxation rate.
    pub fn r1(&self) -> Quantity {
        self.r1 * units::Hz
    }

    /// Transverse relaxation rate.
    pub fn r2(&self) -> Quantity {
        self.r2 * units::Hz
    }

    /// Longitudinal relaxation time, infinite when R1 is zero.
    pub fn t1(&self) -> Quantity {
        (1.0 / self.r1) * units::s
    }

    /// Transverse relaxation time, infinite when R2 is zero.
    pub fn t2(&self) -> Quantity {
        (1.0 / self.r2) * units::s
    }

    /// Diffusion tensor.
    pub fn d(&self) -> [[Quantity; 3]; 3] {
        self.d.map(|row| row.map(|element| element * units::m * units::m / units::s))
    }

    /// Frequency offset.
    pub fn delta_omega(&self) -> Quantity {
        self.delta_omega * units::Hz
    }

    pub(crate) fn has_diffusion(&self) -> bool {
        self.d.iter().flatten().any(|&element| element != 0.0)
    }
}
