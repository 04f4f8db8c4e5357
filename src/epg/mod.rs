//! Extended Phase Graph models.
//!
//! EPG represents an ensemble of spins by its Fourier coefficients along
//! the dephasing axis: each configuration state (F⁺, F⁻*, Z) carries a
//! coherence order k. RF pulses mix the three components of every state,
//! time intervals apply relaxation, diffusion attenuation and a
//! gradient-driven shift of the orders.
//!
//! Three variants share this operator algebra:
//!
//! * [`Regular`] — dense, unit-spaced orders; optional two-pool exchange
//!   and magnetization-transfer extensions.
//! * [`Discrete`] — sparse 1-D orders quantized on a fixed bin width;
//!   arbitrary gradient areas.
//! * [`Discrete3D`] — sparse 3-D orders for sequences whose gradients do
//!   not share an axis.
//!
//! [`Model`] wraps the three variants in a tagged enum for callers that
//! choose the variant at run time; the concrete types expose the richer,
//! variant-specific API.

pub mod discrete;
pub mod discrete_3d;
pub mod regular;

pub use discrete::Discrete;
pub use discrete_3d::Discrete3D;
pub use regular::Regular;

use num_complex::Complex;

use crate::core::error::{Error, Result};
use crate::core::quantity::Quantity;
use crate::core::units;

/// One configuration state: its (F⁺, F⁻*, Z) amplitudes.
pub type State = [Complex<f64>; 3];

/// Converts a duration to seconds, rejecting negative values.
pub(crate) fn duration_to_seconds(duration: Quantity) -> Result<f64> {
    let tau = duration.convert_to(units::s)?;
    if tau < 0.0 {
        return Err(Error::InvalidArgument(format!(
            "duration must be non-negative, got {tau} s"
        )));
    }
    Ok(tau)
}

/// A gradient amplitude, scalar or 3-vector, accepted by the [`Model`]
/// dispatch methods.
///
/// A scalar reaching the 3-D model is broadcast to the x axis; a vector
/// reaching a 1-D model is an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Gradient {
    /// A gradient along the single dephasing axis of a 1-D model.
    Scalar(Quantity),
    /// A full 3-D gradient vector.
    Vector([Quantity; 3]),
}

impl From<Quantity> for Gradient {
    fn from(gradient: Quantity) -> Self {
        Self::Scalar(gradient)
    }
}

impl From<[Quantity; 3]> for Gradient {
    fn from(gradient: [Quantity; 3]) -> Self {
        Self::Vector(gradient)
    }
}

impl Gradient {
    fn scalar(self) -> Result<Quantity> {
        match self {
            Self::Scalar(gradient) => Ok(gradient),
            Self::Vector(_) => Err(Error::InvalidArgument(
                "a 1-D model takes a scalar gradient, not a 3-vector".into(),
            )),
        }
    }

    fn vector(self) -> [Quantity; 3] {
        match self {
            Self::Scalar(gradient) => [gradient, gradient * 0.0, gradient * 0.0],
            Self::Vector(gradient) => gradient,
        }
    }
}

/// A dephasing order, scalar or 3-vector, accepted and returned by the
/// [`Model`] dispatch methods.
///
/// A scalar order reaching the 3-D model is broadcast to the x axis,
/// mirroring the [`Gradient`] broadcast; a vector order reaching a 1-D
/// model is an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Order {
    /// An order along the single dephasing axis of a 1-D model.
    Scalar(Quantity),
    /// A full 3-D order vector.
    Vector([Quantity; 3]),
}

impl From<Quantity> for Order {
    fn from(order: Quantity) -> Self {
        Self::Scalar(order)
    }
}

impl From<[Quantity; 3]> for Order {
    fn from(order: [Quantity; 3]) -> Self {
        Self::Vector(order)
    }
}

impl Order {
    fn scalar(self) -> Result<Quantity> {
        match self {
            Self::Scalar(order) => Ok(order),
            Self::Vector(_) => Err(Error::InvalidArgument(
                "a 1-D model takes a scalar order, not a 3-vector".into(),
            )),
        }
    }

    fn vector(self) -> [Quantity; 3] {
        match self {
            Self::Scalar(order) => [order, order * 0.0, order * 0.0],
            Self::Vector(order) => order,
        }
    }
}

/// A tagged union of the three EPG variants, dispatching the operations
/// they share.
#[derive(Debug, Clone)]
pub enum Model {
    /// Dense, unit-spaced model.
    Regular(Regular),
    /// Sparse 1-D model.
    Discrete(Discrete),
    /// Sparse 3-D model.
    Discrete3D(Discrete3D),
}

impl From<Regular> for Model {
    fn from(model: Regular) -> Self {
        Self::Regular(model)
    }
}

impl From<Discrete> for Model {
    fn from(model: Discrete) -> Self {
        Self::Discrete(model)
    }
}

impl From<Discrete3D> for Model {
    fn from(model: Discrete3D) -> Self {
        Self::Discrete3D(model)
    }
}

impl Model {
    /// Applies an instantaneous RF pulse of the given flip angle and phase.
    pub fn apply_pulse(&mut self, angle: Quantity, phase: Quantity) -> Result<()> {
        match self {
            Self::Regular(model) => model.apply_pulse(angle, phase),
            Self::Discrete(model) => model.apply_pulse(angle, phase),
            Self::Discrete3D(model) => model.apply_pulse(angle, phase),
        }
    }

    /// Applies a full time interval with an optional gradient.
    pub fn apply_time_interval(
        &mut self,
        duration: Quantity,
        gradient: impl Into<Gradient>,
    ) -> Result<()> {
        match (self, gradient.into()) {
            (Self::Regular(model), gradient) => {
                model.apply_time_interval(duration, gradient.scalar()?)
            }
            (Self::Discrete(model), gradient) => {
                model.apply_time_interval(duration, gradient.scalar()?)
            }
            (Self::Discrete3D(model), gradient) => {
                model.apply_time_interval(duration, gradient.vector())
            }
        }
    }

    /// Applies the relaxation operator alone.
    pub fn relaxation(&mut self, duration: Quantity) -> Result<()> {
        match self {
            Self::Regular(model) => model.relaxation(duration),
            Self::Discrete(model) => model.relaxation(duration),
            Self::Discrete3D(model) => model.relaxation(duration),
        }
    }

    /// Applies the diffusion operator alone.
    pub fn diffusion(
        &mut self,
        duration: Quantity,
        gradient: impl Into<Gradient>,
    ) -> Result<()> {
        match (self, gradient.into()) {
            (Self::Regular(model), gradient) => model.diffusion(duration, gradient.scalar()?),
            (Self::Discrete(model), gradient) => model.diffusion(duration, gradient.scalar()?),
            (Self::Discrete3D(model), gradient) => {
                model.diffusion(duration, gradient.vector())
            }
        }
    }

    /// Applies the off-resonance phase accumulation alone.
    pub fn off_resonance(&mut self, duration: Quantity) -> Result<()> {
        match self {
            Self::Regular(model) => model.off_resonance(duration),
            Self::Discrete(model) => model.off_resonance(duration),
            Self::Discrete3D(model) => model.off_resonance(duration),
        }
    }

    /// Applies the gradient shift operator alone.
    pub fn shift(&mut self, duration: Quantity, gradient: impl Into<Gradient>) -> Result<()> {
        match (self, gradient.into()) {
            (Self::Regular(model), gradient) => {
                model.shift_gradient(duration, gradient.scalar()?)
            }
            (Self::Discrete(model), gradient) => model.shift(duration, gradient.scalar()?),
            (Self::Discrete3D(model), gradient) => model.shift(duration, gradient.vector()),
        }
    }

    /// The echo signal F⁺(0).
    pub fn echo(&self) -> Complex<f64> {
        match self {
            Self::Regular(model) => model.echo(),
            Self::Discrete(model) => model.echo(),
            Self::Discrete3D(model) => model.echo(),
        }
    }

    /// Accumulated duration of the applied time intervals.
    pub fn elapsed(&self) -> Quantity {
        match self {
            Self::Regular(model) => model.elapsed(),
            Self::Discrete(model) => model.elapsed(),
            Self::Discrete3D(model) => model.elapsed(),
        }
    }

    /// Number of populated dephasing orders.
    pub fn len(&self) -> usize {
        match self {
            Self::Regular(model) => model.len(),
            Self::Discrete(model) => model.len(),
            Self::Discrete3D(model) => model.len(),
        }
    }

    /// Always false: every model keeps its k = 0 state.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Field-related frequency offset.
    pub fn delta_omega(&self) -> Quantity {
        match self {
            Self::Regular(model) => model.delta_omega(),
            Self::Discrete(model) => model.delta_omega(),
            Self::Discrete3D(model) => model.delta_omega(),
        }
    }

    /// Sets the field-related frequency offset.
    pub fn set_delta_omega(&mut self, delta_omega: Quantity) -> Result<()> {
        match self {
            Self::Regular(model) => model.set_delta_omega(delta_omega),
            Self::Discrete(model) => model.set_delta_omega(delta_omega),
            Self::Discrete3D(model) => model.set_delta_omega(delta_omega),
        }
    }

    /// The (F⁺, F⁻*, Z) triples in the model's own order.
    pub fn states(&self) -> Vec<State> {
        match self {
            Self::Regular(model) => model.states(),
            Self::Discrete(model) => model.states(),
            Self::Discrete3D(model) => model.states(),
        }
    }

    /// The populated dephasing orders, in the model's own listing order.
    pub fn orders(&self) -> Vec<Order> {
        match self {
            Self::Regular(model) => {
                model.orders().into_iter().map(Order::Scalar).collect()
            }
            Self::Discrete(model) => {
                model.orders().into_iter().map(Order::Scalar).collect()
            }
            Self::Discrete3D(model) => {
                model.orders().into_iter().map(Order::Vector).collect()
            }
        }
    }

    /// The state at a given dephasing order.
    pub fn state(&self, order: impl Into<Order>) -> Result<State> {
        match (self, order.into()) {
            (Self::Regular(model), order) => model.state(order.scalar()?),
            (Self::Discrete(model), order) => model.state(order.scalar()?),
            (Self::Discrete3D(model), order) => model.state(order.vector()),
        }
    }
}
