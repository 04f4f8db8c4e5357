#![warn(missing_docs)]

//! `epgsim`: Extended Phase Graph simulation of MRI signal evolution.
//!
//! Given a description of a tissue — relaxation times, diffusion tensor,
//! chemical shift — a sequence of events is applied to a model and the
//! transverse and longitudinal magnetization is read back after each step.
//! Events are instantaneous RF pulses and time intervals with optional
//! magnetic-field gradients.
//!
//! ## Key components
//!
//! * **Quantities (`epgsim::core`):** [`Quantity`] and [`Dimensions`], a
//!   dimensional scalar with exact rational exponents, the unit constants
//!   of [`units`] and the gyromagnetic ratio in [`constants`]. All model
//!   inputs are quantity-typed; dimension errors surface at the call site.
//! * **Species (`epgsim::core::species`):** the tissue description shared
//!   by all models.
//! * **Operators (`epgsim::operators`):** the elementary pulse, relaxation,
//!   diffusion and off-resonance operators, exposed for custom propagators.
//! * **EPG models (`epgsim::epg`):** [`Regular`], [`Discrete`] and
//!   [`Discrete3D`], plus the [`Model`] tagged union dispatching over them.
//!
//! Models own their state exclusively: there are no process-wide caches and
//! no interior mutability, so independent models may run on independent
//! threads without coordination.
//!
//! ## A discrete spin-echo
//!
//! ```
//! use epgsim::{Discrete, Species, units::*};
//!
//! let species = Species::new(1000.0 * ms, 100.0 * ms)?
//!     .with_diffusion(3.0 * um * um / ms)?;
//! let mut model = Discrete::new(species);
//!
//! model.apply_pulse(90.0 * deg, 30.0 * deg)?;
//! model.apply_time_interval(10.0 * ms, 2.0 * mT / m)?;
//! model.apply_pulse(120.0 * deg, 0.0 * deg)?;
//! model.apply_time_interval(10.0 * ms, 2.0 * mT / m)?;
//!
//! // Orders 0, 5350 and 10700 rad/m are populated; the echo is F⁺(0).
//! assert_eq!(model.len(), 3);
//! assert!((model.echo().re - 0.30684831950624042).abs() < 1e-9);
//! # Ok::<(), epgsim::Error>(())
//! ```
//!
//! ## A RARE echo train
//!
//! ```
//! use epgsim::{Regular, Species, units::*};
//!
//! let species = Species::new(1000.0 * ms, 100.0 * ms)?;
//! let r2 = species.r2();
//! let te = 4.0 * ms;
//! let mut model = Regular::new(species);
//!
//! model.apply_pulse(90.0 * deg, 0.0 * deg)?;
//! for echo in 1..=5 {
//!     model.apply_time_interval(te / 2.0, 0.0 * mT / m)?;
//!     model.apply_pulse(180.0 * deg, 0.0 * deg)?;
//!     model.apply_time_interval(te / 2.0, 0.0 * mT / m)?;
//!
//!     // Perfect refocusing: the echo magnitude follows the T2 decay.
//!     let expected = (-(echo as f64) * (te * r2).magnitude()).exp();
//!     assert!((model.echo().norm() - expected).abs() < 1e-9);
//! }
//! # Ok::<(), epgsim::Error>(())
//! ```

pub mod core;
pub mod epg;
pub mod operators;

pub use crate::core::constants;
pub use crate::core::units;
pub use crate::core::{Dimensions, Error, Quantity, Result, Species};
pub use epg::{Discrete, Discrete3D, Gradient, Model, Order, Regular, State};
