//! Discrete (arbitrary-gradient) 1-D EPG model.

use num_complex::Complex;

use crate::core::constants;
use crate::core::error::{Error, Result};
use crate::core::quantity::Quantity;
use crate::core::species::Species;
use crate::core::units;
use crate::epg::{duration_to_seconds, State};
use crate::operators;

/// One populated dephasing order: the canonical (non-negative) order index
/// and its (F⁺, F⁻*, Z) amplitudes. `f_star` stores conj(F(−k)).
#[derive(Debug, Clone)]
struct Bin {
    order: i64,
    f: Complex<f64>,
    f_star: Complex<f64>,
    z: Complex<f64>,
}

/// Discrete EPG model: a sparse, order-sorted collection of configuration
/// states over dephasing orders quantized on a fixed bin width.
///
/// Unlike [`Regular`](crate::Regular), time intervals may carry arbitrary
/// gradient areas: each shift rounds its dephasing γ·G·τ to the nearest
/// integer number of bins. The optional [`threshold`](Discrete::threshold)
/// prunes vanishing states after every time interval and is the only
/// bounded-memory knob for long sequences.
#[derive(Debug, Clone)]
pub struct Discrete {
    species: Species,
    /// Bins sorted by ascending order; `bins[0]` is always the immortal
    /// k = 0 state.
    bins: Vec<Bin>,
    /// Width of one bin, rad/m.
    bin_width: f64,
    /// Pruning cutoff on state magnitudes; 0 disables pruning.
    threshold: f64,
    /// Field-related frequency offset in Hz.
    delta_omega: f64,
    /// Accumulated interval time in s.
    elapsed: f64,
}

/// Default order quantum: 1 rad/m.
const DEFAULT_BIN_WIDTH: f64 = 1.0;

impl Discrete {
    /// Builds a model with the default bin width of 1 rad/m.
    pub fn new(species: Species) -> Self {
        Self {
            species,
            bins: vec![Bin {
                order: 0,
                f: Complex::ZERO,
                f_star: Complex::ZERO,
                z: Complex::ONE,
            }],
            bin_width: DEFAULT_BIN_WIDTH,
            threshold: 0.0,
            delta_omega: 0.0,
            elapsed: 0.0,
        }
    }

    /// Builds a model with an explicit order quantum (in rad/m).
    pub fn with_bin_width(species: Species, bin_width: Quantity) -> Result<Self> {
        let width = bin_width.convert_to(units::rad / units::m)?;
        if width <= 0.0 {
            return Err(Error::InvalidArgument(format!(
                "bin width must be positive, got {width} rad/m"
            )));
        }
        let mut model = Self::new(species);
        model.bin_width = width;
        Ok(model)
    }

    /// The order quantum.
    pub fn bin_width(&self) -> Quantity {
        self.bin_width * units::rad / units::m
    }

    /// The pruning cutoff: after each time interval, states whose three
    /// amplitudes all have magnitude strictly below it are removed (k = 0 is
    /// never removed). Zero disables pruning.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Sets the pruning cutoff.
    pub fn set_threshold(&mut self, threshold: f64) -> Result<()> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(Error::InvalidArgument(format!(
                "threshold must be finite and non-negative, got {threshold}"
            )));
        }
        self.threshold = threshold;
        Ok(())
    }

    /// Field-related frequency offset.
    pub fn delta_omega(&self) -> Quantity {
        self.delta_omega * units::Hz
    }

    /// Sets the field-related frequency offset.
    pub fn set_delta_omega(&mut self, delta_omega: Quantity) -> Result<()> {
        self.delta_omega = delta_omega.convert_to(units::Hz)?;
        Ok(())
    }

    /// Accumulated duration of the applied time intervals.
    pub fn elapsed(&self) -> Quantity {
        self.elapsed * units::s
    }

    /// Number of populated orders.
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    /// Always false: the k = 0 state exists from construction on.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The echo signal F⁺(0).
    pub fn echo(&self) -> Complex<f64> {
        self.bins[0].f
    }

    /// The populated dephasing orders, ascending, in rad/m.
    pub fn orders(&self) -> Vec<Quantity> {
        self.bins
            .iter()
            .map(|bin| bin.order as f64 * self.bin_width * (units::rad / units::m))
            .collect()
    }

    /// The (F⁺, F⁻*, Z) triples, in order of ascending dephasing order.
    pub fn states(&self) -> Vec<State> {
        self.bins.iter().map(|bin| [bin.f, bin.f_star, bin.z]).collect()
    }

    /// The state at a given dephasing order. An order that holds no state
    /// yields the zero triple, not an error.
    pub fn state(&self, order: Quantity) -> Result<State> {
        let k = order.convert_to(units::rad / units::m)?;
        let index = (k / self.bin_width).round() as i64;
        Ok(match self.bins.binary_search_by_key(&index, |bin| bin.order) {
            Ok(position) => {
                let bin = &self.bins[position];
                [bin.f, bin.f_star, bin.z]
            }
            Err(_) => [Complex::ZERO; 3],
        })
    }

    /// The state at a given position in [`Discrete::orders`] order.
    pub fn state_at(&self, index: usize) -> Option<State> {
        self.bins.get(index).map(|bin| [bin.f, bin.f_star, bin.z])
    }

    /// Applies an instantaneous RF pulse of the given flip angle and phase.
    pub fn apply_pulse(&mut self, angle: Quantity, phase: Quantity) -> Result<()> {
        let rotation = operators::pulse(
            angle.convert_to(units::rad)?,
            phase.convert_to(units::rad)?,
        );
        for bin in &mut self.bins {
            let mut state = [bin.f, bin.f_star, bin.z];
            operators::apply(&rotation, &mut state);
            bin.f = state[0];
            bin.f_star = state[1];
            bin.z = state[2];
        }
        Ok(())
    }

    /// Applies relaxation over `duration`; no-op when both rates are zero.
    pub fn relaxation(&mut self, duration: Quantity) -> Result<()> {
        let tau = duration_to_seconds(duration)?;
        if self.species.r1 == 0.0 && self.species.r2 == 0.0 {
            return Ok(());
        }
        let (e1, e2) = operators::relaxation(self.species.r1, self.species.r2, tau);
        for bin in &mut self.bins {
            bin.f *= e2;
            bin.f_star *= e2;
            bin.z *= e1;
        }
        self.bins[0].z += 1.0 - e1;
        Ok(())
    }

    /// Applies diffusion attenuation over `duration` under `gradient`; no-op
    /// for a zero diffusion tensor. The dephasing of a state is its binned
    /// order, the increment Δk = γ·G·τ is used unbinned.
    pub fn diffusion(&mut self, duration: Quantity, gradient: Quantity) -> Result<()> {
        let tau = duration_to_seconds(duration)?;
        let g = gradient.convert_to(units::T / units::m)?;
        if !self.species.has_diffusion() {
            return Ok(());
        }
        let delta_k = constants::gamma.magnitude() * g * tau;
        for bin in &mut self.bins {
            let k = bin.order as f64 * self.bin_width;
            let (plus, minus, longitudinal) = operators::diffusion(
                &self.species.d,
                tau,
                [k, 0.0, 0.0],
                [delta_k, 0.0, 0.0],
            );
            bin.f *= plus;
            bin.f_star *= minus;
            bin.z *= longitudinal;
        }
        Ok(())
    }

    /// Accrues the off-resonance phase over `duration`; Z is invariant.
    pub fn off_resonance(&mut self, duration: Quantity) -> Result<()> {
        let tau = duration_to_seconds(duration)?;
        let delta_f = self.delta_omega + self.species.delta_omega;
        if delta_f == 0.0 {
            return Ok(());
        }
        let factor = operators::phase(delta_f, tau);
        let conjugate = factor.conj();
        for bin in &mut self.bins {
            bin.f *= factor;
            bin.f_star *= conjugate;
        }
        Ok(())
    }

    /// Shifts the dephasing orders by the binned γ·G·τ of the gradient lobe.
    pub fn shift(&mut self, duration: Quantity, gradient: Quantity) -> Result<()> {
        let tau = duration_to_seconds(duration)?;
        let g = gradient.convert_to(units::T / units::m)?;
        let delta = (constants::gamma.magnitude() * g * tau / self.bin_width).round() as i64;
        self.translate(delta);
        Ok(())
    }

    /// Applies a full time interval: relaxation, diffusion, off-resonance
    /// phase, gradient shift, threshold pruning, in this fixed order
    /// (diffusion is evaluated with the starting dephasing orders).
    pub fn apply_time_interval(&mut self, duration: Quantity, gradient: Quantity) -> Result<()> {
        let tau = duration_to_seconds(duration)?;
        self.relaxation(duration)?;
        self.diffusion(duration, gradient)?;
        self.off_resonance(duration)?;
        self.shift(duration, gradient)?;
        self.prune();
        self.elapsed += tau;
        Ok(())
    }

    /// Translates the F states by `delta` bins: unfold the canonical bins
    /// onto the signed order axis, translate, re-fold. Z orders do not
    /// move. Every stream below is sorted, so the re-fold is a linear merge.
    fn translate(&mut self, delta: i64) {
        if delta == 0 {
            return;
        }
        let bins = &self.bins;

        // Positive side: F(k) = f(k) for k ≥ 0, shifted to k + delta. Still
        // on the canonical side while k + delta ≥ 0.
        let mut shifted_f: Vec<(i64, Complex<f64>)> = Vec::with_capacity(bins.len());
        // Negative side: F(−k) = conj(f_star(k)) for k ≥ 1, shifted to
        // −k + delta; on the canonical side when −k + delta < 0, i.e. for
        // k > delta.
        let mut shifted_f_star: Vec<(i64, Complex<f64>)> = Vec::with_capacity(bins.len());

        for bin in bins {
            if bin.order + delta >= 0 {
                shifted_f.push((bin.order + delta, bin.f));
            }
            if bin.order > 0 && bin.order > delta {
                shifted_f_star.push((bin.order - delta, bin.f_star));
            }
        }

        // States pushed across zero change side and conjugate. Source
        // orders ascend, target orders descend, hence the reversed scans.
        let mut crossed_f: Vec<(i64, Complex<f64>)> = Vec::new();
        let mut crossed_f_star: Vec<(i64, Complex<f64>)> = Vec::new();
        if delta > 0 {
            for bin in bins.iter().rev() {
                if bin.order > 0 && bin.order <= delta {
                    crossed_f.push((delta - bin.order, bin.f_star.conj()));
                }
            }
        } else {
            for bin in bins.iter().rev() {
                if bin.order + delta < 0 {
                    crossed_f_star.push((-delta - bin.order, bin.f.conj()));
                }
            }
        }

        let new_f = merge_disjoint(shifted_f, crossed_f);
        let new_f_star = merge_disjoint(shifted_f_star, crossed_f_star);

        // Three-way merge with the unmoved Z orders.
        let mut merged: Vec<Bin> =
            Vec::with_capacity(new_f.len().max(new_f_star.len()).max(bins.len()) + 1);
        let mut f_cursor = new_f.into_iter().peekable();
        let mut f_star_cursor = new_f_star.into_iter().peekable();
        let mut z_cursor = bins.iter().peekable();

        loop {
            let mut order = i64::MAX;
            if let Some((key, _)) = f_cursor.peek() {
                order = order.min(*key);
            }
            if let Some((key, _)) = f_star_cursor.peek() {
                order = order.min(*key);
            }
            if let Some(bin) = z_cursor.peek() {
                order = order.min(bin.order);
            }
            if order == i64::MAX {
                break;
            }

            let f = match f_cursor.peek() {
                Some((key, _)) if *key == order => f_cursor.next().unwrap().1,
                _ => Complex::ZERO,
            };
            let mut f_star = match f_star_cursor.peek() {
                Some((key, _)) if *key == order => f_star_cursor.next().unwrap().1,
                _ => Complex::ZERO,
            };
            let z = match z_cursor.peek() {
                Some(bin) if bin.order == order => z_cursor.next().unwrap().z,
                _ => Complex::ZERO,
            };
            // F⁺(0) = conj(F⁻*(0)): the two F parts of the zero order are
            // the same physical coherence.
            if order == 0 {
                f_star = f.conj();
            }
            merged.push(Bin { order, f, f_star, z });
        }

        self.bins = merged;
        debug_assert_eq!(self.bins[0].order, 0);
    }

    /// Drops every state whose amplitudes all lie strictly below the
    /// threshold; the k = 0 state is never dropped.
    fn prune(&mut self) {
        if self.threshold <= 0.0 {
            return;
        }
        let threshold = self.threshold;
        self.bins.retain(|bin| {
            bin.order == 0
                || bin.f.norm() >= threshold
                || bin.f_star.norm() >= threshold
                || bin.z.norm() >= threshold
        });
    }
}

/// Merges two key-sorted runs with disjoint keys into one sorted run.
fn merge_disjoint(
    left: Vec<(i64, Complex<f64>)>,
    right: Vec<(i64, Complex<f64>)>,
) -> Vec<(i64, Complex<f64>)> {
    if right.is_empty() {
        return left;
    }
    if left.is_empty() {
        return right;
    }
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        match (left.peek(), right.peek()) {
            (Some((l, _)), Some((r, _))) => {
                if l < r {
                    merged.push(left.next().unwrap());
                } else {
                    merged.push(right.next().unwrap());
                }
            }
            (Some(_), None) => merged.push(left.next().unwrap()),
            (None, Some(_)) => merged.push(right.next().unwrap()),
            (None, None) => break,
        }
    }
    merged
}
