//! Discrete 3-D EPG model.

use num_complex::Complex;

use crate::core::constants;
use crate::core::error::{Error, Result};
use crate::core::quantity::Quantity;
use crate::core::species::Species;
use crate::core::units;
use crate::epg::{duration_to_seconds, State};
use crate::operators;

/// One populated 3-D dephasing order. Orders are kept on the canonical side
/// of the order space: lexicographically non-negative, i.e. the first
/// non-zero component is positive. `f_star` stores conj(F(−k)).
#[derive(Debug, Clone)]
struct Bin {
    order: [i64; 3],
    f: Complex<f64>,
    f_star: Complex<f64>,
    z: Complex<f64>,
}

const ZERO_ORDER: [i64; 3] = [0, 0, 0];

fn translated(order: [i64; 3], delta: [i64; 3]) -> [i64; 3] {
    [order[0] + delta[0], order[1] + delta[1], order[2] + delta[2]]
}

fn negated(order: [i64; 3]) -> [i64; 3] {
    [-order[0], -order[1], -order[2]]
}

/// Discrete EPG model over 3-D dephasing orders, for sequences whose
/// gradients do not share a single axis.
///
/// The state collection is sorted by lexicographic order comparison; the
/// canonical ("positive") side of the order space is the lexicographically
/// positive one. Everything else — binning on a fixed quantum, arbitrary
/// gradient areas, threshold pruning — matches the 1-D
/// [`Discrete`](crate::Discrete) model.
#[derive(Debug, Clone)]
pub struct Discrete3D {
    species: Species,
    /// Bins in ascending lexicographic order; `bins[0]` is always the
    /// immortal k = 0 state.
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

impl Discrete3D {
    /// Builds a model with the default bin width of 1 rad/m.
    pub fn new(species: Species) -> Self {
        Self {
            species,
            bins: vec![Bin {
                order: ZERO_ORDER,
                f: Complex::ZERO,
                f_star: Complex::ZERO,
                z: Complex::ONE,
            }],
            bin_width: 1.0,
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

    /// The pruning cutoff; see [`Discrete::threshold`](crate::Discrete::threshold).
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

    /// The populated dephasing orders, ascending, as rad/m triples.
    pub fn orders(&self) -> Vec<[Quantity; 3]> {
        self.bins
            .iter()
            .map(|bin| {
                bin.order
                    .map(|component| component as f64 * self.bin_width * (units::rad / units::m))
            })
            .collect()
    }

    /// The (F⁺, F⁻*, Z) triples, in ascending order of dephasing order.
    pub fn states(&self) -> Vec<State> {
        self.bins.iter().map(|bin| [bin.f, bin.f_star, bin.z]).collect()
    }

    /// The state at a given dephasing order; the zero triple when the order
    /// holds no state.
    pub fn state(&self, order: [Quantity; 3]) -> Result<State> {
        let mut index = [0i64; 3];
        for (component, quantity) in index.iter_mut().zip(&order) {
            let k = quantity.convert_to(units::rad / units::m)?;
            *component = (k / self.bin_width).round() as i64;
        }
        Ok(match self.bins.binary_search_by_key(&index, |bin| bin.order) {
            Ok(position) => {
                let bin = &self.bins[position];
                [bin.f, bin.f_star, bin.z]
            }
            Err(_) => [Complex::ZERO; 3],
        })
    }

    /// The state at a given position in [`Discrete3D::orders`] order.
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

    /// Applies diffusion attenuation over `duration` under the 3-vector
    /// `gradient`, contracting the b-value tensors against the species
    /// diffusion tensor; no-op for a zero tensor.
    pub fn diffusion(&mut self, duration: Quantity, gradient: [Quantity; 3]) -> Result<()> {
        let tau = duration_to_seconds(duration)?;
        let g = gradient_to_si(gradient)?;
        if !self.species.has_diffusion() {
            return Ok(());
        }
        let delta_k = g.map(|component| constants::gamma.magnitude() * component * tau);
        for bin in &mut self.bins {
            let k = bin.order.map(|component| component as f64 * self.bin_width);
            let (plus, minus, longitudinal) =
                operators::diffusion(&self.species.d, tau, k, delta_k);
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

    /// Shifts the dephasing orders by the component-wise binned γ·G·τ of the
    /// gradient lobe.
    pub fn shift(&mut self, duration: Quantity, gradient: [Quantity; 3]) -> Result<()> {
        let tau = duration_to_seconds(duration)?;
        let g = gradient_to_si(gradient)?;
        let delta = g.map(|component| {
            (constants::gamma.magnitude() * component * tau / self.bin_width).round() as i64
        });
        self.translate(delta);
        Ok(())
    }

    /// Applies a full time interval: relaxation, diffusion, off-resonance
    /// phase, gradient shift, threshold pruning, in this fixed order.
    pub fn apply_time_interval(
        &mut self,
        duration: Quantity,
        gradient: [Quantity; 3],
    ) -> Result<()> {
        let tau = duration_to_seconds(duration)?;
        self.relaxation(duration)?;
        self.diffusion(duration, gradient)?;
        self.off_resonance(duration)?;
        self.shift(duration, gradient)?;
        self.prune();
        self.elapsed += tau;
        Ok(())
    }

    /// Translates the F states by `delta` bins along the 3-D order axis.
    ///
    /// The fold algebra matches the 1-D model with lexicographic comparison
    /// in place of the integer sign: translation preserves lexicographic
    /// order and negation reverses it, so every stream below is sorted and
    /// the re-fold is a linear merge.
    fn translate(&mut self, delta: [i64; 3]) {
        if delta == ZERO_ORDER {
            return;
        }
        let bins = &self.bins;
        let negated_delta = negated(delta);

        let mut shifted_f: Vec<([i64; 3], Complex<f64>)> = Vec::with_capacity(bins.len());
        let mut shifted_f_star: Vec<([i64; 3], Complex<f64>)> = Vec::with_capacity(bins.len());
        for bin in bins {
            let target = translated(bin.order, delta);
            if target >= ZERO_ORDER {
                shifted_f.push((target, bin.f));
            }
            if bin.order > ZERO_ORDER && bin.order > delta {
                shifted_f_star.push((translated(bin.order, negated_delta), bin.f_star));
            }
        }

        // States pushed across zero change side and conjugate. Source
        // orders ascend, target orders descend, hence the reversed scans.
        let mut crossed_f: Vec<([i64; 3], Complex<f64>)> = Vec::new();
        let mut crossed_f_star: Vec<([i64; 3], Complex<f64>)> = Vec::new();
        if delta > ZERO_ORDER {
            for bin in bins.iter().rev() {
                if bin.order > ZERO_ORDER && bin.order <= delta {
                    crossed_f.push((
                        translated(delta, negated(bin.order)),
                        bin.f_star.conj(),
                    ));
                }
            }
        } else {
            for bin in bins.iter().rev() {
                if translated(bin.order, delta) < ZERO_ORDER {
                    crossed_f_star.push((
                        translated(negated_delta, negated(bin.order)),
                        bin.f.conj(),
                    ));
                }
            }
        }

        let new_f = merge_disjoint(shifted_f, crossed_f);
        let new_f_star = merge_disjoint(shifted_f_star, crossed_f_star);

        let mut merged: Vec<Bin> =
            Vec::with_capacity(new_f.len().max(new_f_star.len()).max(bins.len()) + 1);
        let mut f_cursor = new_f.into_iter().peekable();
        let mut f_star_cursor = new_f_star.into_iter().peekable();
        let mut z_cursor = bins.iter().peekable();

        loop {
            let mut order: Option<[i64; 3]> = None;
            for candidate in [
                f_cursor.peek().map(|(key, _)| *key),
                f_star_cursor.peek().map(|(key, _)| *key),
                z_cursor.peek().map(|bin| bin.order),
            ]
            .into_iter()
            .flatten()
            {
                order = Some(match order {
                    Some(current) => current.min(candidate),
                    None => candidate,
                });
            }
            let Some(order) = order else {
                break;
            };

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
            if order == ZERO_ORDER {
                f_star = f.conj();
            }
            merged.push(Bin { order, f, f_star, z });
        }

        self.bins = merged;
        debug_assert_eq!(self.bins[0].order, ZERO_ORDER);
    }

    /// Drops every state whose amplitudes all lie strictly below the
    /// threshold; the k = 0 state is never dropped.
    fn prune(&mut self) {
        if self.threshold <= 0.0 {
            return;
        }
        let threshold = self.threshold;
        self.bins.retain(|bin| {
            bin.order == ZERO_ORDER
                || bin.f.norm() >= threshold
                || bin.f_star.norm() >= threshold
                || bin.z.norm() >= threshold
        });
    }
}

fn gradient_to_si(gradient: [Quantity; 3]) -> Result<[f64; 3]> {
    let mut si = [0.0; 3];
    for (component, quantity) in si.iter_mut().zip(&gradient) {
        *component = quantity.convert_to(units::T / units::m)?;
    }
    Ok(si)
}

/// Merges two key-sorted runs with disjoint keys into one sorted run.
fn merge_disjoint(
    left: Vec<([i64; 3], Complex<f64>)>,
    right: Vec<([i64; 3], Complex<f64>)>,
) -> Vec<([i64; 3], Complex<f64>)> {
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
