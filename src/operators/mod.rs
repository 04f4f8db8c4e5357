//! Elementary EPG operators.
//!
//! Each function builds the value of one operator from raw SI magnitudes —
//! angles in radians, durations in seconds, dephasing in rad/m, diffusion in
//! m²/s, frequencies in Hz. The models perform unit conversion at their API
//! boundary and call these with plain floats; they are exposed for users
//! assembling custom propagators.
//!
//! None of the functions memoize: a pulse matrix is built once per pulse
//! event, and callers repeating the same (α, φ) may cache the result
//! themselves.

use num_complex::Complex;

/// Builds the pulse rotation T(α, φ) mixing the (F⁺, F⁻*, Z) components of
/// every configuration state.
///
/// T is unitary for all angles and phases; applying T(−α, φ) undoes
/// T(α, φ).
pub fn pulse(angle: f64, phase: f64) -> [[Complex<f64>; 3]; 3] {
    let i = Complex::<f64>::i();
    let (sin_a, cos_a) = angle.sin_cos();
    let sin2_half = (angle / 2.0).sin().powi(2);
    let cos2_half = (angle / 2.0).cos().powi(2);
    let e_phase = Complex::from_polar(1.0, phase);
    let e_2phase = Complex::from_polar(1.0, 2.0 * phase);

    [
        [
            cos2_half.into(),
            e_2phase * sin2_half,
            -i * e_phase * sin_a,
        ],
        [
            e_2phase.conj() * sin2_half,
            cos2_half.into(),
            i * e_phase.conj() * sin_a,
        ],
        [
            -0.5 * i * e_phase.conj() * sin_a,
            0.5 * i * e_phase * sin_a,
            cos_a.into(),
        ],
    ]
}

/// Applies a 3×3 complex matrix to one (F⁺, F⁻*, Z) triple.
pub fn apply(matrix: &[[Complex<f64>; 3]; 3], state: &mut [Complex<f64>; 3]) {
    let input = *state;
    for (row, output) in matrix.iter().zip(state.iter_mut()) {
        *output = row[0] * input[0] + row[1] * input[1] + row[2] * input[2];
    }
}

/// Relaxation attenuations over `duration`: (E₁, E₂) = (e^(−τ·R1), e^(−τ·R2)).
///
/// E₂ attenuates both transverse rows, E₁ the longitudinal row; the caller
/// adds the longitudinal recovery (1 − E₁)·M0 to the k = 0 state only.
pub fn relaxation(r1: f64, r2: f64, duration: f64) -> (f64, f64) {
    ((-duration * r1).exp(), (-duration * r2).exp())
}

/// Diffusion attenuations for a state at dephasing `k` subject to a
/// gradient-driven increment `delta_k` over `duration`, against the
/// diffusion tensor `d`.
///
/// Returns the factors for (F⁺, F⁻*, Z). The b-value tensors are
///
/// - b⁺ᵢⱼ = τ·((kᵢ + Δkᵢ/2)(kⱼ + Δkⱼ/2) + ΔkᵢΔkⱼ/12), contracted with D,
/// - b⁻ᵢⱼ the same with −k (F⁻*(k) stores F(−k)*, so its b-value runs from
///   the opposite order — the asymmetry is load-bearing),
/// - bᴸᵢⱼ = τ·kᵢkⱼ.
pub fn diffusion(
    d: &[[f64; 3]; 3],
    duration: f64,
    k: [f64; 3],
    delta_k: [f64; 3],
) -> (f64, f64, f64) {
    let mut b_plus = 0.0;
    let mut b_minus = 0.0;
    let mut b_longitudinal = 0.0;
    for i in 0..3 {
        for j in 0..3 {
            if d[i][j] == 0.0 {
                continue;
            }
            let cross = delta_k[i] * delta_k[j] / 12.0;
            b_plus += d[i][j]
                * ((k[i] + delta_k[i] / 2.0) * (k[j] + delta_k[j] / 2.0) + cross);
            b_minus += d[i][j]
                * ((-k[i] + delta_k[i] / 2.0) * (-k[j] + delta_k[j] / 2.0) + cross);
            b_longitudinal += d[i][j] * k[i] * k[j];
        }
    }
    (
        (-duration * b_plus).exp(),
        (-duration * b_minus).exp(),
        (-duration * b_longitudinal).exp(),
    )
}

/// Off-resonance phase factor e^(2πi·Δf·τ) for a cyclic frequency offset.
///
/// F⁺ states are multiplied by the factor, F⁻* states by its conjugate, and
/// Z is invariant.
pub fn phase(delta_f: f64, duration: f64) -> Complex<f64> {
    Complex::from_polar(1.0, 2.0 * std::f64::consts::PI * delta_f * duration)
}

/// Closed-form matrix exponential e^(τ·A) of a real 2×2 matrix with real
/// eigenvalues.
///
/// The two-pool exchange-relaxation block [[−R1a−ka, kb], [ka, −R1b−kb]] has
/// non-negative off-diagonal entries, so its discriminant is non-negative
/// and the eigen-decomposition stays real. Near-degenerate eigenvalues fall
/// back to the first-order expansion around the mean eigenvalue.
pub fn expm_2x2(a: [[f64; 2]; 2], tau: f64) -> [[f64; 2]; 2] {
    let trace = a[0][0] + a[1][1];
    let discriminant =
        ((a[0][0] - a[1][1]).powi(2) + 4.0 * a[0][1] * a[1][0]).max(0.0).sqrt();

    if discriminant <= 1e-12 * (1.0 + trace.abs()) {
        let lambda = 0.5 * trace;
        let scale = (tau * lambda).exp();
        return [
            [
                scale * (1.0 + tau * (a[0][0] - lambda)),
                scale * tau * a[0][1],
            ],
            [
                scale * tau * a[1][0],
                scale * (1.0 + tau * (a[1][1] - lambda)),
            ],
        ];
    }

    let lambda_plus = 0.5 * (trace + discriminant);
    let lambda_minus = 0.5 * (trace - discriminant);
    let exp_plus = (tau * lambda_plus).exp();
    let exp_minus = (tau * lambda_minus).exp();
    // e^(τA) = c₁·A + c₀·I from the two eigen-projections.
    let c1 = (exp_plus - exp_minus) / discriminant;
    let c0 = (lambda_plus * exp_minus - lambda_minus * exp_plus) / discriminant;
    [
        [c0 + c1 * a[0][0], c1 * a[0][1]],
        [c1 * a[1][0], c0 + c1 * a[1][1]],
    ]
}
