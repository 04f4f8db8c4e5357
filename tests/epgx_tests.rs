// tests/epgx_tests.rs
//
// Two-pool (exchange and magnetization-transfer) variants of the Regular
// model.

use epgsim::{
    Regular, Species,
    units::{Hz, deg, mT, ms, one},
};
use float_cmp::assert_approx_eq;
use num_complex::Complex;

fn free_pool() -> Species {
    Species::new(1000.0 * ms, 100.0 * ms).unwrap()
}

fn second_pool() -> Species {
    Species::new(500.0 * ms, 20.0 * ms).unwrap()
}

fn exchange_model() -> Regular {
    Regular::with_exchange(free_pool(), second_pool(), 0.8, 0.2, 2.0 * Hz, 0.0 * Hz).unwrap()
}

fn assert_complex(actual: Complex<f64>, re: f64, im: f64) {
    assert_approx_eq!(f64, actual.re, re, epsilon = 1e-12);
    assert_approx_eq!(f64, actual.im, im, epsilon = 1e-12);
}

#[test]
fn pulse_rotates_both_pools() {
    let mut model = exchange_model();
    assert_eq!(model.pools(), 2);
    model.apply_pulse(45.0 * deg, 0.0 * deg).unwrap();

    let pool_a = model.pool_states(0).unwrap();
    let pool_b = model.pool_states(1).unwrap();
    assert_complex(pool_a[0][0], 0.0, -0.565685424949238);
    assert_complex(pool_a[0][2], 0.5656854249492381, 0.0);
    assert_complex(pool_b[0][0], 0.0, -0.1414213562373095);
    assert_complex(pool_b[0][2], 0.14142135623730953, 0.0);

    assert!(model.pool_states(2).is_err());
}

#[test]
fn coupled_relaxation() {
    let mut model = exchange_model();
    model.apply_pulse(45.0 * deg, 0.0 * deg).unwrap();
    model.relaxation(5.0 * ms).unwrap();

    let pool_a = model.pool_states(0).unwrap();
    let pool_b = model.pool_states(1).unwrap();
    // Closed-form exponential of the coupled relaxation-exchange block.
    assert_complex(pool_a[0][0], 0.0, -0.5380966212229056);
    assert_complex(pool_a[0][2], 0.5668402566945007, 0.0);
    assert_complex(pool_b[0][0], 0.0, -0.11013906298063675);
    assert_complex(pool_b[0][2], 0.14201801745007253, 0.0);
}

#[test]
fn pure_exchange_conserves_longitudinal_magnetization() {
    let species_a = Species::new(0.0 * Hz, 0.0 * Hz).unwrap();
    let species_b = Species::new(0.0 * Hz, 0.0 * Hz).unwrap();
    let mut model =
        Regular::with_exchange(species_a, species_b, 0.7, 0.3, 5.0 * Hz, 0.0 * Hz).unwrap();
    model.apply_pulse(30.0 * deg, 10.0 * deg).unwrap();

    let total = |model: &Regular| {
        model.pool_states(0).unwrap()[0][2] + model.pool_states(1).unwrap()[0][2]
    };
    let before = total(&model);
    for _ in 0..20 {
        model.relaxation(10.0 * ms).unwrap();
    }
    let after = total(&model);
    assert_approx_eq!(f64, before.re, after.re, epsilon = 1e-12);
    assert_approx_eq!(f64, before.im, after.im, epsilon = 1e-12);
}

#[test]
fn exchange_moves_magnetization_towards_the_depleted_pool() {
    // Pool b starts saturated; with pure exchange it refills from pool a.
    let species = Species::new(0.0 * Hz, 0.0 * Hz).unwrap();
    let mut model =
        Regular::with_exchange(species.clone(), species, 1.0, 0.0, 10.0 * Hz, 0.0 * Hz)
            .unwrap();
    model.relaxation(100.0 * ms).unwrap();
    let pool_a = model.pool_states(0).unwrap();
    let pool_b = model.pool_states(1).unwrap();
    assert!(pool_a[0][2].re < 1.0);
    assert!(pool_b[0][2].re > 0.0);
}

#[test]
fn decoupled_pools_match_the_single_pool_model() {
    let mut coupled =
        Regular::with_exchange(free_pool(), second_pool(), 1.0, 0.0, 0.0 * Hz, 0.0 * Hz)
            .unwrap();
    let mut single = Regular::new(free_pool());

    for model in [&mut coupled, &mut single] {
        model.apply_pulse(60.0 * deg, 15.0 * deg).unwrap();
        model.apply_time_interval(5.0 * ms, 0.0 * mT / epgsim::units::m).unwrap();
        model.apply_pulse(120.0 * deg, 0.0 * deg).unwrap();
        model.apply_time_interval(5.0 * ms, 0.0 * mT / epgsim::units::m).unwrap();
    }

    assert_eq!(coupled.len(), single.len());
    for (coupled_state, single_state) in coupled.states().iter().zip(single.states()) {
        for component in 0..3 {
            assert!((coupled_state[component] - single_state[component]).norm() < 1e-12);
        }
    }
}

#[test]
fn pool_b_frequency_offset() {
    let species = Species::new(0.0 * Hz, 0.0 * Hz).unwrap();
    let mut model =
        Regular::with_exchange(species.clone(), species, 0.5, 0.5, 0.0 * Hz, 100.0 * Hz)
            .unwrap();
    model.apply_pulse(90.0 * deg, 0.0 * deg).unwrap();
    let reference_a = model.pool_states(0).unwrap()[0][0];
    let reference_b = model.pool_states(1).unwrap()[0][0];
    model.off_resonance(2.5 * ms).unwrap();

    // Pool a is on resonance, pool b accrues 2π·100 Hz·2.5 ms = π/2.
    let pool_a = model.pool_states(0).unwrap()[0][0];
    let pool_b = model.pool_states(1).unwrap()[0][0];
    assert!((pool_a - reference_a).norm() < 1e-12);
    let rotated = reference_b * Complex::i();
    assert!((pool_b - rotated).norm() < 1e-12);
}

#[test]
fn saturated_pulse_attenuates_the_bound_pool() {
    let r1 = 1.0 / (779.0 * 1e-3);
    let mut model = Regular::with_magnetization_transfer(
        Species::new(779.0 * ms, 45.0 * ms).unwrap(),
        r1 * Hz,
        0.883,
        0.117,
        4.3 * Hz,
    )
    .unwrap();

    model
        .apply_saturated_pulse(10.0 * deg, 0.0 * deg, 0.5 * one)
        .unwrap();
    let pool_a = model.pool_states(0).unwrap();
    let pool_b = model.pool_states(1).unwrap();
    // The free pool rotates, the bound pool only saturates: no transverse
    // magnetization, Z scaled by e^(−W·τ).
    assert_complex(pool_a[0][2], 0.8695852459097797, 0.0);
    assert_complex(pool_b[0][0], 0.0, 0.0);
    assert_complex(pool_b[0][2], 0.07096408718637812, 0.0);

    model.relaxation(5.0 * ms).unwrap();
    let pool_a = model.pool_states(0).unwrap();
    let pool_b = model.pool_states(1).unwrap();
    assert_complex(pool_a[0][2], 0.8631528460589384, 0.0);
    assert_complex(pool_b[0][2], 0.07777684828775515, 0.0);
}

#[test]
fn saturation_requires_a_transfer_model() {
    let mut single = Regular::new(free_pool());
    assert!(
        single
            .apply_saturated_pulse(10.0 * deg, 0.0 * deg, 0.5 * one)
            .is_err()
    );

    let mut exchange = exchange_model();
    assert!(
        exchange
            .apply_saturated_pulse(10.0 * deg, 0.0 * deg, 0.5 * one)
            .is_err()
    );

    let mut transfer = Regular::with_magnetization_transfer(
        free_pool(),
        1.0 * Hz,
        0.9,
        0.1,
        4.0 * Hz,
    )
    .unwrap();
    // The saturation is a bare W·τ factor: negative values and quantities
    // carrying a dimension are both rejected.
    assert!(
        transfer
            .apply_saturated_pulse(10.0 * deg, 0.0 * deg, -0.5 * one)
            .is_err()
    );
    assert!(
        transfer
            .apply_saturated_pulse(10.0 * deg, 0.0 * deg, 0.5 * ms)
            .is_err()
    );
}

#[test]
fn invalid_pool_parameters() {
    assert!(
        Regular::with_exchange(free_pool(), second_pool(), 1.5, 0.2, 2.0 * Hz, 0.0 * Hz)
            .is_err()
    );
    assert!(
        Regular::with_exchange(free_pool(), second_pool(), 0.8, 0.2, -2.0 * Hz, 0.0 * Hz)
            .is_err()
    );
    assert!(
        Regular::with_exchange(free_pool(), second_pool(), 0.8, 0.2, 2.0 * ms, 0.0 * Hz)
            .is_err()
    );
}
