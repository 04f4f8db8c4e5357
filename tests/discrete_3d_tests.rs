// tests/discrete_3d_tests.rs

use epgsim::{Discrete3D, Species, State, units::*};
use num_complex::Complex;

fn species() -> Species {
    Species::new(1000.0 * ms, 100.0 * ms)
        .unwrap()
        .with_diffusion(3.0 * um * um / ms)
        .unwrap()
}

fn c(re: f64, im: f64) -> Complex<f64> {
    Complex::new(re, im)
}

fn r(re: f64) -> Complex<f64> {
    Complex::new(re, 0.0)
}

const ZERO: Complex<f64> = Complex::ZERO;

fn gradient(x: f64, y: f64, z: f64) -> [epgsim::Quantity; 3] {
    [x * mT / m, y * mT / m, z * mT / m]
}

/// Checks the populated orders (rad/m triples, in the model's ascending
/// lexicographic order) and their states.
fn check_model(model: &Discrete3D, orders: &[[f64; 3]], states: &[State]) {
    assert_eq!(model.len(), orders.len());
    let model_orders = model.orders();
    for (expected, actual) in orders.iter().zip(&model_orders) {
        for (component, value) in actual.iter().zip(expected) {
            assert_eq!(*component, *value * rad / m, "order mismatch");
        }
    }

    for (index, (order, expected)) in orders.iter().zip(states).enumerate() {
        let by_index = model.state_at(index).unwrap();
        let by_order = model
            .state(order.map(|component| component * rad / m))
            .unwrap();
        for component in 0..3 {
            assert!(
                (by_index[component] - expected[component]).norm() < 1e-9,
                "state {index} component {component}: {} vs {}",
                by_index[component],
                expected[component],
            );
            assert_eq!(by_index[component], by_order[component]);
        }
    }

    assert_eq!(model.echo(), model.state_at(0).unwrap()[0]);
}

#[test]
fn empty() {
    let model = Discrete3D::new(species());
    check_model(&model, &[[0.0; 3]], &[[ZERO, ZERO, r(1.0)]]);
}

#[test]
fn pulse() {
    let mut model = Discrete3D::new(species());
    model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
    check_model(
        &model,
        &[[0.0; 3]],
        &[[
            c(0.2857626571584661, -0.6732146319308543),
            c(0.2857626571584661, 0.6732146319308543),
            r(0.6819983600624985),
        ]],
    );
}

#[test]
fn positive_gradients_per_axis() {
    for axis in 0..3 {
        let mut model = Discrete3D::new(species());
        model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
        let mut g = [0.0; 3];
        g[axis] = 2.0;
        model
            .shift(10.0 * ms, gradient(g[0], g[1], g[2]))
            .unwrap();

        let mut order = [0.0; 3];
        order[axis] = 5350.0;
        check_model(
            &model,
            &[[0.0; 3], order],
            &[
                [ZERO, ZERO, r(0.6819983600624985)],
                [c(0.2857626571584661, -0.6732146319308543), ZERO, ZERO],
            ],
        );
    }
}

#[test]
fn negative_gradients_per_axis() {
    for axis in 0..3 {
        let mut model = Discrete3D::new(species());
        model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
        let mut g = [0.0; 3];
        g[axis] = -2.0;
        model
            .shift(10.0 * ms, gradient(g[0], g[1], g[2]))
            .unwrap();

        // The canonical order is the lexicographically positive one; the
        // amplitude lands in the conjugate row.
        let mut order = [0.0; 3];
        order[axis] = 5350.0;
        check_model(
            &model,
            &[[0.0; 3], order],
            &[
                [ZERO, ZERO, r(0.6819983600624985)],
                [ZERO, c(0.2857626571584661, 0.6732146319308543), ZERO],
            ],
        );
    }
}

#[test]
fn multiple_gradients() {
    let mut model = Discrete3D::new(species());
    model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
    model.shift(10.0 * ms, gradient(-2.0, 2.0, -2.0)).unwrap();
    model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
    model.shift(10.0 * ms, gradient(1.0, -3.0, 3.0)).unwrap();

    // Ascending lexicographic order.
    check_model(
        &model,
        &[
            [0.0, 0.0, 0.0],
            [2675.0, -8026.0, 8026.0],
            [2675.0, 2676.0, -2676.0],
            [5350.0, -5350.0, 5350.0],
            [8025.0, -13376.0, 13376.0],
        ],
        &[
            [ZERO, ZERO, r(0.4651217631279373)],
            [c(0.19488966354917586, -0.45913127494692113), ZERO, ZERO],
            [ZERO, c(0.240326160353821, 0.5661729534388877), ZERO],
            [ZERO, ZERO, r(-0.26743911843603135)],
            [c(-0.045436496804645087, 0.10704167849196657), ZERO, ZERO],
        ],
    );
}

#[test]
fn relaxation() {
    let mut model = Discrete3D::new(species());
    model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
    model.shift(10.0 * ms, gradient(2.0, 0.0, 0.0)).unwrap();
    model.relaxation(10.0 * ms).unwrap();
    check_model(
        &model,
        &[[0.0; 3], [5350.0, 0.0, 0.0]],
        &[
            [ZERO, ZERO, r(0.6851625292479138)],
            [c(0.2585687448743616, -0.6091497893403431), ZERO, ZERO],
        ],
    );
}

#[test]
fn diffusion_along_x_and_z() {
    for axis in [0, 2] {
        let mut model = Discrete3D::new(species());
        model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
        let mut g = [0.0; 3];
        g[axis] = 2.0;
        let lobe = gradient(g[0], g[1], g[2]);
        model.shift(10.0 * ms, lobe).unwrap();
        model.relaxation(10.0 * ms).unwrap();
        model.diffusion(10.0 * ms, lobe).unwrap();

        let mut order = [0.0; 3];
        order[axis] = 5350.0;
        check_model(
            &model,
            &[[0.0; 3], order],
            &[
                [ZERO, ZERO, r(0.6851625292479138)],
                [c(0.25805117100742553, -0.6079304617214332), ZERO, ZERO],
            ],
        );
    }
}

#[test]
fn off_resonance() {
    let mut model = Discrete3D::new(species());
    model.set_delta_omega(10.0 * Hz).unwrap();
    model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
    model.shift(10.0 * ms, gradient(2.0, 0.0, 0.0)).unwrap();
    model.off_resonance(10.0 * ms).unwrap();
    check_model(
        &model,
        &[[0.0; 3], [5350.0, 0.0, 0.0]],
        &[
            [ZERO, ZERO, r(0.6819983600624985)],
            [c(0.6268924782754024, -0.37667500256027975), ZERO, ZERO],
        ],
    );
}

#[test]
fn time_interval() {
    for axis in [0, 2] {
        let mut model = Discrete3D::new(species());
        model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
        let mut g = [0.0; 3];
        g[axis] = 2.0;
        model
            .apply_time_interval(10.0 * ms, gradient(g[0], g[1], g[2]))
            .unwrap();

        let mut order = [0.0; 3];
        order[axis] = 5350.0;
        check_model(
            &model,
            &[[0.0; 3], order],
            &[
                [ZERO, ZERO, r(0.6851625292479138)],
                [c(0.2584947343504123, -0.6089754314724013), ZERO, ZERO],
            ],
        );
        assert_eq!(model.elapsed(), 10.0 * ms);
    }
}

#[test]
fn time_interval_off_resonances() {
    // Field offset alone.
    let mut model = Discrete3D::new(species());
    model.set_delta_omega(10.0 * Hz).unwrap();
    model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
    model
        .apply_time_interval(10.0 * ms, gradient(2.0, 0.0, 0.0))
        .unwrap();
    check_model(
        &model,
        &[[0.0; 3], [5350.0, 0.0, 0.0]],
        &[
            [ZERO, ZERO, r(0.6851625292479138)],
            [c(0.56707341067384409, -0.34073208057155585), ZERO, ZERO],
        ],
    );

    // Species offset alone gives the same evolution.
    let species = Species::new(1.0 * Hz, 10.0 * Hz)
        .unwrap()
        .with_diffusion(3.0 * um * um / ms)
        .unwrap()
        .with_delta_omega(10.0 * Hz)
        .unwrap();
    let mut model = Discrete3D::new(species.clone());
    model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
    model
        .apply_time_interval(10.0 * ms, gradient(2.0, 0.0, 0.0))
        .unwrap();
    check_model(
        &model,
        &[[0.0; 3], [5350.0, 0.0, 0.0]],
        &[
            [ZERO, ZERO, r(0.6851625292479138)],
            [c(0.56707341067384409, -0.34073208057155585), ZERO, ZERO],
        ],
    );

    // Opposite field and species offsets cancel.
    let mut model = Discrete3D::new(species);
    model.set_delta_omega(-10.0 * Hz).unwrap();
    model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
    model
        .apply_time_interval(10.0 * ms, gradient(2.0, 0.0, 0.0))
        .unwrap();
    check_model(
        &model,
        &[[0.0; 3], [5350.0, 0.0, 0.0]],
        &[
            [ZERO, ZERO, r(0.6851625292479138)],
            [c(0.2584947343504123, -0.6089754314724013), ZERO, ZERO],
        ],
    );
}

#[test]
fn refocusing() {
    let mut model = Discrete3D::new(species());
    model.apply_pulse(90.0 * deg, 30.0 * deg).unwrap();
    model
        .apply_time_interval(10.0 * ms, gradient(2.0, 0.0, 0.0))
        .unwrap();
    model.apply_pulse(120.0 * deg, 0.0 * deg).unwrap();
    model
        .apply_time_interval(10.0 * ms, gradient(2.0, 0.0, 0.0))
        .unwrap();
    check_model(
        &model,
        &[[0.0; 3], [5350.0, 0.0, 0.0], [10700.0, 0.0, 0.0]],
        &[
            [
                c(0.30684831950624042, 0.53147687960193668),
                c(0.30684831950624042, -0.53147687960193668),
                r(0.0050245860296255166),
            ],
            [
                c(0.0, -0.0077948398021822725),
                ZERO,
                c(-0.33555338970217136, -0.19373183987203996),
            ],
            [c(0.10210725404661349, -0.17685495183007738), ZERO, ZERO],
        ],
    );
}

#[test]
fn absent_order_reads_as_zero() {
    let mut model = Discrete3D::new(species());
    model.apply_pulse(47.0 * deg, 23.0 * deg).unwrap();
    model.shift(10.0 * ms, gradient(2.0, 0.0, 0.0)).unwrap();
    let absent = [12.0 * rad / m, 34.0 * rad / m, 56.0 * rad / m];
    assert_eq!(model.state(absent).unwrap(), [ZERO, ZERO, ZERO]);
    assert!(model.state([1.0 * ms, 0.0 * ms, 0.0 * ms]).is_err());
}

#[test]
fn threshold_keeps_origin() {
    let mut model = Discrete3D::new(species());
    model.set_threshold(1e-2).unwrap();
    model.apply_pulse(90.0 * deg, 0.0 * deg).unwrap();
    for _ in 0..20 {
        model
            .apply_time_interval(20.0 * ms, gradient(5.0, -3.0, 1.0))
            .unwrap();
        model.apply_pulse(10.0 * deg, 0.0 * deg).unwrap();
    }
    for component in model.orders()[0] {
        assert_eq!(component, 0.0 * rad / m);
    }
    // Pruning keeps the state count bounded where the unpruned model would
    // grow combinatorially.
    assert!(model.len() < 50_000);
}
