use criterion::{Criterion, criterion_group, criterion_main};

use epgsim::{Discrete, Discrete3D, Regular, Species, units::*};

/// A RARE echo train: one excitation, then refocusing pulses with a
/// dephasing interval on each side of every echo.
const TRAIN_LENGTH: usize = 64;

fn species() -> Species {
    Species::new(1000.0 * ms, 100.0 * ms)
        .unwrap()
        .with_diffusion(3.0 * um * um / ms)
        .unwrap()
}

fn echo_trains(c: &mut Criterion) {
    let mut group = c.benchmark_group("RARE echo train");

    group.bench_function("Regular", |b| {
        b.iter(|| {
            let mut model = Regular::new(species());
            model.apply_pulse(90.0 * deg, 0.0 * deg).unwrap();
            for _ in 0..TRAIN_LENGTH {
                model.apply_time_interval(2.0 * ms, 0.0 * mT / m).unwrap();
                model.apply_pulse(180.0 * deg, 0.0 * deg).unwrap();
                model.apply_time_interval(2.0 * ms, 0.0 * mT / m).unwrap();
            }
            model.echo()
        })
    });

    group.bench_function("Discrete", |b| {
        b.iter(|| {
            let mut model = Discrete::new(species());
            model.apply_pulse(90.0 * deg, 0.0 * deg).unwrap();
            for _ in 0..TRAIN_LENGTH {
                model.apply_time_interval(2.0 * ms, 2.0 * mT / m).unwrap();
                model.apply_pulse(180.0 * deg, 0.0 * deg).unwrap();
                model.apply_time_interval(2.0 * ms, 2.0 * mT / m).unwrap();
            }
            model.echo()
        })
    });

    group.bench_function("Discrete with pruning", |b| {
        b.iter(|| {
            let mut model = Discrete::new(species());
            model.set_threshold(1e-6).unwrap();
            model.apply_pulse(90.0 * deg, 0.0 * deg).unwrap();
            for _ in 0..TRAIN_LENGTH {
                model.apply_time_interval(2.0 * ms, 2.0 * mT / m).unwrap();
                model.apply_pulse(180.0 * deg, 0.0 * deg).unwrap();
                model.apply_time_interval(2.0 * ms, 2.0 * mT / m).unwrap();
            }
            model.echo()
        })
    });

    group.bench_function("Discrete3D", |b| {
        let gradient = [2.0 * mT / m, 0.0 * mT / m, 0.0 * mT / m];
        b.iter(|| {
            let mut model = Discrete3D::new(species());
            model.apply_pulse(90.0 * deg, 0.0 * deg).unwrap();
            for _ in 0..TRAIN_LENGTH {
                model.apply_time_interval(2.0 * ms, gradient).unwrap();
                model.apply_pulse(180.0 * deg, 0.0 * deg).unwrap();
                model.apply_time_interval(2.0 * ms, gradient).unwrap();
            }
            model.echo()
        })
    });

    group.finish();
}

criterion_group!(benches, echo_trains);
criterion_main!(benches);
