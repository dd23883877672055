//! Shared assertions for waveform-shaped functions
use core::f64::consts::PI;

use libm::fabs;

use crate::phases::PhaseValues;

/// Sample spacing, radians
pub const EPSILON: f64 = PI / 500.;

pub fn init_logs() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// One revolution of sample angles, offset by half a step so none of them
/// land on a multiple of 60 degrees
pub fn thetas() -> Vec<f64> {
    (0..1000).map(|i| i as f64 * EPSILON + EPSILON / 2.).collect()
}

pub fn f_close<A, B>(a: A, b: B, offset: f64, tolerance: f64) -> bool
where
    A: Fn(f64) -> f64,
    B: Fn(f64) -> f64,
{
    thetas()
        .into_iter()
        .all(|theta| fabs(a(theta) - b(theta + offset)) <= tolerance)
}

pub fn assert_f_close<A: Fn(f64) -> f64, B: Fn(f64) -> f64>(a: A, b: B, offset: f64) {
    assert!(
        f_close(a, b, offset, EPSILON / 100.),
        "functions differ at offset {}",
        offset
    );
}

/// Periodic with period 2PI, odd symmetric about PI and averaging zero
/// around 0, PI and 2PI
pub fn assert_periodic_symmetric<F: Fn(f64) -> f64>(f: F) {
    assert_f_close(&f, &f, PI * 2.);
    assert_f_close(&f, &f, PI * 4.);
    assert_f_close(&f, |t| -f(PI * 2. - t), 0.);
    for point in [0., PI, PI * 2.] {
        let before = f(point - EPSILON);
        let after = f(point + EPSILON);
        assert!(
            fabs((before + after) / 2.) < 1e-7,
            "not centered around {}",
            point
        );
    }
}

/// Whether `a` equals `b` rotated by some multiple of 30 degrees
pub fn equal_rotated<A: Fn(f64) -> f64, B: Fn(f64) -> f64>(a: A, b: B) -> bool {
    (0..12).any(|k| f_close(&a, &b, PI / 6. * k as f64, EPSILON))
}

pub fn assert_continuous<F: Fn(f64) -> f64>(f: F) {
    let max_slope = 5.;
    for offset in [1., 0.9, 1.1, 1.9, 2., 2.1] {
        assert!(f_close(&f, &f, offset * EPSILON, EPSILON * max_slope));
    }
}

/// Asserts `f * g` summed over the three phases is constant over a
/// revolution
pub fn assert_constant_torque<F: Fn(f64) -> f64, G: Fn(f64) -> f64>(f: F, g: G) {
    let all_three = |theta: f64| PhaseValues::angles(theta).map(|t| f(t) * g(t)).sum();
    let zero = all_three(0.);
    assert_f_close(|theta| all_three(theta) - zero, |_| 0., 0.);
}
