use core::f64::consts::PI;

use libm::{cos, fmod};

/// One term `amplitude * cos(index * theta + phase)` of a harmonic series.
/// The index is the key it is stored under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    pub amplitude: f64,
    /// Radians
    pub phase: f64,
}

impl Harmonic {
    pub fn new(amplitude: f64, phase: f64) -> Harmonic {
        Harmonic { amplitude, phase }
    }
    pub fn evaluate(self, index: u32, theta: f64) -> f64 {
        self.amplitude * cos(index as f64 * theta + self.phase)
    }
    pub fn scaled(self, factor: f64) -> Self {
        Harmonic {
            amplitude: self.amplitude * factor,
            ..self
        }
    }
    pub fn shifted(self, offset: f64) -> Self {
        Harmonic {
            phase: self.phase + offset,
            ..self
        }
    }
}

/// Wraps an angle into [0, 2PI)
pub fn wrap_angle(theta: f64) -> f64 {
    let wrapped = fmod(theta, PI * 2.);
    // fmod keeps the sign of the dividend
    if wrapped < 0. {
        wrapped + PI * 2.
    } else {
        wrapped
    }
}
