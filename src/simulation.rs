//! Steady-state simulation of motors and the calculus over one electrical
//! revolution that it is built on.
//!
//! A motor's torque is `3 * average(f * g)` where `f` is the phase flux
//! linkage (derivative) and `g` the phase current. At a steady operating
//! point the phase voltage is `g * R + dg/dtheta * L * omega + f * omega`,
//! and the largest line-to-line difference of it has to stay under the bus
//! voltage. PWM switching is ignored: at steady state, with switching much
//! faster than the rotation, any shape can be produced and a maximum duty
//! cycle is just a lower bus voltage.
use core::{f64::consts::PI, fmt};

use libm::sqrt;

use crate::error::{Error, Result};
use crate::motor::Motor;
use crate::numeric::{integrate, minimize_bounded, Tolerance};
use crate::phases::PhaseValues;

/// Step used by [`differentiate`], radians
pub const DIFFERENTIATION_STEP: f64 = PI * 2. / 10000.;
/// Number of windows [`max_circle`] searches
pub const MAX_CIRCLE_SAMPLES: usize = 200;
/// Pieces [`average_circle`] integrates separately. Commutation waveforms
/// only jump on multiples of 30 degrees, which are all piece boundaries.
const AVERAGE_SEGMENTS: usize = 12;

/// Mean of `f` over one revolution
pub fn average_circle<F: Fn(f64) -> f64>(f: F) -> Result<f64> {
    let width = PI * 2. / AVERAGE_SEGMENTS as f64;
    let tolerance = Tolerance::default();
    let mut total = 0.;
    for i in 0..AVERAGE_SEGMENTS {
        let lower = width * i as f64;
        total += integrate(&f, lower, lower + width, &tolerance)?;
    }
    Ok(total / (PI * 2.))
}

pub fn rms_circle<F: Fn(f64) -> f64>(f: F) -> Result<f64> {
    let mean_square = average_circle(|theta| {
        let value = f(theta);
        value * value
    })?;
    Ok(sqrt(mean_square))
}

/// Maximum of `f` over one revolution.
///
/// `f` may have several sharp local maxima, so instead of one global search
/// the circle is split into [`MAX_CIRCLE_SAMPLES`] windows, each searched
/// locally. Windows where the local search fails are skipped.
pub fn max_circle<F: Fn(f64) -> f64>(f: F) -> Result<f64> {
    let n = MAX_CIRCLE_SAMPLES;
    // Windows are centered on the samples and must touch their neighbours
    let spacing = PI * 2. / (n - 1) as f64;
    let half_window = spacing / 2.;

    let mut best: Option<(f64, f64)> = None;
    for i in 0..n {
        let theta = spacing * i as f64;
        match minimize_bounded(
            |t| -f(t),
            theta - half_window,
            theta + half_window,
            1e-10,
            500,
        ) {
            Ok(minimum) => {
                if best.map_or(true, |(_, value)| -minimum.value > value) {
                    best = Some((minimum.x, -minimum.value));
                }
            }
            Err(e) => log::debug!("Skipping window at {}: {}", theta, e),
        }
    }

    match best {
        Some((theta, _)) => Ok(f(theta)),
        None => {
            log::error!("No window of the circle produced a maximum");
            Err(Error::NoConvergence {
                routine: "max_circle",
            })
        }
    }
}

/// First derivative of `f` at `theta` by central difference.
///
/// `f` must be a function of an angle for [`DIFFERENTIATION_STEP`] to be a
/// sensible scale.
pub fn differentiate<F: Fn(f64) -> f64>(f: F, theta: f64) -> f64 {
    let epsilon = DIFFERENTIATION_STEP;
    (f(theta + epsilon) - f(theta - epsilon)) / (epsilon * 2.)
}

/// One derivative of `f` per angle in `thetas`
pub fn differentiate_each<F: Fn(f64) -> f64, const N: usize>(
    f: F,
    thetas: [f64; N],
) -> [f64; N] {
    thetas.map(|theta| differentiate(&f, theta))
}

/// Derivative of `f` for each of the three phases when phase `u` is at `theta`
pub fn differentiate_phases<F: Fn(f64) -> f64>(f: F, theta: f64) -> PhaseValues {
    let PhaseValues { u, v, w } = PhaseValues::angles(theta);
    differentiate_each(f, [u, v, w]).into()
}

/// `f(theta) + f(theta + 2pi/3) + f(theta - 2pi/3)`
pub fn three_phase_sum<F: Fn(f64) -> f64>(f: F, theta: f64) -> f64 {
    PhaseValues::angles(theta).map(f).sum()
}

/// The kinds of limit an operating point can be bounded by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limit {
    Torque,
    MotorCurrent,
    InputPower,
    Voltage,
}

impl Limit {
    pub fn name(self) -> &'static str {
        match self {
            Limit::Torque => "torque",
            Limit::MotorCurrent => "motor current",
            Limit::InputPower => "input power",
            Limit::Voltage => "voltage",
        }
    }
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Upper bounds on an operating point. At least one has to be given for a
/// query to be solvable.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Limits {
    /// Average torque across all phases, newton meters
    pub max_torque: Option<f64>,
    /// RMS current in one phase, amps
    pub max_motor_current: Option<f64>,
    /// Power drawn from the supply, watts
    pub max_input_power: Option<f64>,
    /// Bus voltage, volts
    pub max_voltage: Option<f64>,
    // Block construction
    _private: (),
}

impl Limits {
    pub fn new(
        max_torque: Option<f64>,
        max_motor_current: Option<f64>,
        max_input_power: Option<f64>,
        max_voltage: Option<f64>,
    ) -> Result<Self> {
        for (name, limit) in [
            ("torque limit", max_torque),
            ("motor current limit", max_motor_current),
            ("input power limit", max_input_power),
            ("voltage limit", max_voltage),
        ] {
            if let Some(value) = limit {
                if !(value >= 0.) {
                    log::error!("Invalid {}: {}", name, value);
                    return Err(Error::InvalidParameter { name, value });
                }
            }
        }

        Ok(Limits {
            max_torque,
            max_motor_current,
            max_input_power,
            max_voltage,
            _private: (),
        })
    }

    pub fn torque(max_torque: f64) -> Result<Self> {
        Limits::new(Some(max_torque), None, None, None)
    }

    pub fn motor_current(max_motor_current: f64) -> Result<Self> {
        Limits::new(None, Some(max_motor_current), None, None)
    }

    pub fn input_power(max_input_power: f64) -> Result<Self> {
        Limits::new(None, None, Some(max_input_power), None)
    }

    pub fn voltage(max_voltage: f64) -> Result<Self> {
        Limits::new(None, None, None, Some(max_voltage))
    }

    pub fn is_empty(&self) -> bool {
        self.max_torque.is_none()
            && self.max_motor_current.is_none()
            && self.max_input_power.is_none()
            && self.max_voltage.is_none()
    }
}

/// One operating point of a motor, with everything in SI units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatingPoint {
    omega: f64,
    motor_power: f64,
    torque: f64,
    rms_torque: f64,
    motor_current: f64,
    limited_by: Limit,
}

impl OperatingPoint {
    /// `omega` in rad/s, `motor_power` is the RMS power dissipated in the
    /// motor, `torque` the average across all phases and `motor_current`
    /// the RMS current in one phase.
    pub fn new(
        omega: f64,
        motor_power: f64,
        torque: f64,
        rms_torque: f64,
        motor_current: f64,
        limited_by: Limit,
    ) -> Self {
        OperatingPoint {
            omega,
            motor_power,
            torque,
            rms_torque,
            motor_current,
            limited_by,
        }
    }

    pub fn omega(&self) -> f64 {
        self.omega
    }

    pub fn motor_power(&self) -> f64 {
        self.motor_power
    }

    pub fn torque(&self) -> f64 {
        self.torque
    }

    /// RMS of the instantaneous torque, equal to [`Self::torque`] when there
    /// is no ripple
    pub fn rms_torque(&self) -> f64 {
        self.rms_torque
    }

    pub fn motor_current(&self) -> f64 {
        self.motor_current
    }

    /// Which limit bounded the current
    pub fn limited_by(&self) -> Limit {
        self.limited_by
    }

    /// Mechanical power delivered, W
    pub fn output_power(&self) -> f64 {
        self.omega * self.torque
    }

    /// Power fed into the motor controller, W
    pub fn input_power(&self) -> f64 {
        self.motor_power + self.output_power()
    }

    /// Supply current (A) drawn at `input_voltage` (V)
    pub fn input_current(&self, input_voltage: f64) -> f64 {
        self.input_power() / input_voltage
    }

    /// Fraction of the input power delivered mechanically, in [0, 1].
    /// `None` when no power is drawn.
    pub fn efficiency(&self) -> Option<f64> {
        let input_power = self.input_power();
        if input_power == 0. {
            None
        } else {
            Some(self.output_power() / input_power)
        }
    }
}

/// A control scheme driving a motor, evaluated at steady state
pub trait MotorController {
    fn motor(&self) -> &Motor;

    /// Maximum speed with 1V, rad/s. Scales linearly with voltage.
    fn max_speed(&self) -> f64;

    /// Finds the operating point at `omega` (rad/s) using as much current as
    /// `limits` allow.
    fn operating_point(&self, omega: f64, limits: &Limits) -> Result<OperatingPoint>;

    /// Evaluates [`Self::operating_point`] at each speed independently
    fn sweep(&self, omegas: &[f64], limits: &Limits) -> Vec<Result<OperatingPoint>> {
        omegas
            .iter()
            .map(|&omega| self.operating_point(omega, limits))
            .collect()
    }
}
