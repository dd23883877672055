//! A controller commanding one fixed current shape, scaled up until it hits
//! a limit.
use core::f64::consts::PI;

use libm::{fabs, sqrt};

use crate::error::{Error, Result};
use crate::motor::Motor;
use crate::phases::PhaseValues;
use crate::simulation::{
    average_circle, differentiate_phases, max_circle, rms_circle, three_phase_sum, Limit, Limits,
    MotorController, OperatingPoint,
};
use crate::waveform::Periodic;

/// Scales `phase_g` (per unit phase current as a function of electrical
/// angle) by a single factor. Everything that doesn't depend on the speed or
/// the limits is computed once, at unit scale.
#[derive(Debug, Clone)]
pub struct SimpleController<G> {
    motor: Motor,
    phase_g: G,
    unit_torque: f64,
    unit_rms_torque: f64,
    unit_rms_current: f64,
    unit_average_current: f64,
    unit_voltage: f64,
    max_speed: f64,
}

impl<G: Periodic> SimpleController<G> {
    pub fn new(motor: Motor, phase_g: G) -> Result<Self> {
        let g = |theta: f64| phase_g.value(theta);
        let torque = |theta: f64| three_phase_sum(|t| motor.f(t) * g(t), theta);

        let unit_torque = average_circle(torque)?;
        let unit_rms_torque = rms_circle(torque)?;
        let unit_rms_current = rms_circle(g)?;
        let unit_average_current = average_circle(|theta| fabs(g(theta)))?;

        let resistance = motor.resistance();
        let inductance = motor.self_inductance();
        let unit_voltage = max_circle(|theta| {
            let from_resistance = PhaseValues::angles(theta).map(g) * resistance;
            let from_inductance = differentiate_phases(g, theta) * inductance;
            (from_resistance + from_inductance).max_line_line()
        })?;
        let max_speed = 1. / max_circle(|theta| motor.line_line_f(theta))?;

        log::debug!(
            "Unit torque {} (rms {}), unit current rms {} average {}",
            unit_torque,
            unit_rms_torque,
            unit_rms_current,
            unit_average_current
        );
        log::debug!(
            "Unit voltage {}, max speed {} rad/s/V",
            unit_voltage,
            max_speed
        );

        Ok(SimpleController {
            motor,
            phase_g,
            unit_torque,
            unit_rms_torque,
            unit_rms_current,
            unit_average_current,
            unit_voltage,
            max_speed,
        })
    }

    pub fn phase_g(&self) -> &G {
        &self.phase_g
    }

    /// Commanded current between phase `u` and phase `v`
    pub fn line_line_g(&self, theta: f64) -> f64 {
        self.phase_g.value(theta) - self.phase_g.value(theta + PI * 2. / 3.)
    }

    /// Average torque across all phases at unit scale, N*m
    pub fn unit_torque(&self) -> f64 {
        self.unit_torque
    }

    pub fn unit_rms_torque(&self) -> f64 {
        self.unit_rms_torque
    }

    /// RMS current in one phase at unit scale, A
    pub fn unit_rms_current(&self) -> f64 {
        self.unit_rms_current
    }

    pub fn unit_average_current(&self) -> f64 {
        self.unit_average_current
    }

    /// Largest line-to-line voltage needed at unit scale and unit speed,
    /// ignoring back-EMF
    pub fn unit_voltage(&self) -> f64 {
        self.unit_voltage
    }

    /// Power dissipated in the windings at unit scale, W
    pub fn unit_electrical_power(&self) -> f64 {
        self.unit_rms_current * self.unit_rms_current * self.motor.resistance() * 3.
    }

    /// Upper bound on the current scale from the input power limit: the
    /// positive root of `a*k^2 + b*k - max_input_power`
    fn input_power_scale(&self, omega: f64, max_input_power: f64) -> f64 {
        if max_input_power == 0. {
            return 0.;
        }
        if max_input_power == f64::INFINITY {
            return f64::INFINITY;
        }
        let a = self.unit_electrical_power();
        let b = self.unit_torque * omega;
        let denominator = b + sqrt(b * b + a * max_input_power * 4.);
        if denominator == 0. {
            f64::INFINITY
        } else {
            max_input_power * 2. / denominator
        }
    }

    /// Upper bound on the current scale from the voltage left over after
    /// back-EMF
    fn voltage_scale(&self, omega: f64, max_voltage: f64) -> Result<f64> {
        let free_speed = max_voltage * self.max_speed;
        let bemf = omega / self.max_speed;
        if omega > free_speed {
            log::error!(
                "Back-EMF {} V at {} rad/s exceeds the {} V limit",
                bemf,
                omega,
                max_voltage
            );
            return Err(Error::Braking {
                omega,
                reason: "back-EMF exceeds the voltage limit",
            });
        }
        // Compared in speed so free speed itself leaves exactly no headroom
        let headroom = if omega == free_speed {
            0.
        } else {
            (max_voltage - bemf).max(0.)
        };
        Ok(scale_for(headroom, self.unit_voltage))
    }
}

/// Scale that brings a quantity of `unit` per unit scale up to `limit`
fn scale_for(limit: f64, unit: f64) -> f64 {
    if limit == 0. {
        0.
    } else if unit == 0. {
        f64::INFINITY
    } else {
        limit / unit
    }
}

impl<G: Periodic> MotorController for SimpleController<G> {
    fn motor(&self) -> &Motor {
        &self.motor
    }

    fn max_speed(&self) -> f64 {
        self.max_speed
    }

    fn operating_point(&self, omega: f64, limits: &Limits) -> Result<OperatingPoint> {
        if limits.is_empty() {
            log::error!("No limits given at {} rad/s", omega);
            return Err(Error::NoLimits);
        }
        if omega < 0. {
            log::error!("Negative speed {} rad/s", omega);
            return Err(Error::Braking {
                omega,
                reason: "negative speed",
            });
        }

        let candidates = [
            (
                Limit::Torque,
                limits
                    .max_torque
                    .map(|max_torque| scale_for(max_torque, self.unit_torque)),
            ),
            (
                Limit::MotorCurrent,
                limits
                    .max_motor_current
                    .map(|max_current| scale_for(max_current, self.unit_rms_current)),
            ),
            (
                Limit::InputPower,
                limits
                    .max_input_power
                    .map(|max_power| self.input_power_scale(omega, max_power)),
            ),
            (
                Limit::Voltage,
                limits
                    .max_voltage
                    .map(|max_voltage| self.voltage_scale(omega, max_voltage))
                    .transpose()?,
            ),
        ];

        let mut governing: Option<(Limit, f64)> = None;
        for (limit, scale) in candidates {
            let scale = match scale {
                Some(scale) => scale,
                None => continue,
            };
            if !(scale >= 0.) {
                log::error!("{} limit gives current scale {}", limit, scale);
                return Err(Error::Infeasible {
                    limit: limit.name(),
                    scale,
                });
            }
            if governing.map_or(true, |(_, best)| scale < best) {
                governing = Some((limit, scale));
            }
        }

        let (limited_by, scale) = governing.ok_or(Error::NoLimits)?;
        if scale == f64::INFINITY {
            log::error!("No limit bounds the current at {} rad/s", omega);
            return Err(Error::Unbounded);
        }
        log::info!(
            "{} limiter triggered at {} rad/s, current scale {}",
            limited_by,
            omega,
            scale
        );

        Ok(OperatingPoint::new(
            omega,
            self.unit_electrical_power() * scale * scale,
            self.unit_torque * scale,
            self.unit_rms_torque * scale,
            self.unit_rms_current * scale,
            limited_by,
        ))
    }
}
