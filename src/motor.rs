//! Electrical model of one type of motor.
//!
//! All internal constants are phase-neutral, all angles electrical radians,
//! and everything in SI units (volts, seconds, newton meters, amps, ohms).
//! Mutual inductance is taken as 0, which holds by definition for
//! wye-connected motors with a floating neutral since the phase currents are
//! linearly dependent.
use core::{f64::consts::PI, fmt};

use crate::cos_sum::{Coefficients, CosSum};
use crate::error::{Error, Result};

/// (rad/s) per RPM
const RPM_TO_RAD_S: f64 = PI * 2. / 60.;

#[derive(Debug, Clone, PartialEq)]
pub struct Motor {
    /// Ohms, one phase
    resistance: f64,
    /// Henries, one phase
    self_inductance: f64,
    /// Flux linkage (derivative), V/(rad/s) aka N*m/A
    flux_linkage: CosSum,
    /// Electrical rad/s
    advertised_omega: Option<f64>,
    advertised_voltage: Option<f64>,
    /// Electrical rad/s per volt
    advertised_kv: Option<f64>,
    /// Electrical revolutions per mechanical one
    electrical_ratio: u32,
}

impl Motor {
    /// Phase flux linkage (derivative) at electrical angle `theta`
    pub fn f(&self, theta: f64) -> f64 {
        self.flux_linkage.phase(theta)
    }

    /// Flux linkage (derivative) between two terminals
    pub fn line_line_f(&self, theta: f64) -> f64 {
        self.flux_linkage.line_line(theta)
    }

    pub fn f_coeff(&self) -> &Coefficients {
        self.flux_linkage.phase_coeff()
    }

    pub fn line_line_f_coeff(&self) -> &Coefficients {
        self.flux_linkage.line_line_coeff()
    }

    pub fn flux_linkage(&self) -> &CosSum {
        &self.flux_linkage
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    pub fn self_inductance(&self) -> f64 {
        self.self_inductance
    }

    pub fn electrical_ratio(&self) -> u32 {
        self.electrical_ratio
    }

    /// The manufacturer's speed constant in electrical (rad/s)/V, either as
    /// given or from the advertised speed and voltage.
    ///
    /// Only for comparison: it is unclear which currents and voltages
    /// manufacturers measure these with.
    pub fn advertised_kv(&self) -> Option<f64> {
        match (self.advertised_kv, self.advertised_omega, self.advertised_voltage) {
            (Some(kv), _, _) => Some(kv),
            (None, Some(omega), Some(voltage)) => Some(omega / voltage),
            _ => None,
        }
    }
}

impl fmt::Display for Motor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Motor(phase_resistance={:.6}, phase_f_coeff={{",
            self.resistance
        )?;
        for (i, (index, harmonic)) in self.f_coeff().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: ({}, {})", index, harmonic.amplitude, harmonic.phase)?;
        }
        write!(
            f,
            "}}, phase_self_inductance={:.6}, advertised_omega={:?}, advertised_voltage={:?}, \
             advertised_kv={:?}, electrical_ratio={})",
            self.self_inductance,
            self.advertised_omega,
            self.advertised_voltage,
            self.advertised_kv,
            self.electrical_ratio
        )
    }
}

/// Which way a quantity was specified
enum Form<T> {
    Phase(T),
    LineLine(T),
}

fn exactly_one<T>(
    quantity: &'static str,
    phase: Option<T>,
    line_line: Option<T>,
) -> Result<Form<T>> {
    match (phase, line_line) {
        (Some(value), None) => Ok(Form::Phase(value)),
        (None, Some(value)) => Ok(Form::LineLine(value)),
        (Some(_), Some(_)) => {
            log::error!("The {} was specified both per phase and line-to-line", quantity);
            Err(Error::Overspecified { quantity })
        }
        (None, None) => {
            log::error!("The {} was not specified", quantity);
            Err(Error::Unspecified { quantity })
        }
    }
}

/// Per phase value of a resistance or inductance measured either way.
/// Line-to-line goes through two phases in series.
fn per_phase(name: &'static str, form: Form<f64>) -> Result<f64> {
    let value = match form {
        Form::Phase(value) => value,
        Form::LineLine(value) => value / 2.,
    };
    if !(value >= 0.) || value.is_infinite() {
        log::error!("Invalid {}: {}", name, value);
        return Err(Error::InvalidParameter { name, value });
    }
    Ok(value)
}

/// Collects a motor's constants. Each quantity must be specified in exactly
/// one way before calling [`MotorConfig::realize`].
#[derive(Debug, Clone, Default)]
pub struct MotorConfig {
    phase_resistance: Option<f64>,
    line_line_resistance: Option<f64>,
    phase_self_inductance: Option<f64>,
    line_line_self_inductance: Option<f64>,
    phase_f_coeff: Option<Coefficients>,
    line_line_f_coeff: Option<Coefficients>,
    advertised_rpm: Option<f64>,
    advertised_voltage: Option<f64>,
    advertised_kv: Option<f64>,
    electrical_ratio: Option<u32>,
}

impl MotorConfig {
    pub fn new() -> Self {
        MotorConfig::default()
    }
    /// Realize a `Motor` from the configuration
    pub fn realize(&self) -> Result<Motor> {
        let resistance = per_phase(
            "resistance",
            exactly_one("resistance", self.phase_resistance, self.line_line_resistance)?,
        )?;
        let self_inductance = per_phase(
            "inductance",
            exactly_one(
                "inductance",
                self.phase_self_inductance,
                self.line_line_self_inductance,
            )?,
        )?;
        let flux_linkage = match exactly_one(
            "flux linkage",
            self.phase_f_coeff.as_ref(),
            self.line_line_f_coeff.as_ref(),
        )? {
            Form::Phase(coefficients) => CosSum::from_phase(coefficients)?,
            Form::LineLine(coefficients) => CosSum::from_line_line(coefficients)?,
        };

        let electrical_ratio = self.electrical_ratio.unwrap_or(1);
        if electrical_ratio == 0 {
            log::error!("Electrical ratio must be at least 1");
            return Err(Error::InvalidParameter {
                name: "electrical ratio",
                value: 0.,
            });
        }
        let to_electrical = RPM_TO_RAD_S * electrical_ratio as f64;

        let motor = Motor {
            resistance,
            self_inductance,
            flux_linkage,
            advertised_omega: self.advertised_rpm.map(|rpm| rpm * to_electrical),
            advertised_voltage: self.advertised_voltage,
            advertised_kv: self.advertised_kv.map(|kv| kv * to_electrical),
            electrical_ratio,
        };
        log::debug!("Realized {}", motor);
        Ok(motor)
    }
    /// Resistance of one phase, ohms
    pub fn phase_resistance(&mut self, resistance: f64) -> &mut Self {
        self.phase_resistance = Some(resistance);
        self
    }
    /// Resistance in one phase and out another, ohms
    pub fn line_line_resistance(&mut self, resistance: f64) -> &mut Self {
        self.line_line_resistance = Some(resistance);
        self
    }
    pub fn phase_self_inductance(&mut self, inductance: f64) -> &mut Self {
        self.phase_self_inductance = Some(inductance);
        self
    }
    /// Inductance in one phase and out another, henries
    pub fn line_line_self_inductance(&mut self, inductance: f64) -> &mut Self {
        self.line_line_self_inductance = Some(inductance);
        self
    }
    pub fn phase_f_coeff(&mut self, coefficients: Coefficients) -> &mut Self {
        self.phase_f_coeff = Some(coefficients);
        self
    }
    /// Flux linkage (derivative) between two phases, in V/(rad/s) aka N*m/A
    pub fn line_line_f_coeff(&mut self, coefficients: Coefficients) -> &mut Self {
        self.line_line_f_coeff = Some(coefficients);
        self
    }
    /// Mechanical RPM
    pub fn advertised_rpm(&mut self, rpm: f64) -> &mut Self {
        self.advertised_rpm = Some(rpm);
        self
    }
    pub fn advertised_voltage(&mut self, voltage: f64) -> &mut Self {
        self.advertised_voltage = Some(voltage);
        self
    }
    /// Mechanical RPM per volt
    pub fn advertised_kv(&mut self, kv: f64) -> &mut Self {
        self.advertised_kv = Some(kv);
        self
    }
    /// Electrical revolutions per mechanical revolution. Doesn't affect any
    /// electrical calculations, only unit conversions of mechanical figures.
    pub fn electrical_ratio(&mut self, ratio: u32) -> &mut Self {
        self.electrical_ratio = Some(ratio);
        self
    }
}
