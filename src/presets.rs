//! Motors characterized from back-EMF traces.
//!
//! Flux linkage coefficients are line-to-line fits of the captured traces.
//! The inductances of the two hub motors are estimates.
use crate::cos_sum::coefficients;
use crate::error::Result;
use crate::motor::{Motor, MotorConfig};

/// 48V hub motor, 4800 RPM advertised
pub fn boma() -> Result<Motor> {
    MotorConfig::new()
        .line_line_resistance(0.638 / 3.77)
        .line_line_self_inductance(0.38e-3)
        .line_line_f_coeff(coefficients([(1, 0.03382623, 0.), (7, 0.00343913, 0.)]))
        .advertised_rpm(4800.)
        .advertised_voltage(48.)
        .electrical_ratio(3)
        .realize()
}

/// 48V MY1020 brushless motor, 4500 RPM advertised
pub fn my1020() -> Result<Motor> {
    MotorConfig::new()
        .line_line_resistance(0.650 / 3.77)
        .line_line_self_inductance(0.38e-3)
        .line_line_f_coeff(coefficients([(1, 0.03202452, 0.), (7, 0.00242868, 0.)]))
        .advertised_rpm(4500.)
        .advertised_voltage(48.)
        .electrical_ratio(3)
        .realize()
}

/// 730 KV outrunner
pub fn t20() -> Result<Motor> {
    MotorConfig::new()
        .phase_resistance(0.0065)
        .phase_self_inductance(5.0e-6)
        .line_line_f_coeff(coefficients([(1, 0.00660802, 0.), (5, 0.00097149, 0.)]))
        .advertised_kv(730.)
        .advertised_voltage(41.)
        .electrical_ratio(2)
        .realize()
}
