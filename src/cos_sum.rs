//! Sums of cosines, in both phase (line-to-neutral) and line-to-line form.
//!
//! For a balanced three phase machine the line-to-line waveform of every
//! harmonic is `sqrt(3)` times the phase waveform, with the offsets shared
//! once the sets have been normalized.
use std::collections::BTreeMap;
use core::f64::consts::FRAC_PI_2;

use libm::sqrt;

use crate::error::{Error, Result};
use crate::util::Harmonic;

/// Harmonic index to term, for `sum(amplitude * cos(index * theta + phase))`
pub type Coefficients = BTreeMap<u32, Harmonic>;

/// Builds a coefficient set from `(index, amplitude, phase)` triples
pub fn coefficients<I: IntoIterator<Item = (u32, f64, f64)>>(terms: I) -> Coefficients {
    terms
        .into_iter()
        .map(|(index, amplitude, phase)| (index, Harmonic::new(amplitude, phase)))
        .collect()
}

/// Shifts every offset by the same amount so the fundamental's offset is
/// exactly `-pi/2`, lining up zero crossings between motors.
pub fn normalize(coefficients: &Coefficients) -> Result<Coefficients> {
    if let Some(&index) = coefficients.keys().find(|&&index| index == 0) {
        log::error!("Harmonic index 0 in {:?}", coefficients);
        return Err(Error::InvalidHarmonic { index });
    }
    let fundamental = coefficients.get(&1).ok_or_else(|| {
        log::error!("No fundamental in {:?}", coefficients);
        Error::MissingFundamental
    })?;

    let offset = -FRAC_PI_2 - fundamental.phase;
    Ok(coefficients
        .iter()
        .map(|(&index, &harmonic)| {
            if index == 1 {
                (index, Harmonic::new(harmonic.amplitude, -FRAC_PI_2))
            } else {
                (index, harmonic.shifted(offset))
            }
        })
        .collect())
}

/// Whether `coefficients` is already normalized
pub fn is_canonical(coefficients: &Coefficients) -> bool {
    coefficients
        .get(&1)
        .map_or(false, |fundamental| fundamental.phase == -FRAC_PI_2)
        && !coefficients.contains_key(&0)
}

pub fn evaluate(coefficients: &Coefficients, theta: f64) -> f64 {
    coefficients
        .iter()
        .map(|(&index, harmonic)| harmonic.evaluate(index, theta))
        .sum()
}

pub fn evaluate_many(coefficients: &Coefficients, thetas: &[f64]) -> Vec<f64> {
    thetas
        .iter()
        .map(|&theta| evaluate(coefficients, theta))
        .collect()
}

fn rescaled(coefficients: &Coefficients, factor: f64) -> Coefficients {
    coefficients
        .iter()
        .map(|(&index, &harmonic)| (index, harmonic.scaled(factor)))
        .collect()
}

/// A periodic signal known by its harmonics, in both representations
#[derive(Debug, Clone, PartialEq)]
pub struct CosSum {
    phase: Coefficients,
    line_line: Coefficients,
}

impl CosSum {
    /// Exactly one of `line_line` and `phase` must be given.
    pub fn new(line_line: Option<Coefficients>, phase: Option<Coefficients>) -> Result<Self> {
        match (line_line, phase) {
            (Some(line_line), None) => CosSum::from_line_line(&line_line),
            (None, Some(phase)) => CosSum::from_phase(&phase),
            (Some(_), Some(_)) => Err(Error::Overspecified {
                quantity: "harmonic coefficients",
            }),
            (None, None) => Err(Error::Unspecified {
                quantity: "harmonic coefficients",
            }),
        }
    }

    pub fn from_phase(phase: &Coefficients) -> Result<Self> {
        let phase = normalize(phase)?;
        let line_line = rescaled(&phase, sqrt(3.));
        Ok(CosSum { phase, line_line })
    }

    pub fn from_line_line(line_line: &Coefficients) -> Result<Self> {
        let line_line = normalize(line_line)?;
        let phase = rescaled(&line_line, 1. / sqrt(3.));
        Ok(CosSum { phase, line_line })
    }

    /// Phase (line-to-neutral) value at `theta`
    pub fn phase(&self, theta: f64) -> f64 {
        evaluate(&self.phase, theta)
    }

    pub fn line_line(&self, theta: f64) -> f64 {
        evaluate(&self.line_line, theta)
    }

    pub fn phase_coeff(&self) -> &Coefficients {
        &self.phase
    }

    pub fn line_line_coeff(&self) -> &Coefficients {
        &self.line_line
    }

    /// An owned closure evaluating `coefficients`
    pub fn make_function(
        coefficients: &Coefficients,
    ) -> impl Fn(f64) -> f64 + Clone + Send + Sync + 'static {
        let terms: Vec<(u32, Harmonic)> = coefficients
            .iter()
            .map(|(&index, &harmonic)| (index, harmonic))
            .collect();
        move |theta| {
            terms
                .iter()
                .map(|&(index, harmonic)| harmonic.evaluate(index, theta))
                .sum()
        }
    }
}
