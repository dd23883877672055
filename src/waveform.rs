//! Commutation waveforms: per unit phase current or voltage commands as a
//! function of electrical angle.
//!
//! Every shape here is periodic over 2PI, odd symmetric about PI and
//! positive at PI/2, which removes needless degrees of freedom from the
//! definitions and keeps the math built on them unambiguous.
use core::{f64::consts::PI, fmt};
use std::sync::Arc;

use crate::cos_sum::{is_canonical, Coefficients, CosSum};
use crate::error::{Error, Result};
use crate::numeric::{minimize_bounded, minimize_global, SwarmConfig};
use crate::util::wrap_angle;

/// A periodic function of electrical angle
pub trait Periodic {
    fn value(&self, theta: f64) -> f64;
}

impl<F: Fn(f64) -> f64> Periodic for F {
    fn value(&self, theta: f64) -> f64 {
        self(theta)
    }
}

/// How hard [`Waveform`] construction looks for the extrema
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    /// Points in the coarse sample of the whole revolution
    pub grid_points: usize,
    pub local_xatol: f64,
    pub local_max_iterations: u64,
    pub swarm: SwarmConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            grid_points: 12,
            local_xatol: 1e-10,
            local_max_iterations: 500,
            swarm: SwarmConfig::default(),
        }
    }
}

/// Lowest value of `f` found by a coarse sample of the revolution, a local
/// search, and a global search over `[lower, upper]`. The functions are only
/// guaranteed continuous (often not even that), so any one of these alone
/// can miss the minimum.
fn search_minimum<F: Fn(f64) -> f64>(
    f: F,
    lower: f64,
    upper: f64,
    config: &SearchConfig,
) -> Result<f64> {
    let n = config.grid_points.max(2);
    let grid = (0..n)
        .map(|i| f(PI * 2. * i as f64 / (n - 1) as f64))
        .fold(f64::INFINITY, f64::min);
    let local = minimize_bounded(
        &f,
        lower,
        upper,
        config.local_xatol,
        config.local_max_iterations,
    )?;
    let global = minimize_global(&f, lower, upper, &config.swarm)?;
    log::debug!(
        "Minimum candidates: grid {}, local {:?}, global {:?}",
        grid,
        local,
        global
    );
    Ok(grid.min(local.value).min(global.value))
}

/// A periodic function with its extrema, found once up front
#[derive(Clone)]
pub struct Waveform {
    name: String,
    f: Arc<dyn Fn(f64) -> f64 + Send + Sync>,
    min: f64,
    max: f64,
}

impl Waveform {
    pub fn new<F>(name: impl Into<String>, f: F) -> Result<Self>
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        Waveform::with_config(name, f, &SearchConfig::default())
    }

    /// Expensive: runs global optimizations over the waveform. Build each
    /// waveform once and clone it.
    pub fn with_config<F>(name: impl Into<String>, f: F, config: &SearchConfig) -> Result<Self>
    where
        F: Fn(f64) -> f64 + Send + Sync + 'static,
    {
        let name = name.into();
        let min = search_minimum(&f, PI, PI * 2., config)?;
        let max = -search_minimum(|theta| -f(theta), 0., PI, config)?;
        log::debug!("Waveform {} spans [{}, {}]", name, min, max);
        Ok(Waveform {
            name,
            f: Arc::new(f),
            min,
            max,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

impl Periodic for Waveform {
    fn value(&self, theta: f64) -> f64 {
        (self.f)(theta)
    }
}

impl fmt::Debug for Waveform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Waveform")
            .field("name", &self.name)
            .field("min", &self.min)
            .field("max", &self.max)
            .finish()
    }
}

pub fn sin_shape(theta: f64) -> f64 {
    libm::sin(theta)
}

/// A 2-step square wave. A really crude commutation scheme.
pub fn square_shape(theta: f64) -> f64 {
    if wrap_angle(theta) < PI {
        1.
    } else {
        -1.
    }
}

/// A trapezoid with 120 degree flat regions, the ideal flux linkage of a
/// trapezoidal motor.
pub fn trapezoid_shape(theta: f64) -> f64 {
    let one_sixth = PI / 3.;
    let theta = wrap_angle(theta - one_sixth / 2.);
    if theta < one_sixth * 2. {
        1.
    } else if theta < one_sixth * 3. {
        (theta - one_sixth * 2.5) / one_sixth * -2.
    } else if theta < one_sixth * 5. {
        -1.
    } else {
        (theta - one_sixth * 5.5) / one_sixth * 2.
    }
}

/// A 6-step "trapezoid", the idealized phase current usually meant by
/// "trapezoidal commutation".
pub fn trapezoid_6step_shape(theta: f64) -> f64 {
    let one_sixth = PI / 3.;
    let theta = wrap_angle(theta);
    if theta < one_sixth {
        0.5
    } else if theta < one_sixth * 2. {
        1.
    } else if theta < one_sixth * 3. {
        0.5
    } else if theta < one_sixth * 4. {
        -0.5
    } else if theta < one_sixth * 5. {
        -1.
    } else {
        -0.5
    }
}

/// A 4-step kind-of-trapezoid with only the 120 degree flat regions and 0
/// elsewhere. Also called a "modified square wave"; it is the phase voltage
/// usually meant by "trapezoidal commutation".
pub fn trapezoid_4step_shape(theta: f64) -> f64 {
    let one_sixth = PI / 3.;
    let theta = wrap_angle(theta - one_sixth / 2.);
    if theta < one_sixth * 2. {
        1.
    } else if theta < one_sixth * 3. {
        0.
    } else if theta < one_sixth * 5. {
        -1.
    } else {
        0.
    }
}

pub fn sin() -> Result<Waveform> {
    Waveform::new("sin", sin_shape)
}

pub fn square() -> Result<Waveform> {
    Waveform::new("square", square_shape)
}

pub fn trapezoid() -> Result<Waveform> {
    Waveform::new("trapezoid", trapezoid_shape)
}

pub fn trapezoid_6step() -> Result<Waveform> {
    Waveform::new("trapezoid_6step", trapezoid_6step_shape)
}

pub fn trapezoid_4step() -> Result<Waveform> {
    Waveform::new("trapezoid_4step", trapezoid_4step_shape)
}

/// Most harmonics [`make_sin_constant`] can flatten the torque for
const MAX_SIN_CONSTANT_HARMONICS: usize = 2;

/// A current waveform producing constant torque against a flux linkage
/// shaped like `coefficients`, which is usually [`crate::Motor::f_coeff`].
///
/// Flipping the sign of the harmonic cancels its product with the
/// fundamental when summed across the phases.
pub fn make_sin_constant(coefficients: &Coefficients) -> Result<Waveform> {
    if !is_canonical(coefficients) {
        log::error!("Not canonical: {:?}", coefficients);
        return Err(Error::NotCanonical);
    }
    if coefficients.len() > MAX_SIN_CONSTANT_HARMONICS {
        log::error!("Too many harmonics: {:?}", coefficients);
        return Err(Error::TooManyHarmonics {
            count: coefficients.len(),
            max: MAX_SIN_CONSTANT_HARMONICS,
        });
    }

    let current = coefficients
        .iter()
        .enumerate()
        .map(|(i, (&index, &harmonic))| {
            if i == 0 {
                (index, harmonic)
            } else {
                (index, harmonic.scaled(-1.))
            }
        })
        .collect::<Coefficients>();
    Waveform::new("sin_constant", CosSum::make_function(&current))
}
