//! Glue to the numerical libraries: quadrature over a bounded interval,
//! bounded local minimization and global minimization of scalar functions.
//!
//! Everything here works on plain `Fn(f64) -> f64` closures. A non-finite
//! function value or a solver that runs out of budget comes back as an
//! [`Error`] instead of a silently wrong number.
use argmin::core::{CostFunction, Executor, State, TerminationReason};
use argmin::solver::brent::BrentOpt;
use argmin::solver::particleswarm::ParticleSwarm;
use rand::{rngs::SmallRng, SeedableRng};

use crate::error::{Error, Result};

/// Convergence criteria for [`integrate`]
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Target absolute error of the whole integral
    pub absolute: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Tolerance { absolute: 1.49e-8 }
    }
}

/// Integrates `f` over `[lower, upper]` by tanh-sinh quadrature.
///
/// Missing the error target is not fatal (discontinuous integrands routinely
/// do): the estimate is returned and a warning logged. The endpoints are
/// never evaluated, so jumps placed exactly on them cost nothing.
pub fn integrate<F: Fn(f64) -> f64>(
    f: F,
    lower: f64,
    upper: f64,
    tolerance: &Tolerance,
) -> Result<f64> {
    let output = quadrature::integrate(&f, lower, upper, tolerance.absolute);
    if !output.integral.is_finite() {
        log::error!("Non-finite integral over [{}, {}]", lower, upper);
        return Err(Error::NonFinite {
            routine: "quadrature",
        });
    }
    if output.error_estimate > tolerance.absolute {
        log::warn!(
            "Quadrature missed its target over [{}, {}], estimated error: {}",
            lower,
            upper,
            output.error_estimate
        );
    }
    Ok(output.integral)
}

/// Location and value of a minimum
#[derive(Debug, Clone, Copy)]
pub struct Minimum {
    pub x: f64,
    pub value: f64,
    /// Solver iterations used
    pub iterations: u64,
}

/// `f` as a cost function, rejecting non-finite values
struct Objective<F> {
    f: F,
    routine: &'static str,
}

impl<F: Fn(f64) -> f64> Objective<F> {
    fn evaluate(&self, x: f64) -> core::result::Result<f64, argmin::core::Error> {
        let value = (self.f)(x);
        if value.is_finite() {
            Ok(value)
        } else {
            Err(Error::NonFinite {
                routine: self.routine,
            }
            .into())
        }
    }
}

impl<F: Fn(f64) -> f64> CostFunction for Objective<F> {
    type Param = f64;
    type Output = f64;

    fn cost(&self, x: &f64) -> core::result::Result<f64, argmin::core::Error> {
        self.evaluate(*x)
    }
}

/// The particle swarm works on vectors, this is always one long
struct SwarmObjective<F>(Objective<F>);

impl<F: Fn(f64) -> f64> CostFunction for SwarmObjective<F> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Vec<f64>) -> core::result::Result<f64, argmin::core::Error> {
        self.0.evaluate(x[0])
    }
}

/// Our own errors pass through the solver untouched, anything else the
/// solver reports is a failure to converge
fn solver_error(routine: &'static str) -> impl Fn(argmin::core::Error) -> Error {
    move |e| {
        e.downcast::<Error>().unwrap_or_else(|e| {
            log::error!("{} failed: {}", routine, e);
            Error::NoConvergence { routine }
        })
    }
}

/// Minimizes `f` on `[lower, upper]` with Brent's bounded method.
///
/// `xatol` is the absolute tolerance on the abscissa. Using up
/// `max_iterations` before converging is [`Error::NoConvergence`].
pub fn minimize_bounded<F: Fn(f64) -> f64>(
    f: F,
    lower: f64,
    upper: f64,
    xatol: f64,
    max_iterations: u64,
) -> Result<Minimum> {
    let routine = "bounded minimization";
    if !(lower <= upper) {
        log::error!("Invalid bounds: [{}, {}]", lower, upper);
        return Err(Error::InvalidParameter {
            name: "lower bound",
            value: lower,
        });
    }

    let solver = BrentOpt::new(lower, upper).set_tolerance(f64::EPSILON.sqrt(), xatol / 3.);
    let result = Executor::new(Objective { f, routine }, solver)
        .configure(|state| state.max_iters(max_iterations))
        .run()
        .map_err(solver_error(routine))?;

    let state = result.state();
    if let Some(TerminationReason::MaxItersReached) = state.get_termination_reason() {
        log::debug!("Bounded minimization exhausted {} iterations", max_iterations);
        return Err(Error::NoConvergence { routine });
    }
    let x = *state
        .get_best_param()
        .ok_or(Error::NoConvergence { routine })?;
    Ok(Minimum {
        x,
        value: state.get_best_cost(),
        iterations: state.get_iter(),
    })
}

/// Tuning for [`minimize_global`]
#[derive(Debug, Clone, Copy)]
pub struct SwarmConfig {
    pub particles: usize,
    pub iterations: u64,
    pub seed: u64,
    /// Refine the best particle with [`minimize_bounded`] afterwards
    pub polish: bool,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        SwarmConfig {
            particles: 20,
            iterations: 100,
            seed: 0x6272_7573_686c_6573,
            polish: true,
        }
    }
}

/// Globally minimizes `f` on `[lower, upper]` with a particle swarm.
///
/// The swarm is seeded from `config`, so repeated calls give identical
/// results.
pub fn minimize_global<F: Fn(f64) -> f64>(
    f: F,
    lower: f64,
    upper: f64,
    config: &SwarmConfig,
) -> Result<Minimum> {
    let routine = "global minimization";
    if !(lower < upper) || config.particles == 0 || config.iterations == 0 {
        log::error!(
            "Invalid global minimization setup: [{}, {}], {:?}",
            lower,
            upper,
            config
        );
        return Err(Error::InvalidParameter {
            name: "global minimization bounds",
            value: upper - lower,
        });
    }

    let solver = ParticleSwarm::new((vec![lower], vec![upper]), config.particles)
        .with_rng_generator(SmallRng::seed_from_u64(config.seed));
    let result = Executor::new(SwarmObjective(Objective { f: &f, routine }), solver)
        .configure(|state| state.max_iters(config.iterations))
        .run()
        .map_err(solver_error(routine))?;

    let state = result.state();
    let best = state
        .get_best_param()
        .ok_or(Error::NoConvergence { routine })?;
    let mut minimum = Minimum {
        x: best.position[0].clamp(lower, upper),
        value: best.cost,
        iterations: state.get_iter(),
    };
    log::debug!("Particle swarm finished: {:?}", minimum);

    if config.polish {
        let radius = (upper - lower) / config.particles as f64;
        let polished = minimize_bounded(
            &f,
            (minimum.x - radius).max(lower),
            (minimum.x + radius).min(upper),
            1e-10,
            500,
        )?;
        minimum.iterations += polished.iterations;
        if polished.value < minimum.value {
            minimum.x = polished.x;
            minimum.value = polished.value;
        }
    }

    Ok(minimum)
}
