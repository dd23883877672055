use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// None of the accepted forms of a quantity was given
    #[error("must specify the {quantity}")]
    Unspecified { quantity: &'static str },

    /// More than one form of a quantity was given
    #[error("the {quantity} was specified more than once")]
    Overspecified { quantity: &'static str },

    #[error("harmonic coefficients must include the fundamental (index 1)")]
    MissingFundamental,

    #[error("invalid harmonic index {index}")]
    InvalidHarmonic { index: u32 },

    #[error("harmonic coefficients are not canonical (fundamental offset must be -pi/2)")]
    NotCanonical,

    #[error("{count} harmonics given, at most {max} supported")]
    TooManyHarmonics { count: usize, max: usize },

    #[error("invalid {name}: {value}")]
    InvalidParameter { name: &'static str, value: f64 },

    /// Motor braking (back-EMF above the available voltage, or reverse
    /// rotation) is not modeled
    #[error("braking not supported at {omega} rad/s: {reason}")]
    Braking { omega: f64, reason: &'static str },

    #[error("at least one operating limit must be specified")]
    NoLimits,

    #[error("the specified limits do not bound the motor current")]
    Unbounded,

    #[error("the {limit} limit requires a negative current scale ({scale})")]
    Infeasible { limit: &'static str, scale: f64 },

    #[error("{routine} failed to converge")]
    NoConvergence { routine: &'static str },

    #[error("{routine} evaluated a non-finite value")]
    NonFinite { routine: &'static str },
}
