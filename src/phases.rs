use core::{
    f64::consts::PI,
    ops::{Add, Mul, Sub},
};

use libm::fabs;

/// One value per motor phase, in the order `u`, `v`, `w`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseValues {
    pub u: f64,
    pub v: f64,
    pub w: f64,
}

impl PhaseValues {
    pub fn new(u: f64, v: f64, w: f64) -> Self {
        PhaseValues { u, v, w }
    }

    /// Electrical angles of the three phases when phase `u` is at `theta`.
    /// Phase `v` leads by a third of a revolution and `w` lags by one.
    pub fn angles(theta: f64) -> Self {
        PhaseValues {
            u: theta,
            v: theta + PI * 2. / 3.,
            w: theta - PI * 2. / 3.,
        }
    }

    /// Applies `f` to each phase
    pub fn map<F: Fn(f64) -> f64>(self, f: F) -> Self {
        PhaseValues {
            u: f(self.u),
            v: f(self.v),
            w: f(self.w),
        }
    }

    pub fn sum(self) -> f64 {
        self.u + self.v + self.w
    }

    /// Differences between each pair of terminals: `u - v`, `u - w`, `v - w`
    pub fn line_line(self) -> [f64; 3] {
        [self.u - self.v, self.u - self.w, self.v - self.w]
    }

    /// Largest magnitude across the three line-to-line differences
    pub fn max_line_line(self) -> f64 {
        self.line_line()
            .iter()
            .fold(0., |max: f64, difference| max.max(fabs(*difference)))
    }
}

impl From<[f64; 3]> for PhaseValues {
    fn from([u, v, w]: [f64; 3]) -> Self {
        PhaseValues { u, v, w }
    }
}

impl Add for PhaseValues {
    type Output = PhaseValues;
    fn add(self, rhs: Self) -> Self::Output {
        PhaseValues {
            u: self.u + rhs.u,
            v: self.v + rhs.v,
            w: self.w + rhs.w,
        }
    }
}

impl Sub for PhaseValues {
    type Output = PhaseValues;
    fn sub(self, rhs: Self) -> Self::Output {
        PhaseValues {
            u: self.u - rhs.u,
            v: self.v - rhs.v,
            w: self.w - rhs.w,
        }
    }
}

impl Mul<f64> for PhaseValues {
    type Output = PhaseValues;
    fn mul(self, rhs: f64) -> Self::Output {
        PhaseValues {
            u: self.u * rhs,
            v: self.v * rhs,
            w: self.w * rhs,
        }
    }
}
