pub mod cos_sum;
pub mod error;
pub mod motor;
pub mod numeric;
pub mod phases;
pub mod presets;
pub mod simple;
pub mod simulation;
pub mod waveform;
mod util;

#[cfg(test)]
mod testing;

pub use cos_sum::{Coefficients, CosSum};
pub use error::{Error, Result};
pub use motor::{Motor, MotorConfig};
pub use simple::SimpleController;
pub use simulation::{Limit, Limits, MotorController, OperatingPoint};
pub use util::{wrap_angle, Harmonic};
pub use waveform::{Periodic, Waveform};

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use libm::sqrt;

    use super::*;
    use crate::cos_sum::coefficients;
    use crate::testing::init_logs;

    fn motor() -> Motor {
        MotorConfig::new()
            .phase_resistance(1.)
            .phase_self_inductance(1.)
            .phase_f_coeff(coefficients([(1, 1., 0.)]))
            .electrical_ratio(1)
            .realize()
            .unwrap()
    }

    /// Runs `check` against a sin current, and one 13 times bigger
    fn for_each_controller(check: impl Fn(&dyn MotorController)) {
        init_logs();
        let sin = waveform::sin().unwrap();
        let big_sin = sin.clone();
        check(&SimpleController::new(motor(), sin).unwrap());
        check(&SimpleController::new(motor(), move |t: f64| big_sin.value(t) * 13.).unwrap());
    }

    fn assert_idle(point: &OperatingPoint, omega: f64) {
        assert_eq!(point.omega(), omega);
        assert_eq!(point.input_power(), 0.);
        assert_eq!(point.torque(), 0.);
        assert_eq!(point.motor_power(), 0.);
        assert_eq!(point.input_current(1.), 0.);
        assert_eq!(point.output_power(), 0.);
    }

    /// Drawing current with the rotor held
    fn assert_stalled(point: &OperatingPoint) {
        assert_eq!(point.omega(), 0.);
        assert!(point.input_power() > 0.);
        assert!(point.torque() > 0.);
        assert!(point.motor_power() > 0.);
        assert!(point.input_current(1.) > 0.);
        assert_eq!(point.output_power(), 0.);
        assert_eq!(point.input_power(), point.motor_power());
    }

    fn assert_motoring(point: &OperatingPoint, omega: f64) {
        assert_eq!(point.omega(), omega);
        assert!(point.input_power() > 0.);
        assert!(point.torque() > 0.);
        assert!(point.motor_power() > 0.);
        assert!(point.input_current(1.) > 0.);
        assert!(point.output_power() > 0.);
        assert_relative_eq!(
            point.input_power(),
            point.motor_power() + point.output_power(),
            max_relative = 1e-12
        );
    }

    fn assert_quadratic_losses(low: &OperatingPoint, high: &OperatingPoint) {
        let ratio = high.torque() / low.torque();
        assert_relative_eq!(
            high.motor_power(),
            low.motor_power() * ratio * ratio,
            max_relative = 1e-9
        );
    }

    #[test]
    fn max_torque() {
        for_each_controller(|controller| {
            let limits = |max_torque| Limits::torque(max_torque).unwrap();

            assert_idle(&controller.operating_point(0., &limits(0.)).unwrap(), 0.);
            assert_idle(&controller.operating_point(100., &limits(0.)).unwrap(), 100.);

            let stall_low = controller.operating_point(0., &limits(0.001)).unwrap();
            assert_stalled(&stall_low);
            assert_relative_eq!(stall_low.torque(), 0.001, max_relative = 1e-9);
            assert_eq!(stall_low.limited_by(), Limit::Torque);

            let stall_high = controller.operating_point(0., &limits(1000.)).unwrap();
            assert_stalled(&stall_high);
            assert_relative_eq!(stall_high.torque(), 1000., max_relative = 1e-9);

            let fast_low = controller.operating_point(10000., &limits(0.001)).unwrap();
            assert_motoring(&fast_low, 10000.);
            assert_relative_eq!(fast_low.torque(), 0.001, max_relative = 1e-9);

            let fast_high = controller.operating_point(10000., &limits(1000.)).unwrap();
            assert_motoring(&fast_high, 10000.);
            assert_relative_eq!(fast_high.torque(), 1000., max_relative = 1e-9);

            assert_quadratic_losses(&stall_low, &stall_high);
            assert_quadratic_losses(&fast_low, &fast_high);
            assert_relative_eq!(
                stall_high.motor_power(),
                stall_low.motor_power() * 1e12,
                max_relative = 1e-9
            );
        });
    }

    #[test]
    fn max_motor_current() {
        for_each_controller(|controller| {
            let limits = |max_current| Limits::motor_current(max_current).unwrap();
            let resistance = controller.motor().resistance();

            assert_idle(&controller.operating_point(0., &limits(0.)).unwrap(), 0.);
            assert_idle(&controller.operating_point(100., &limits(0.)).unwrap(), 100.);

            let stall_low = controller.operating_point(0., &limits(0.001)).unwrap();
            assert_stalled(&stall_low);
            assert_relative_eq!(
                stall_low.motor_power() / 3.,
                0.001 * 0.001 * resistance,
                max_relative = 1e-9
            );
            assert_relative_eq!(stall_low.motor_current(), 0.001, max_relative = 1e-9);

            let stall_high = controller.operating_point(0., &limits(1000.)).unwrap();
            assert_stalled(&stall_high);
            assert_relative_eq!(
                stall_high.motor_power() / 3.,
                1000. * 1000. * resistance,
                max_relative = 1e-9
            );

            let fast_low = controller.operating_point(10000., &limits(0.001)).unwrap();
            assert_motoring(&fast_low, 10000.);
            assert_relative_eq!(
                fast_low.motor_power() / 3.,
                0.001 * 0.001 * resistance,
                max_relative = 1e-9
            );

            let fast_high = controller.operating_point(10000., &limits(1000.)).unwrap();
            assert_motoring(&fast_high, 10000.);
            assert_relative_eq!(
                fast_high.motor_power() / 3.,
                1000. * 1000. * resistance,
                max_relative = 1e-9
            );
            assert_eq!(fast_high.limited_by(), Limit::MotorCurrent);

            assert_quadratic_losses(&stall_low, &stall_high);
            assert_quadratic_losses(&fast_low, &fast_high);
        });
    }

    #[test]
    fn max_input_power() {
        for_each_controller(|controller| {
            let limits = |max_power| Limits::input_power(max_power).unwrap();

            assert_idle(&controller.operating_point(0., &limits(0.)).unwrap(), 0.);
            assert_idle(&controller.operating_point(100., &limits(0.)).unwrap(), 100.);

            let stall_low = controller.operating_point(0., &limits(0.001)).unwrap();
            assert_stalled(&stall_low);
            assert_relative_eq!(stall_low.input_power(), 0.001, max_relative = 1e-9);
            assert_relative_eq!(stall_low.motor_power(), 0.001, max_relative = 1e-9);

            let stall_high = controller.operating_point(0., &limits(1000.)).unwrap();
            assert_stalled(&stall_high);
            assert_relative_eq!(stall_high.input_power(), 1000., max_relative = 1e-9);
            assert_relative_eq!(stall_high.motor_power(), 1000., max_relative = 1e-9);

            let fast_low = controller.operating_point(10000., &limits(0.001)).unwrap();
            assert_motoring(&fast_low, 10000.);
            assert_relative_eq!(fast_low.input_power(), 0.001, max_relative = 1e-9);

            let fast_high = controller.operating_point(10000., &limits(1000.)).unwrap();
            assert_motoring(&fast_high, 10000.);
            assert_relative_eq!(fast_high.input_power(), 1000., max_relative = 1e-9);
            assert_eq!(fast_high.limited_by(), Limit::InputPower);

            // Spinning, some of the power leaves mechanically
            assert!(fast_low.motor_power() < stall_low.motor_power());
            assert!(fast_high.motor_power() < stall_high.motor_power());
            assert_relative_eq!(
                sqrt(stall_high.motor_power() / stall_low.motor_power()),
                stall_high.torque() / stall_low.torque(),
                max_relative = 1e-9
            );
            assert_relative_eq!(
                sqrt(fast_high.motor_power() / fast_low.motor_power()),
                fast_high.torque() / fast_low.torque(),
                max_relative = 1e-9
            );
        });
    }

    #[test]
    fn max_voltage() {
        for_each_controller(|controller| {
            let limits = |max_voltage| Limits::voltage(max_voltage).unwrap();

            assert_idle(&controller.operating_point(0., &limits(0.)).unwrap(), 0.);

            let stall_low = controller.operating_point(0., &limits(0.01)).unwrap();
            assert_stalled(&stall_low);
            assert_eq!(stall_low.limited_by(), Limit::Voltage);

            let stall_high = controller.operating_point(0., &limits(1000.)).unwrap();
            assert_stalled(&stall_high);

            let fast_high = controller.operating_point(100., &limits(1000.)).unwrap();
            assert_motoring(&fast_high, 100.);

            // All of the voltage goes to back-EMF
            let max_speed = controller.max_speed();
            let free_1v = controller.operating_point(max_speed, &limits(1.)).unwrap();
            assert_eq!(free_1v.omega(), max_speed);
            assert_eq!(free_1v.torque(), 0.);
            assert_eq!(free_1v.output_power(), 0.);
            assert!(free_1v.input_power() >= 0.);
            assert!(free_1v.motor_power() >= 0.);
            assert!(free_1v.input_current(1.) >= 0.);

            assert!(fast_high.motor_power() < stall_high.motor_power());
            assert_relative_eq!(
                sqrt(stall_high.motor_power() / stall_low.motor_power()),
                stall_high.torque() / stall_low.torque(),
                max_relative = 1e-9
            );

            assert!(matches!(
                controller.operating_point(100., &limits(0.)),
                Err(Error::Braking { .. })
            ));
        });
    }

    #[test]
    fn no_limits() {
        for_each_controller(|controller| {
            assert_eq!(
                controller.operating_point(10., &Limits::default()),
                Err(Error::NoLimits)
            );
        });
    }

    #[test]
    fn invalid_limits() {
        assert_eq!(
            Limits::torque(-1.),
            Err(Error::InvalidParameter {
                name: "torque limit",
                value: -1.
            })
        );
        assert!(Limits::new(None, None, Some(f64::NAN), None).is_err());
    }

    #[test]
    fn sweep() {
        init_logs();
        let controller = SimpleController::new(motor(), waveform::sin().unwrap()).unwrap();
        let limits = Limits::new(Some(0.5), Some(2.), None, Some(1.)).unwrap();
        let free_speed = controller.max_speed();
        let omegas = [0., free_speed / 2., free_speed, free_speed * 2.];

        let points = controller.sweep(&omegas, &limits);
        assert_eq!(points.len(), omegas.len());
        assert_eq!(points[0].as_ref().unwrap().limited_by(), Limit::Torque);
        assert_eq!(points[2].as_ref().unwrap().torque(), 0.);
        assert!(matches!(points[3], Err(Error::Braking { .. })));
        for (point, &omega) in points.iter().zip(omegas.iter()).take(3) {
            assert_eq!(point.as_ref().unwrap().omega(), omega);
        }
    }
}
