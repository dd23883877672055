use brushless_sim::{presets, waveform, Limits, MotorController, SimpleController};

/// Speed steps between stall and free speed
const STEPS: usize = 20;

fn main() -> Result<(), brushless_sim::Error> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let motor = presets::t20()?;
    log::info!("Sweeping {}", motor);
    let bus_voltage = 36.;
    let limits = Limits::new(Some(2.), Some(60.), None, Some(bus_voltage))?;

    let currents = [
        waveform::sin()?,
        waveform::make_sin_constant(motor.f_coeff())?,
    ];
    for current in currents {
        let name = current.name().to_owned();
        let controller = SimpleController::new(motor.clone(), current)?;
        let free_speed = controller.max_speed() * bus_voltage;
        let omegas: Vec<f64> = (0..=STEPS)
            .map(|i| (i as f64 / STEPS as f64) * free_speed)
            .collect();

        for point in controller.sweep(&omegas, &limits) {
            match point {
                Ok(point) => log::info!(
                    "{}: {:8.1} rad/s {:6.3} N*m (rms {:6.3}) {:6.1} A {:7.1} W in {:7.1} W out, \
                     {} limited, efficiency {:?}",
                    name,
                    point.omega(),
                    point.torque(),
                    point.rms_torque(),
                    point.input_current(bus_voltage),
                    point.input_power(),
                    point.output_power(),
                    point.limited_by(),
                    point.efficiency()
                ),
                Err(e) => log::warn!("{}: {}", name, e),
            }
        }
    }
    Ok(())
}
