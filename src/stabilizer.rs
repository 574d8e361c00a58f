// src/stabilizer.rs

//! # Stabilization Orchestrator
//!
//! The top-level controller of the stabilization core. It owns every axis
//! controller and the motor, attitude, and receiver collaborators, brings
//! the subsystem from power-on to closed-loop readiness, and executes one
//! of the two control architectures per tick:
//!
//! - **Accro**: one rate loop per axis, pilot sticks command angular rates
//!   directly.
//! - **Angle**: self-leveling. Roll and pitch each run a two-stage cascade
//!   where the angle position loop's output becomes the rate loop's
//!   setpoint. Yaw has no tracked heading and always runs the single rate
//!   loop shared with Accro mode.
//!
//! Lifecycle: the controller starts uninitialized, blocks on the receiver
//! link while initializing, then stays ready. Once ready, ticks alternate
//! between the two modes as selected externally, and the reset discipline
//! may run at any tick without leaving the ready state. The control loop
//! has no terminal state.
//!
//! Execution is single-threaded and cooperative: one tick runs to
//! completion before the next begins, and all controller state is
//! exclusively owned here. The only blocking operation is the receiver
//! wait during initialization.

use crate::config::{StabilizationConfig, YawGainCalibration};
use crate::device::{
    AnalogInput, AttitudeProvider, Axis, MotorDriver, ReceiverInput, SensorBus, Watchdog,
};
use crate::mixer::MotorMixer;
use crate::pid::{AxisController, PidGains};
use crate::{ConfigError, Number};
use embedded_hal::delay::DelayNs;

/// Sensor bus clock rate the initialization sequence configures.
pub const SENSOR_BUS_CLOCK_HZ: u32 = 400_000;

/// Delay between receiver-ready polls during initialization.
pub const RECEIVER_RETRY_DELAY_MS: u32 = 200;

/// Flight mode selected externally for each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightMode {
    /// Direct rate control.
    Accro,
    /// Self-leveling angle control.
    Angle,
}

/// Startup classification of the motor-driver power envelope.
///
/// Advisory only: reported for operator visibility and never blocks
/// initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerEnvelope {
    /// Flight-capable power configuration.
    Flight,
    /// Reduced power, bench and debug use.
    Debug,
    /// Outside both known ranges.
    Unexpected,
}

impl PowerEnvelope {
    /// Classifies a motor-driver power configuration against the
    /// thresholds in `config`.
    pub fn classify<T: Number>(
        max_power: T,
        max_throttle: T,
        config: &StabilizationConfig<T>,
    ) -> Self {
        if max_power == config.flight_power
            && max_throttle >= config.flight_power * config.flight_throttle_ratio
        {
            PowerEnvelope::Flight
        } else if max_power <= config.debug_power_ceiling {
            PowerEnvelope::Debug
        } else {
            PowerEnvelope::Unexpected
        }
    }
}

/// Top-level stabilization controller.
///
/// One instance owns the seven axis controllers (two mode families for
/// roll and pitch, one shared yaw rate loop) plus the motor, attitude,
/// and receiver collaborators, so independent instances can coexist for
/// simulation or testing.
pub struct StabilizationController<T: Number, M, A, R> {
    motors: M,
    attitude: A,
    receiver: R,
    mixer: MotorMixer<T>,
    config: StabilizationConfig<T>,
    roll_position_angle: AxisController<T>,
    pitch_position_angle: AxisController<T>,
    roll_rate_angle: AxisController<T>,
    pitch_rate_angle: AxisController<T>,
    roll_rate_accro: AxisController<T>,
    pitch_rate_accro: AxisController<T>,
    yaw_rate: AxisController<T>,
    roll_correction: T,
    pitch_correction: T,
    yaw_correction: T,
}

impl<T, M, A, R> StabilizationController<T, M, A, R>
where
    T: Number,
    M: MotorDriver<T>,
    A: AttitudeProvider<T>,
    R: ReceiverInput<T>,
{
    /// Creates a controller from a validated configuration and the device
    /// collaborators.
    ///
    /// Gains are not loaded here; call [`StabilizationController::init`]
    /// before running ticks.
    pub fn new(
        config: StabilizationConfig<T>,
        motors: M,
        attitude: A,
        receiver: R,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let limit = config.integral_limit;

        Ok(StabilizationController {
            motors,
            attitude,
            receiver,
            mixer: MotorMixer::new(config.mixing),
            roll_position_angle: AxisController::new("roll position (angle)", limit),
            pitch_position_angle: AxisController::new("pitch position (angle)", limit),
            roll_rate_angle: AxisController::new("roll rate (angle)", limit),
            pitch_rate_angle: AxisController::new("pitch rate (angle)", limit),
            roll_rate_accro: AxisController::new("roll rate (accro)", limit),
            pitch_rate_accro: AxisController::new("pitch rate (accro)", limit),
            yaw_rate: AxisController::new("yaw rate (shared)", limit),
            roll_correction: T::zero(),
            pitch_correction: T::zero(),
            yaw_correction: T::zero(),
            config,
        })
    }

    /// Brings the subsystem from power-on to closed-loop readiness.
    ///
    /// Blocks until the receiver reports a valid command link. The wait is
    /// intentionally unbounded (the vehicle must not proceed without one)
    /// and stays safe because motors are held at idle and the watchdog is
    /// serviced on every iteration.
    pub fn init<B, W, D, P>(&mut self, bus: &mut B, watchdog: &mut W, delay: &mut D, analog: &mut P)
    where
        B: SensorBus,
        W: Watchdog,
        D: DelayNs,
        P: AnalogInput<T>,
    {
        self.motors.init();
        bus.init(SENSOR_BUS_CLOCK_HZ);

        while !self.receiver.is_ready() {
            log::warn!("receiver link not ready, retrying");
            self.motors.idle();
            watchdog.reset();
            delay.delay_ms(RECEIVER_RETRY_DELAY_MS);
        }

        self.attitude.init();
        self.report_power_envelope();

        self.roll_position_angle
            .set_gains(self.config.angle_position_gains);
        self.pitch_position_angle
            .set_gains(self.config.angle_position_gains);
        self.roll_rate_angle.set_gains(self.config.angle_rate_gains);
        self.pitch_rate_angle
            .set_gains(self.config.angle_rate_gains);

        let yaw_gains = self.calibrated_yaw_gains(analog);
        self.yaw_rate.set_gains(yaw_gains);

        self.roll_rate_accro
            .set_gains(self.config.accro_rate_gains);
        self.pitch_rate_accro
            .set_gains(self.config.accro_rate_gains);
    }

    /// Runs one control tick in the given mode.
    ///
    /// At or below the idle throttle level the reset discipline runs
    /// instead of either cascade, so no residual correction or integrator
    /// windup can produce a motor kick on throttle-up.
    pub fn tick(&mut self, mode: FlightMode, dt: T, throttle: T) {
        if throttle <= self.config.idle_throttle {
            self.reset_pid(throttle);
            return;
        }

        match mode {
            FlightMode::Accro => self.accro(dt, throttle),
            FlightMode::Angle => self.angle(dt, throttle),
        }
    }

    /// Accro mode: one rate loop per axis.
    pub fn accro(&mut self, dt: T, throttle: T) {
        let sample = self.attitude.sample(dt);

        self.roll_correction =
            self.roll_rate_accro
                .compute(self.receiver.aileron_rate(), sample.rate(Axis::Roll), dt);
        self.pitch_correction = self.pitch_rate_accro.compute(
            self.receiver.elevator_rate(),
            sample.rate(Axis::Pitch),
            dt,
        );
        self.yaw_correction =
            self.yaw_rate
                .compute(self.receiver.rudder_rate(), sample.rate(Axis::Yaw), dt);

        self.apply_motor_mix(throttle);
    }

    /// Angle mode: angle-over-rate cascade on roll and pitch, shared rate
    /// loop on yaw.
    pub fn angle(&mut self, dt: T, throttle: T) {
        let sample = self.attitude.sample(dt);

        // The position loop's output is the rate loop's setpoint.
        let roll_rate_set_point = self.roll_position_angle.compute(
            self.receiver.aileron_angle(),
            sample.angle(Axis::Roll),
            dt,
        );
        self.roll_correction =
            self.roll_rate_angle
                .compute(roll_rate_set_point, sample.rate(Axis::Roll), dt);

        let pitch_rate_set_point = self.pitch_position_angle.compute(
            self.receiver.elevator_angle(),
            sample.angle(Axis::Pitch),
            dt,
        );
        self.pitch_correction =
            self.pitch_rate_angle
                .compute(pitch_rate_set_point, sample.rate(Axis::Pitch), dt);

        self.yaw_correction =
            self.yaw_rate
                .compute(self.receiver.rudder_rate(), sample.rate(Axis::Yaw), dt);

        self.apply_motor_mix(throttle);
    }

    /// Zeroes all corrections, clears every controller accumulator across
    /// both mode families, and re-applies the mixer at the given throttle.
    ///
    /// Invoke whenever throttle is forced to idle (disarm) so no windup
    /// survives into the next arm cycle. This is the only path that clears
    /// accumulator state outside normal computes.
    pub fn reset_pid(&mut self, throttle: T) {
        self.roll_correction = T::zero();
        self.pitch_correction = T::zero();
        self.yaw_correction = T::zero();

        self.roll_position_angle.reset();
        self.pitch_position_angle.reset();
        self.roll_rate_angle.reset();
        self.pitch_rate_angle.reset();
        self.roll_rate_accro.reset();
        self.pitch_rate_accro.reset();
        self.yaw_rate.reset();

        self.apply_motor_mix(throttle);
    }

    /// Forces the motor driver to its idle output.
    pub fn idle(&mut self) {
        self.motors.idle();
    }

    /// The last computed per-axis corrections `(roll, pitch, yaw)`.
    pub fn corrections(&self) -> (T, T, T) {
        (
            self.roll_correction,
            self.pitch_correction,
            self.yaw_correction,
        )
    }

    /// The motor driver handed over at construction.
    pub fn motors(&self) -> &M {
        &self.motors
    }

    /// The attitude provider handed over at construction.
    pub fn attitude(&self) -> &A {
        &self.attitude
    }

    /// The receiver handed over at construction.
    ///
    /// The embedding control loop reads throttle and mode selection from
    /// the same link, so it keeps access to the device here.
    pub fn receiver(&self) -> &R {
        &self.receiver
    }

    /// Logs the Accro-family gain triples and the mixing coefficient.
    pub fn report_accro_parameters(&self) {
        log::info!("accro mode settings:");
        log::info!("  {}", self.roll_rate_accro);
        log::info!("  {}", self.pitch_rate_accro);
        log::info!("  {}", self.yaw_rate);
        log::info!("  mixing: {}", self.mixer.mixing());
    }

    /// Logs the Angle-family gain triples, the attitude filter
    /// characteristics for the given sample interval, and the mixing
    /// coefficient.
    pub fn report_angle_parameters(&self, sample_interval: T) {
        log::info!("angle mode settings:");
        log::info!("  {}", self.roll_position_angle);
        log::info!("  {}", self.pitch_position_angle);
        log::info!("  {}", self.roll_rate_angle);
        log::info!("  {}", self.pitch_rate_angle);
        log::info!("  {}", self.yaw_rate);
        log::info!(
            "  attitude filter coefficient: {} time constant: {} s",
            self.attitude.filter_coefficient(),
            self.attitude.filter_time_constant(sample_interval)
        );
        log::info!("  mixing: {}", self.mixer.mixing());
    }

    /// Single exit point of every cascade and of the reset discipline.
    fn apply_motor_mix(&mut self, throttle: T) {
        let commands = self.mixer.mix(
            throttle,
            self.roll_correction,
            self.pitch_correction,
            self.yaw_correction,
        );
        for (motor, command) in commands.iter().enumerate() {
            self.motors.write(motor, *command);
        }
    }

    fn report_power_envelope(&self) {
        let max_power = self.motors.max_power();
        let max_throttle = self.motors.max_throttle();
        match PowerEnvelope::classify(max_power, max_throttle, &self.config) {
            PowerEnvelope::Flight => log::info!("flight-capable power envelope"),
            PowerEnvelope::Debug => log::info!("reduced power envelope, bench use only"),
            PowerEnvelope::Unexpected => log::warn!("power envelope outside known ranges"),
        }
        log::info!("max power: {} max throttle: {}", max_power, max_throttle);
    }

    fn calibrated_yaw_gains<P: AnalogInput<T>>(&mut self, analog: &mut P) -> PidGains<T> {
        let mut gains = self.config.yaw_rate_gains;
        if let Some(YawGainCalibration {
            channel,
            raw_full_scale,
            kp_full_scale,
        }) = self.config.yaw_gain_calibration
        {
            let raw = analog.read(channel);
            gains.kp = raw * kp_full_scale / raw_full_scale;
            log::info!("yaw rate kp calibrated to {}", gains.kp);
        }
        gains
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::AttitudeSample;
    use crate::test_utils::*;

    type TestController = StabilizationController<f32, MockMotorDriver, MockAttitude, MockReceiver>;

    /// Pure proportional configuration for deterministic outputs.
    fn test_config() -> StabilizationConfig<f32> {
        let mut config = StabilizationConfig::<f32>::new();
        config.angle_position_gains = PidGains::new(2.0, 0.0, 0.0);
        config.angle_rate_gains = PidGains::new(1.0, 0.0, 0.0);
        config.accro_rate_gains = PidGains::new(1.0, 0.0, 0.0);
        config.yaw_rate_gains = PidGains::new(1.0, 0.0, 0.0);
        config.mixing = 1.0;
        config.integral_limit = 25.0;
        config.idle_throttle = 1000.0;
        config.flight_power = 1860.0;
        config.flight_throttle_ratio = 0.8;
        config.debug_power_ceiling = 1300.0;
        config
    }

    fn make_controller(
        config: StabilizationConfig<f32>,
        attitude_sample: AttitudeSample<f32>,
        receiver: MockReceiver,
    ) -> TestController {
        let motors = MockMotorDriver {
            max_power: 1860.0,
            max_throttle: 1500.0,
            ..Default::default()
        };
        let attitude = MockAttitude {
            sample: attitude_sample,
            coefficient: 0.98,
            ..Default::default()
        };
        StabilizationController::new(config, motors, attitude, receiver)
            .expect("test configuration should validate")
    }

    fn run_init(controller: &mut TestController) -> (MockSensorBus, MockWatchdog, MockDelay, MockAnalog) {
        let mut bus = MockSensorBus::default();
        let mut watchdog = MockWatchdog::default();
        let mut delay = MockDelay::default();
        let mut analog = MockAnalog::default();
        controller.init(&mut bus, &mut watchdog, &mut delay, &mut analog);
        (bus, watchdog, delay, analog)
    }

    /// N not-ready polls cost N retry iterations: idle output, watchdog
    /// service, and the fixed delay exactly once each per iteration.
    #[test]
    fn test_init_retry_until_receiver_ready() {
        let receiver = MockReceiver {
            ready_after: 3,
            ..Default::default()
        };
        let mut controller = make_controller(test_config(), AttitudeSample::default(), receiver);
        let (bus, watchdog, delay, _) = run_init(&mut controller);

        assert_eq!(controller.receiver().polls.get(), 4);
        assert_eq!(controller.motors().init_calls, 1);
        assert_eq!(controller.motors().idle_calls, 3);
        assert_eq!(watchdog.resets, 3);
        assert_eq!(delay.calls, 3);
        assert_eq!(delay.total_ms, 3 * RECEIVER_RETRY_DELAY_MS);
        assert_eq!(bus.init_calls, 1);
        assert_eq!(bus.clock_hz, Some(SENSOR_BUS_CLOCK_HZ));
        assert_eq!(controller.attitude().init_calls, 1);
    }

    /// A ready receiver completes initialization on the first poll with
    /// no retry work.
    #[test]
    fn test_init_immediate_when_receiver_ready() {
        let mut controller = make_controller(
            test_config(),
            AttitudeSample::default(),
            MockReceiver::default(),
        );
        let (_, watchdog, delay, _) = run_init(&mut controller);

        assert_eq!(controller.receiver().polls.get(), 1);
        assert_eq!(controller.motors().idle_calls, 0);
        assert_eq!(watchdog.resets, 0);
        assert_eq!(delay.total_ms, 0);
    }

    /// Initialization loads each gain set into its own mode family.
    #[test]
    fn test_init_loads_mode_gains() {
        let mut config = test_config();
        config.angle_position_gains = PidGains::new(2.0, 0.3, 0.01);
        config.angle_rate_gains = PidGains::new(1.2, 0.25, 0.002);
        config.accro_rate_gains = PidGains::new(0.9, 0.2, 0.001);
        config.yaw_rate_gains = PidGains::new(0.5, 0.05, 0.0);

        let mut controller =
            make_controller(config, AttitudeSample::default(), MockReceiver::default());
        let _ = run_init(&mut controller);

        assert_eq!(
            controller.roll_position_angle.gains(),
            config.angle_position_gains
        );
        assert_eq!(
            controller.pitch_position_angle.gains(),
            config.angle_position_gains
        );
        assert_eq!(controller.roll_rate_angle.gains(), config.angle_rate_gains);
        assert_eq!(controller.pitch_rate_angle.gains(), config.angle_rate_gains);
        assert_eq!(controller.roll_rate_accro.gains(), config.accro_rate_gains);
        assert_eq!(controller.pitch_rate_accro.gains(), config.accro_rate_gains);
        assert_eq!(controller.yaw_rate.gains(), config.yaw_rate_gains);
    }

    /// The analog calibration is read exactly once and linearly mapped
    /// onto the yaw proportional gain, keeping the configured ki and kd.
    #[test]
    fn test_init_analog_yaw_calibration() {
        let mut config = test_config();
        config.yaw_rate_gains = PidGains::new(0.5, 0.05, 0.0002);
        config.yaw_gain_calibration = Some(YawGainCalibration {
            channel: 0,
            raw_full_scale: 1023.0,
            kp_full_scale: 500.0,
        });

        let mut controller =
            make_controller(config, AttitudeSample::default(), MockReceiver::default());
        let mut bus = MockSensorBus::default();
        let mut watchdog = MockWatchdog::default();
        let mut delay = MockDelay::default();
        let mut analog = MockAnalog {
            value: 100.0,
            ..Default::default()
        };
        controller.init(&mut bus, &mut watchdog, &mut delay, &mut analog);

        assert_eq!(analog.reads, 1);
        assert_eq!(analog.last_channel, Some(0));
        let gains = controller.yaw_rate.gains();
        assert!(value_close(100.0 * 500.0 / 1023.0, gains.kp));
        assert!(value_close(0.05, gains.ki));
        assert!(value_close(0.0002, gains.kd));
    }

    /// Without a calibration entry the analog input is never touched.
    #[test]
    fn test_init_no_calibration_skips_analog() {
        let mut controller = make_controller(
            test_config(),
            AttitudeSample::default(),
            MockReceiver::default(),
        );
        let (_, _, _, analog) = run_init(&mut controller);

        assert_eq!(analog.reads, 0);
        assert!(value_close(1.0, controller.yaw_rate.gains().kp));
    }

    #[test]
    fn test_power_envelope_classification() {
        let config = test_config();

        assert_eq!(
            PowerEnvelope::classify(1860.0, 1500.0, &config),
            PowerEnvelope::Flight
        );
        // Throttle below 80% of full power is not flight-capable.
        assert_eq!(
            PowerEnvelope::classify(1860.0, 1400.0, &config),
            PowerEnvelope::Unexpected
        );
        assert_eq!(
            PowerEnvelope::classify(1200.0, 1100.0, &config),
            PowerEnvelope::Debug
        );
        assert_eq!(
            PowerEnvelope::classify(1500.0, 1400.0, &config),
            PowerEnvelope::Unexpected
        );
    }

    /// Accro mode single-stage known values, through the mixer.
    #[test]
    fn test_accro_known_output() {
        let receiver = MockReceiver {
            aileron_rate: 10.0,
            elevator_rate: -5.0,
            rudder_rate: 2.0,
            ..Default::default()
        };
        let sample = AttitudeSample {
            angles: [0.0, 0.0, 0.0],
            rates: [1.0, 1.0, 1.0],
        };
        let mut controller = make_controller(test_config(), sample, receiver);
        let _ = run_init(&mut controller);

        controller.tick(FlightMode::Accro, 0.01, 1500.0);

        assert!(vector_close((9.0, -6.0, 1.0), controller.corrections()));
        assert_eq!(controller.motors().writes, 4);
        let commands = controller.motors().last_commands;
        assert!(value_close(1514.0, commands[0]));
        assert!(value_close(1498.0, commands[1]));
        assert!(value_close(1484.0, commands[2]));
        assert!(value_close(1504.0, commands[3]));
    }

    /// Angle mode cascade wiring: the position loop's output is the rate
    /// loop's setpoint.
    #[test]
    fn test_angle_cascade_wiring() {
        let receiver = MockReceiver {
            aileron_angle: 10.0,
            ..Default::default()
        };
        let sample = AttitudeSample {
            angles: [5.0, 0.0, 0.0],
            rates: [0.0, 0.0, 0.0],
        };
        let mut controller = make_controller(test_config(), sample, receiver);
        let _ = run_init(&mut controller);

        controller.tick(FlightMode::Angle, 0.01, 1500.0);

        // Outer: (10 - 5) * 2 = 10; inner: (10 - 0) * 1 = 10.
        assert!(vector_close((10.0, 0.0, 0.0), controller.corrections()));
        let commands = controller.motors().last_commands;
        assert!(value_close(1510.0, commands[0]));
        assert!(value_close(1490.0, commands[1]));
        assert!(value_close(1490.0, commands[2]));
        assert!(value_close(1510.0, commands[3]));
    }

    /// With the commanded angle equal to the measured angle and zero
    /// rates, a pure proportional configuration stays at zero correction.
    #[test]
    fn test_angle_equilibrium() {
        let receiver = MockReceiver {
            aileron_angle: 7.0,
            elevator_angle: -3.0,
            ..Default::default()
        };
        let sample = AttitudeSample {
            angles: [7.0, -3.0, 0.0],
            rates: [0.0, 0.0, 0.0],
        };
        let mut controller = make_controller(test_config(), sample, receiver);
        let _ = run_init(&mut controller);

        for _ in 0..50 {
            controller.tick(FlightMode::Angle, 0.01, 1500.0);
        }

        assert!(vector_close((0.0, 0.0, 0.0), controller.corrections()));
        for command in controller.motors().last_commands {
            assert!(value_close(1500.0, command));
        }
    }

    /// `reset_pid` at idle throttle yields four motor commands equal to
    /// idle, regardless of prior controller state.
    #[test]
    fn test_reset_pid_idle_invariant() {
        let receiver = MockReceiver {
            aileron_rate: 50.0,
            elevator_rate: -30.0,
            rudder_rate: 20.0,
            ..Default::default()
        };
        let sample = AttitudeSample {
            angles: [10.0, -10.0, 0.0],
            rates: [5.0, 5.0, 5.0],
        };
        let mut config = test_config();
        config.accro_rate_gains = PidGains::new(1.0, 0.5, 0.01);
        config.yaw_rate_gains = PidGains::new(1.0, 0.5, 0.01);
        let mut controller = make_controller(config, sample, receiver);
        let _ = run_init(&mut controller);

        for _ in 0..10 {
            controller.tick(FlightMode::Accro, 0.01, 1500.0);
        }
        controller.reset_pid(1000.0);

        assert!(vector_close((0.0, 0.0, 0.0), controller.corrections()));
        for command in controller.motors().last_commands {
            assert!(value_close(1000.0, command));
        }
    }

    /// A tick at idle throttle runs the reset discipline instead of a
    /// cascade: no attitude sample is taken and motors carry idle.
    #[test]
    fn test_tick_at_idle_throttle_resets() {
        let receiver = MockReceiver {
            aileron_rate: 50.0,
            ..Default::default()
        };
        let mut controller = make_controller(test_config(), AttitudeSample::default(), receiver);
        let _ = run_init(&mut controller);

        let samples_before = controller.attitude().samples;
        controller.tick(FlightMode::Accro, 0.01, 1000.0);

        assert_eq!(controller.attitude().samples, samples_before);
        for command in controller.motors().last_commands {
            assert!(value_close(1000.0, command));
        }
    }

    /// After `reset_pid`, every controller computes as if freshly
    /// constructed.
    #[test]
    fn test_reset_pid_completeness() {
        let mut config = test_config();
        config.accro_rate_gains = PidGains::new(1.0, 0.5, 0.02);
        config.angle_position_gains = PidGains::new(2.0, 0.4, 0.01);
        config.angle_rate_gains = PidGains::new(1.0, 0.3, 0.01);
        config.yaw_rate_gains = PidGains::new(1.0, 0.5, 0.02);

        let receiver = MockReceiver {
            aileron_angle: 10.0,
            aileron_rate: 10.0,
            elevator_angle: -5.0,
            elevator_rate: -5.0,
            rudder_rate: 2.0,
            ..Default::default()
        };
        let sample = AttitudeSample {
            angles: [5.0, 5.0, 0.0],
            rates: [1.0, -1.0, -1.0],
        };

        let mut driven = make_controller(config, sample, receiver);
        let _ = run_init(&mut driven);
        for _ in 0..10 {
            driven.tick(FlightMode::Angle, 0.01, 1500.0);
            driven.tick(FlightMode::Accro, 0.01, 1500.0);
        }
        driven.reset_pid(1000.0);

        let receiver = MockReceiver {
            aileron_angle: 10.0,
            aileron_rate: 10.0,
            elevator_angle: -5.0,
            elevator_rate: -5.0,
            rudder_rate: 2.0,
            ..Default::default()
        };
        let mut fresh = make_controller(config, sample, receiver);
        let _ = run_init(&mut fresh);

        driven.tick(FlightMode::Angle, 0.01, 1500.0);
        fresh.tick(FlightMode::Angle, 0.01, 1500.0);
        assert!(vector_close(fresh.corrections(), driven.corrections()));

        driven.tick(FlightMode::Accro, 0.01, 1500.0);
        fresh.tick(FlightMode::Accro, 0.01, 1500.0);
        assert!(vector_close(fresh.corrections(), driven.corrections()));
    }

    fn isolation_receiver() -> MockReceiver {
        MockReceiver {
            aileron_angle: 10.0,
            aileron_rate: 10.0,
            elevator_angle: -5.0,
            elevator_rate: -5.0,
            rudder_rate: 2.0,
            ..Default::default()
        }
    }

    /// Accro-family gains must not leak into Angle-mode outputs, and
    /// Angle-family gains must not leak into Accro-mode outputs.
    #[test]
    fn test_mode_family_isolation() {
        let sample = AttitudeSample {
            angles: [5.0, 5.0, 0.0],
            rates: [1.0, -1.0, -1.0],
        };

        let mut baseline = make_controller(test_config(), sample, isolation_receiver());
        let _ = run_init(&mut baseline);

        let mut accro_retuned_config = test_config();
        accro_retuned_config.accro_rate_gains = PidGains::new(5.0, 0.1, 0.01);
        let mut accro_retuned = make_controller(accro_retuned_config, sample, isolation_receiver());
        let _ = run_init(&mut accro_retuned);

        baseline.tick(FlightMode::Angle, 0.01, 1500.0);
        accro_retuned.tick(FlightMode::Angle, 0.01, 1500.0);
        assert!(vector_close(
            baseline.corrections(),
            accro_retuned.corrections()
        ));

        let mut angle_retuned_config = test_config();
        angle_retuned_config.angle_position_gains = PidGains::new(9.0, 0.5, 0.1);
        angle_retuned_config.angle_rate_gains = PidGains::new(7.0, 0.5, 0.1);
        let mut angle_retuned = make_controller(angle_retuned_config, sample, isolation_receiver());
        let _ = run_init(&mut angle_retuned);

        baseline.reset_pid(1000.0);
        baseline.tick(FlightMode::Accro, 0.01, 1500.0);
        angle_retuned.tick(FlightMode::Accro, 0.01, 1500.0);
        assert!(vector_close(
            baseline.corrections(),
            angle_retuned.corrections()
        ));
    }

    /// The yaw rate controller is one shared instance: both modes produce
    /// the same output from the same state, and its accumulator carries
    /// across mode switches without resetting.
    #[test]
    fn test_shared_yaw_controller() {
        let mut config = test_config();
        config.yaw_rate_gains = PidGains::new(1.0, 1.0, 0.0);

        let receiver = MockReceiver {
            rudder_rate: 4.0,
            ..Default::default()
        };
        let sample = AttitudeSample {
            angles: [0.0, 0.0, 0.0],
            rates: [0.0, 0.0, 1.0],
        };
        let mut controller = make_controller(config, sample, receiver);
        let _ = run_init(&mut controller);

        // Constant yaw error of 3 at dt = 0.01.
        controller.tick(FlightMode::Accro, 0.01, 1500.0);
        let first = controller.corrections().2;
        controller.tick(FlightMode::Angle, 0.01, 1500.0);
        let second = controller.corrections().2;

        assert!(value_close(3.0 + 0.03, first));
        assert!(value_close(3.0 + 0.06, second));

        // A fresh instance reaches the same first output through the
        // other mode.
        let receiver = MockReceiver {
            rudder_rate: 4.0,
            ..Default::default()
        };
        let mut other = make_controller(config, sample, receiver);
        let _ = run_init(&mut other);
        other.tick(FlightMode::Angle, 0.01, 1500.0);
        assert!(value_close(first, other.corrections().2));
    }

    /// Gain reports run without touching control state.
    #[test]
    fn test_reports_leave_state_untouched() {
        let mut controller = make_controller(
            test_config(),
            AttitudeSample::default(),
            MockReceiver::default(),
        );
        let _ = run_init(&mut controller);

        controller.report_accro_parameters();
        controller.report_angle_parameters(0.00249);

        assert!(vector_close((0.0, 0.0, 0.0), controller.corrections()));
        assert_eq!(controller.attitude().samples, 0);
    }
}
