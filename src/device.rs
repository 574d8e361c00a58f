// src/device.rs

//! # Collaborator Device Contracts
//!
//! Device-independent interfaces between the stabilization core and the
//! hardware it drives or reads. Production implementations bind these to
//! real peripherals (ESC PWM, IMU fusion, RC receiver, ADC, hardware
//! watchdog); test and simulation environments substitute mock
//! implementations, which is what keeps the control path host-testable.
//!
//! Delay injection deliberately reuses [`embedded_hal::delay::DelayNs`]
//! rather than defining another sleep trait here.

use crate::Number;

/// Rotation axis, also the index into [`AttitudeSample`] arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Roll, positive right wing down.
    Roll = 0,
    /// Pitch, positive nose up.
    Pitch = 1,
    /// Yaw, positive nose right.
    Yaw = 2,
}

/// One attitude estimate, produced once per control tick.
///
/// Roll and pitch angles are absolute with respect to the self-leveling
/// reference. The yaw angle slot is not tracked by the fusion filter and
/// must not be relied upon; only the yaw rate is meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttitudeSample<T> {
    /// Estimated angles, indexed by [`Axis`].
    pub angles: [T; 3],
    /// Measured angular rates, indexed by [`Axis`].
    pub rates: [T; 3],
}

impl<T: Number> AttitudeSample<T> {
    /// Estimated angle for one axis.
    pub fn angle(&self, axis: Axis) -> T {
        self.angles[axis as usize]
    }

    /// Measured angular rate for one axis.
    pub fn rate(&self, axis: Axis) -> T {
        self.rates[axis as usize]
    }
}

/// Four-motor ESC driver.
///
/// Motor indices follow the X-frame numbering used by the mixer: motors 0
/// and 2 spin counter-clockwise, 1 and 3 clockwise.
pub trait MotorDriver<T: Number> {
    /// Brings the driver up with a safe idle output on all motors.
    fn init(&mut self);

    /// Forces all motors to the idle output.
    fn idle(&mut self);

    /// Writes one motor command.
    ///
    /// The mixer performs no clamping; saturating `value` to the valid
    /// actuation range is this implementation's responsibility.
    fn write(&mut self, motor: usize, value: T);

    /// Configured maximum motor power, used only for the startup
    /// power-envelope diagnostic.
    fn max_power(&self) -> T;

    /// Configured maximum throttle, used only for the startup
    /// power-envelope diagnostic.
    fn max_throttle(&self) -> T;
}

/// Attitude estimation source (sensor fusion front-end).
pub trait AttitudeProvider<T: Number> {
    /// Starts the fusion filter and its sensors.
    fn init(&mut self);

    /// Produces the attitude estimate for this tick, integrating over the
    /// elapsed time `dt`.
    fn sample(&mut self, dt: T) -> AttitudeSample<T>;

    /// The fusion filter's blending coefficient, for diagnostics only.
    fn filter_coefficient(&self) -> T;

    /// The filter time constant in seconds for a given sample interval,
    /// for diagnostics only.
    fn filter_time_constant(&self, sample_interval: T) -> T;
}

/// Normalized pilot commands decoded from the radio link.
pub trait ReceiverInput<T: Number> {
    /// Whether a valid command link is established.
    fn is_ready(&self) -> bool;

    /// Commanded roll angle (Angle mode).
    fn aileron_angle(&self) -> T;

    /// Commanded roll rate (Accro mode).
    fn aileron_rate(&self) -> T;

    /// Commanded pitch angle (Angle mode).
    fn elevator_angle(&self) -> T;

    /// Commanded pitch rate (Accro mode).
    fn elevator_rate(&self) -> T;

    /// Commanded yaw rate (both modes; heading is not tracked).
    fn rudder_rate(&self) -> T;
}

/// Sensor bus bring-up.
pub trait SensorBus {
    /// Initializes the bus at the given clock rate in hertz.
    fn init(&mut self, clock_hz: u32);
}

/// Hardware watchdog service interface.
///
/// Must be fed at least once per iteration of any blocking wait, or the
/// watchdog forces a system reset.
pub trait Watchdog {
    /// Services the watchdog.
    fn reset(&mut self);
}

/// Blocking analog input, read once at startup for gain calibration.
pub trait AnalogInput<T: Number> {
    /// Reads one raw sample from the given channel.
    fn read(&mut self, channel: u8) -> T;
}
