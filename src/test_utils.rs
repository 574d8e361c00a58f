// src/test_utils.rs

//! This module contains utilities for testing: floating-point closeness
//! helpers and mock collaborator devices with call counters.

use crate::device::{
    AnalogInput, AttitudeProvider, AttitudeSample, MotorDriver, ReceiverInput, SensorBus, Watchdog,
};
use crate::mixer::MOTOR_COUNT;
use core::cell::Cell;
use embedded_hal::delay::DelayNs;

/// A constant defining the tolerance within which floating-point values
/// are considered close enough to be equal.
///
/// Sized for PWM-scale magnitudes (around 1500), not unit-scale values.
pub const TEST_TOLERANCE: f32 = 1e-3;

/// Checks if two floating point numbers are close enough to be considered
/// equal.
pub fn value_close(target: f32, value: f32) -> bool {
    (target - value).abs() < TEST_TOLERANCE
}

/// Checks if each of the components in a vector is close enough to be
/// considered equal.
pub fn vector_close(target: (f32, f32, f32), value: (f32, f32, f32)) -> bool {
    value_close(target.0, value.0)
        && value_close(target.1, value.1)
        && value_close(target.2, value.2)
}

/// Mock ESC driver recording every interaction.
#[derive(Debug, Default)]
pub struct MockMotorDriver {
    pub max_power: f32,
    pub max_throttle: f32,
    pub init_calls: usize,
    pub idle_calls: usize,
    pub writes: usize,
    pub last_commands: [f32; MOTOR_COUNT],
}

impl MotorDriver<f32> for MockMotorDriver {
    fn init(&mut self) {
        self.init_calls += 1;
    }

    fn idle(&mut self) {
        self.idle_calls += 1;
    }

    fn write(&mut self, motor: usize, value: f32) {
        self.writes += 1;
        self.last_commands[motor] = value;
    }

    fn max_power(&self) -> f32 {
        self.max_power
    }

    fn max_throttle(&self) -> f32 {
        self.max_throttle
    }
}

/// Mock attitude source returning a fixed sample.
#[derive(Debug, Default)]
pub struct MockAttitude {
    pub sample: AttitudeSample<f32>,
    pub coefficient: f32,
    pub init_calls: usize,
    pub samples: usize,
}

impl AttitudeProvider<f32> for MockAttitude {
    fn init(&mut self) {
        self.init_calls += 1;
    }

    fn sample(&mut self, _dt: f32) -> AttitudeSample<f32> {
        self.samples += 1;
        self.sample
    }

    fn filter_coefficient(&self) -> f32 {
        self.coefficient
    }

    fn filter_time_constant(&self, sample_interval: f32) -> f32 {
        self.coefficient * sample_interval / (1.0 - self.coefficient)
    }
}

/// Mock receiver that reports not-ready for a configurable number of
/// polls, then ready forever. `is_ready` takes `&self`, hence the `Cell`.
#[derive(Debug, Default)]
pub struct MockReceiver {
    pub ready_after: usize,
    pub polls: Cell<usize>,
    pub aileron_angle: f32,
    pub aileron_rate: f32,
    pub elevator_angle: f32,
    pub elevator_rate: f32,
    pub rudder_rate: f32,
}

impl ReceiverInput<f32> for MockReceiver {
    fn is_ready(&self) -> bool {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);
        polls > self.ready_after
    }

    fn aileron_angle(&self) -> f32 {
        self.aileron_angle
    }

    fn aileron_rate(&self) -> f32 {
        self.aileron_rate
    }

    fn elevator_angle(&self) -> f32 {
        self.elevator_angle
    }

    fn elevator_rate(&self) -> f32 {
        self.elevator_rate
    }

    fn rudder_rate(&self) -> f32 {
        self.rudder_rate
    }
}

/// Mock sensor bus recording the configured clock rate.
#[derive(Debug, Default)]
pub struct MockSensorBus {
    pub clock_hz: Option<u32>,
    pub init_calls: usize,
}

impl SensorBus for MockSensorBus {
    fn init(&mut self, clock_hz: u32) {
        self.clock_hz = Some(clock_hz);
        self.init_calls += 1;
    }
}

/// Mock hardware watchdog counting services.
#[derive(Debug, Default)]
pub struct MockWatchdog {
    pub resets: usize,
}

impl Watchdog for MockWatchdog {
    fn reset(&mut self) {
        self.resets += 1;
    }
}

/// Mock analog input returning a fixed raw value.
#[derive(Debug, Default)]
pub struct MockAnalog {
    pub value: f32,
    pub reads: usize,
    pub last_channel: Option<u8>,
}

impl AnalogInput<f32> for MockAnalog {
    fn read(&mut self, channel: u8) -> f32 {
        self.reads += 1;
        self.last_channel = Some(channel);
        self.value
    }
}

/// Mock delay provider accumulating requested milliseconds instead of
/// sleeping.
#[derive(Debug, Default)]
pub struct MockDelay {
    pub calls: usize,
    pub total_ms: u32,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.calls += 1;
        self.total_ms += ms;
    }
}
