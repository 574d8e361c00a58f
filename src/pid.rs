// src/pid.rs

//! # Axis PID Control Module
//!
//! This module provides the single-axis feedback law used throughout the
//! stabilization core. Every control loop in the system, whether a rate
//! loop or an angle position loop of the self-leveling cascade, is an
//! [`AxisController`] instance: a [`piddiy::PidController`] driven by one
//! shared compute callback, plus the gain and reset surface the
//! orchestrator needs.

use crate::Number;
use core::fmt;
use piddiy::PidController;

/// Proportional, integral, and derivative gain triple for one control loop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PidGains<T> {
    /// Proportional gain.
    pub kp: T,
    /// Integral gain.
    pub ki: T,
    /// Derivative gain.
    pub kd: T,
}

impl<T: Number> PidGains<T> {
    /// Creates a gain triple from its three coefficients.
    pub fn new(kp: T, ki: T, kd: T) -> Self {
        PidGains { kp, ki, kd }
    }
}

/// Control data for the axis compute callback.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AxisControlData<T> {
    /// The measured value the setpoint is compared against.
    pub measurement: T,
    /// The time delta since the last computation.
    pub dt: T,
    /// The maximum allowed magnitude of the integral term, used to prevent
    /// integral windup.
    pub integral_limit: T,
}

/// Axis PID compute callback.
///
/// Error derivative, accumulator clamped to the integral limit. The same
/// law serves position and rate loops; only the setpoint/measurement pair
/// fed to it differs.
pub fn compute_axis<T: Number>(
    pid: &mut PidController<T, AxisControlData<T>>,
    data: AxisControlData<T>,
) -> (T, T, T) {
    let error = pid.set_point - data.measurement;
    let integral =
        (pid.integral + error * data.dt).clamp(-data.integral_limit, data.integral_limit);
    let derivative = (error - pid.error) / data.dt;

    (error, integral, derivative)
}

/// Single-axis PID feedback controller.
///
/// Owns its accumulator and previous-error state. Instances are created
/// once at startup, mutated on every compute, and cleared only through
/// [`AxisController::reset`].
pub struct AxisController<T: Number> {
    name: &'static str,
    pid: PidController<T, AxisControlData<T>>,
    integral_limit: T,
}

impl<T: Number> AxisController<T> {
    /// Creates a controller with zeroed gains.
    ///
    /// The name identifies the loop in gain reports. Gains are loaded
    /// separately with [`AxisController::set_gains`] so that mode-family
    /// configuration stays an explicit initialization step.
    pub fn new(name: &'static str, integral_limit: T) -> Self {
        let mut pid: PidController<T, AxisControlData<T>> = PidController::new();
        pid.compute_fn(compute_axis)
            .kp(T::zero())
            .ki(T::zero())
            .kd(T::zero());

        AxisController {
            name,
            pid,
            integral_limit,
        }
    }

    /// Loads a gain triple.
    pub fn set_gains(&mut self, gains: PidGains<T>) {
        self.pid.kp(gains.kp).ki(gains.ki).kd(gains.kd);
    }

    /// Returns the currently loaded gain triple.
    pub fn gains(&self) -> PidGains<T> {
        PidGains {
            kp: self.pid.kp,
            ki: self.pid.ki,
            kd: self.pid.kd,
        }
    }

    /// Computes the correction for one tick.
    pub fn compute(&mut self, set_point: T, measurement: T, dt: T) -> T {
        self.pid.set_point(set_point);
        self.pid.compute(AxisControlData {
            measurement,
            dt,
            integral_limit: self.integral_limit,
        })
    }

    /// Clears the accumulator and previous-error state.
    ///
    /// After a reset the controller computes exactly as if freshly
    /// constructed with the same gains.
    pub fn reset(&mut self) {
        self.pid.integral = T::zero();
        self.pid.error = T::zero();
    }
}

impl<T: Number> fmt::Display for AxisController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: kp={} ki={} kd={}",
            self.name, self.pid.kp, self.pid.ki, self.pid.kd
        )
    }
}
