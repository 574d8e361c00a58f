// src/config.rs

//! # Runtime Configuration Module
//!
//! Every tunable of the stabilization core lives in one explicit runtime
//! structure: per-mode gain triples, the mixing coefficient, the integral
//! limit, the idle throttle level, the power-envelope classification
//! thresholds, and the optional analog yaw-gain calibration. The structure
//! is validated once when the controller is constructed; nothing in the
//! per-tick path can fail on configuration.

use crate::pid::PidGains;
use crate::Number;
use core::fmt;

/// One-time analog calibration of the yaw rate proportional gain.
///
/// When present, the configured analog channel is read exactly once during
/// initialization and the raw value is linearly mapped from
/// `[0, raw_full_scale]` to `[0, kp_full_scale]` to become the yaw rate
/// loop's proportional gain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YawGainCalibration<T> {
    /// Analog channel to sample.
    pub channel: u8,
    /// Full-scale raw reading of the analog source.
    pub raw_full_scale: T,
    /// Proportional gain corresponding to a full-scale reading.
    pub kp_full_scale: T,
}

/// Configuration for all gain sets and stabilization settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizationConfig<T> {
    /// Gain triple for the Angle-mode roll and pitch position loops.
    pub angle_position_gains: PidGains<T>,
    /// Gain triple for the Angle-mode roll and pitch rate loops.
    pub angle_rate_gains: PidGains<T>,
    /// Gain triple for the Accro-mode roll and pitch rate loops.
    pub accro_rate_gains: PidGains<T>,
    /// Gain triple for the yaw rate loop shared by both modes.
    pub yaw_rate_gains: PidGains<T>,
    /// Optional startup override of the yaw proportional gain from an
    /// analog input. `None` uses `yaw_rate_gains` as configured.
    pub yaw_gain_calibration: Option<YawGainCalibration<T>>,
    /// Scale factor converting a per-axis correction into a per-motor
    /// power contribution.
    pub mixing: T,
    /// Upper limit for every integral term, preventing windup.
    pub integral_limit: T,
    /// Throttle level at or below which all corrections are zeroed and
    /// accumulators cleared before motor commands are computed.
    pub idle_throttle: T,
    /// Motor-driver maximum power that marks a flight-capable build.
    pub flight_power: T,
    /// Fraction of `flight_power` the maximum throttle must reach for the
    /// flight-capable classification.
    pub flight_throttle_ratio: T,
    /// Motor-driver maximum power at or below which the build is
    /// classified as a reduced-power bench setup.
    pub debug_power_ceiling: T,
}

impl<T: Number> StabilizationConfig<T> {
    /// Creates a new configuration with neutral default values.
    ///
    /// Defaults are zero or one placeholders; replace them with values
    /// tuned for the airframe before flight.
    ///
    /// Example Usage
    /// ```
    /// use quad_stabilization::config::{StabilizationConfig, YawGainCalibration};
    /// use quad_stabilization::pid::PidGains;
    ///
    /// let mut config = StabilizationConfig::<f32>::new();
    ///
    /// // Gain sets for both mode families.
    /// config.angle_position_gains = PidGains::new(2.0, 0.75, 0.0);
    /// config.angle_rate_gains = PidGains::new(0.18, 0.25, 0.0002);
    /// config.accro_rate_gains = PidGains::new(0.15, 0.2, 0.0002);
    /// config.yaw_rate_gains = PidGains::new(0.3, 0.05, 0.00015);
    ///
    /// // Yaw kp taken from a trim potentiometer at boot.
    /// config.yaw_gain_calibration = Some(YawGainCalibration {
    ///     channel: 0,
    ///     raw_full_scale: 1023.0,
    ///     kp_full_scale: 500.0,
    /// });
    ///
    /// // Mixing, windup protection, and the idle threshold.
    /// config.mixing = 0.9;
    /// config.integral_limit = 25.0;
    /// config.idle_throttle = 1000.0;
    ///
    /// // Power-envelope classification thresholds.
    /// config.flight_power = 1860.0;
    /// config.flight_throttle_ratio = 0.8;
    /// config.debug_power_ceiling = 1300.0;
    ///
    /// config.validate().expect("configuration should be valid");
    /// ```
    pub fn new() -> Self {
        StabilizationConfig {
            angle_position_gains: PidGains::new(T::one(), T::zero(), T::zero()),
            angle_rate_gains: PidGains::new(T::one(), T::zero(), T::zero()),
            accro_rate_gains: PidGains::new(T::one(), T::zero(), T::zero()),
            yaw_rate_gains: PidGains::new(T::one(), T::zero(), T::zero()),
            yaw_gain_calibration: None,
            mixing: T::one(),
            integral_limit: T::one(),
            idle_throttle: T::zero(),
            flight_power: T::one(),
            flight_throttle_ratio: T::one(),
            debug_power_ceiling: T::zero(),
        }
    }

    /// Validates the configuration.
    ///
    /// Run once at controller construction; per-tick code relies on these
    /// invariants and never re-checks them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.integral_limit <= T::zero() {
            return Err(ConfigError::NonPositiveIntegralLimit);
        }
        if self.mixing < T::zero() {
            return Err(ConfigError::NegativeMixing);
        }
        if self.idle_throttle < T::zero() {
            return Err(ConfigError::NegativeIdleThrottle);
        }
        if self.flight_throttle_ratio < T::zero() || T::one() < self.flight_throttle_ratio {
            return Err(ConfigError::ThrottleRatioOutOfRange);
        }
        if let Some(calibration) = &self.yaw_gain_calibration {
            if calibration.raw_full_scale <= T::zero() || calibration.kp_full_scale < T::zero() {
                return Err(ConfigError::DegenerateCalibrationRange);
            }
        }
        Ok(())
    }
}

impl<T: Number> Default for StabilizationConfig<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration rejection reasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The integral limit must be strictly positive.
    NonPositiveIntegralLimit,
    /// The mixing coefficient must not be negative.
    NegativeMixing,
    /// The idle throttle level must not be negative.
    NegativeIdleThrottle,
    /// The flight throttle ratio must lie in `[0, 1]`.
    ThrottleRatioOutOfRange,
    /// The analog calibration mapping range is empty or inverted.
    DegenerateCalibrationRange,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ConfigError::NonPositiveIntegralLimit => "integral limit must be positive",
            ConfigError::NegativeMixing => "mixing coefficient must not be negative",
            ConfigError::NegativeIdleThrottle => "idle throttle must not be negative",
            ConfigError::ThrottleRatioOutOfRange => "flight throttle ratio must be within [0, 1]",
            ConfigError::DegenerateCalibrationRange => "analog calibration range is degenerate",
        };
        f.write_str(reason)
    }
}
