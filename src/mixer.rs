// src/mixer.rs

//! # X-Frame Motor Mixer
//!
//! Distributes throttle plus the three orthogonal axis corrections across
//! the four motors of an X-frame quadrotor. The mixer is pure arithmetic:
//! it performs no clamping, leaving saturation to the motor driver.

use crate::Number;

/// Number of motors in the X-frame layout.
pub const MOTOR_COUNT: usize = 4;

//    X configuration, motors 0 and 2 spin counter-clockwise:
//
//  ESC0(CCW)  ESC1
//         \  /
//         /  \
//     ESC3   ESC2(CCW)
//
/// Motor mixing matrix for the X-frame layout.
#[derive(Debug, Clone, Copy)]
pub struct MotorMixer<T> {
    mixing: T,
}

impl<T: Number> MotorMixer<T> {
    /// Creates a mixer with the given mixing coefficient.
    pub fn new(mixing: T) -> Self {
        MotorMixer { mixing }
    }

    /// The mixing coefficient, for diagnostics.
    pub fn mixing(&self) -> T {
        self.mixing
    }

    /// Computes the four motor commands from throttle and the per-axis
    /// corrections.
    ///
    /// With all corrections zero, every output equals `throttle` exactly.
    pub fn mix(&self, throttle: T, roll: T, pitch: T, yaw: T) -> [T; MOTOR_COUNT] {
        let m = self.mixing;
        [
            throttle - pitch * m + roll * m - yaw * m,
            throttle - pitch * m - roll * m + yaw * m,
            throttle + pitch * m - roll * m - yaw * m,
            throttle + pitch * m + roll * m + yaw * m,
        ]
    }
}
