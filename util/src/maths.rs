//! Utility maths functions
//!
//! The value shaping functions in here ([`clamp_sym`], [`wrap_angle`] and
//! [`ramp_toward`]) are the building blocks of the waypoint controller's
//! command generation. They are pure and hold no state.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Clamp a value into the symmetric range `[-|limit|, |limit|]`.
///
/// The sign of `value` is preserved, and values already inside the range pass
/// through unchanged.
pub fn clamp_sym<T>(value: T, limit: T) -> T
where
    T: Float
{
    if value > T::zero() {
        value.min(limit.abs())
    }
    else {
        value.max(-limit.abs())
    }
}

/// Wrap an angle into the range `(-pi, pi]`.
///
/// The upper boundary is included and the lower one is not, so `pi` maps to
/// `pi` rather than `-pi`. Adding any whole number of turns to the input does
/// not change the result.
pub fn wrap_angle<T>(angle_rad: T) -> T
where
    T: Float
{
    let pi = T::from(std::f64::consts::PI).unwrap();
    let tau = T::from(std::f64::consts::TAU).unwrap();

    let mut a = angle_rad;

    while a > pi {
        a = a - tau;
    }
    while a <= -pi {
        a = a + tau;
    }

    a
}

/// Move `current` towards `target` by at most `max_step`.
///
/// If the target is within one step of the current value the target itself is
/// returned, so the ramp never overshoots.
pub fn ramp_toward<T>(current: T, target: T, max_step: T) -> T
where
    T: Float
{
    if current - target > max_step {
        current - max_step
    }
    else if target - current > max_step {
        current + max_step
    }
    else {
        target
    }
}
