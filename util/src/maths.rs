//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Degrees in a full turn
const FULL_TURN_DEG: f64 = 360.0;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Clamp a value into `[min, max]`, returning the clamped value and whether the limit was hit.
pub fn clamp<T>(value: T, min: T, max: T) -> (T, bool)
where
    T: PartialOrd + Copy
{
    if value > max {
        (max, true)
    }
    else if value < min {
        (min, true)
    }
    else {
        (value, false)
    }
}

/// Calculates the least nonnegative remainder of `lhs (mod rhs)`.
///
/// Floating point round-off can produce `r == rhs.abs()` when `lhs` is a tiny negative number.
pub fn rem_euclid<T>(lhs: T, rhs: T) -> T
where
    T: Float
{
    let r = lhs % rhs;
    if r < T::zero() { r + rhs.abs() } else { r }
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn wrap_deg_360(angle_deg: f64) -> f64 {
    let wrapped = rem_euclid(angle_deg, FULL_TURN_DEG);

    // Round-off can land exactly on 360
    if wrapped >= FULL_TURN_DEG {
        0.0
    }
    else {
        wrapped
    }
}

/// Get the shortest signed angular distance from `from_deg` to `to_deg` in degrees.
///
/// The result lies in `[-180, 180]`, positive values being clockwise (to the right for a compass
/// heading).
pub fn ang_diff_deg(from_deg: f64, to_deg: f64) -> f64 {
    let d = wrap_deg_360(to_deg - from_deg);

    if d > FULL_TURN_DEG / 2.0 {
        d - FULL_TURN_DEG
    }
    else {
        d
    }
}

/// Compass bearing in degrees `[0, 360)` of the vector `(north, east)`.
pub fn bearing_deg(north: f64, east: f64) -> f64 {
    wrap_deg_360(east.atan2(north).to_degrees())
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
