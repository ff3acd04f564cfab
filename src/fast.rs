//! Fast approximate math used in the refinement criteria, where a
//! relative error of 1e-4 is irrelevant but the functions are called
//! for every candidate interval.
// See https://gist.github.com/aliakseis/3f92a73da2ea6c85683b58e9dced604c

use std::f64::consts::{FRAC_1_SQRT_2, FRAC_PI_2, FRAC_PI_4, PI, SQRT_2};

/// Approximation of `x.hypot(y)`.
pub fn hypot(x: f64, y: f64) -> f64 {
    let (x, y) = (x.abs(), y.abs());
    let (hi, lo) = if x >= y { (x, y) } else { (y, x) };
    if hi == 0. { return 0. }
    let r = lo / hi;
    if r > SQRT_2 - 1. {
        // Rotate by π/4 to bring the ratio back in the accurate range.
        let (s, d) = (hi + lo, hi - lo);
        let r = d / s;
        s * (1. + 0.5 * r * r) * FRAC_1_SQRT_2
    } else {
        hi * (1. + 0.5 * r * r)
    }
}

/// Rational approximation of atan on [-1, 1].
#[inline]
fn atan_unit(z: f64) -> f64 { z / (1. + 0.3211 * z * z) }

/// atan2 for a vector whose ratio |y/x| or |x/y| is ≤ tan(π/8).
fn atan2_near_axis(y: f64, x: f64) -> f64 {
    if x.abs() < y.abs() {
        let a = atan_unit(x / y);
        if y > 0. { FRAC_PI_2 - a } else { -FRAC_PI_2 - a }
    } else {
        let a = atan_unit(y / x);
        if x > 0. { a }
        else if y >= 0. { a + PI }
        else { a - PI }
    }
}

/// Approximation of `y.atan2(x)`.  The absolute error is below 1.2e-4.
pub fn atan2(y: f64, x: f64) -> f64 {
    const TAN_PI_8: f64 = 0.41421356237;
    if x == 0. {
        return if y > 0. { FRAC_PI_2 } else if y < 0. { -FRAC_PI_2 }
               else { 0. }
    }
    let (ax, ay) = (x.abs(), y.abs());
    let near_diagonal = if ax < ay { ax > TAN_PI_8 * ay }
                        else { ay > TAN_PI_8 * ax };
    if !near_diagonal {
        return atan2_near_axis(y, x)
    }
    // Work in axes rotated by π/4, where the vector is near an axis.
    let (xr, yr) = (x + y, y - x);
    let a = if xr.abs() < yr.abs() {
        let a = atan_unit(xr / yr);
        if yr > 0. { FRAC_PI_2 - a } else { -FRAC_PI_2 - a }
    } else {
        let a = atan_unit(yr / xr);
        if xr > 0. { a } else { a + PI }
    };
    let a = a + FRAC_PI_4;
    if a > PI { a - 2. * PI } else { a }
}

/// Unsigned angle (in [0, π]) between the directions `u` and `v`.
/// Returns 0 if one of them is the null vector.
pub fn turn(u: [f64; 2], v: [f64; 2]) -> f64 {
    let cross = u[0] * v[1] - u[1] * v[0];
    let dot = u[0] * v[0] + u[1] * v[1];
    atan2(cross.abs(), dot)
}
