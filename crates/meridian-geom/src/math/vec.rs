// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::Loc;

/// Component-wise `a - b`.
#[must_use]
pub fn vec_subtract(a: Loc, b: Loc) -> Loc {
    [a[0] - b[0], a[1] - b[1]]
}

/// 2D cross product (z component of `a × b`).
#[must_use]
pub fn vec_cross(a: Loc, b: Loc) -> f64 {
    a[0] * b[1] - a[1] * b[0]
}

/// Linear interpolation `a + (b - a) * t`; `t` outside `[0, 1]` extrapolates.
#[must_use]
pub fn vec_interp(a: Loc, b: Loc, t: f64) -> Loc {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t]
}

/// Component-wise equality within `epsilon` (inclusive).
///
/// Pass `0.0` for exact comparison.
#[must_use]
pub fn vec_equal(a: Loc, b: Loc, epsilon: f64) -> bool {
    if epsilon == 0.0 {
        #[allow(clippy::float_cmp)]
        return a[0] == b[0] && a[1] == b[1];
    }
    (a[0] - b[0]).abs() <= epsilon && (a[1] - b[1]).abs() <= epsilon
}
