// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use super::vec::{vec_cross, vec_equal, vec_interp, vec_subtract};
use crate::Loc;

/// Tolerance used when deciding that an intersection falls on a segment end.
const ENDPOINT_EPSILON: f64 = 1e-8;

/// Returns the point where segments `a` and `b` cross, if any.
///
/// Parallel segments never intersect, and neither do segments where the
/// start of `b` lies on the infinite line through `a` (zero numerator); the
/// second case keeps shared-line touches from being reported as crossings.
/// Crossings at the exact segment ends (`t` or `u` of 0 or 1) are included.
#[must_use]
pub fn line_intersection(a: [Loc; 2], b: [Loc; 2]) -> Option<Loc> {
    let [p, p2] = a;
    let [q, q2] = b;
    let r = vec_subtract(p2, p);
    let s = vec_subtract(q2, q);
    let qp = vec_subtract(q, p);
    let u_numerator = vec_cross(qp, r);
    let denominator = vec_cross(r, s);
    if u_numerator == 0.0 || denominator == 0.0 || denominator.is_nan() {
        return None;
    }
    let u = u_numerator / denominator;
    let t = vec_cross(qp, s) / denominator;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        Some(vec_interp(p, p2, t))
    } else {
        None
    }
}

/// Projects `point` onto segment `[a, b]`.
///
/// Returns the closest point on the segment and the clamped parameter `t`
/// (`0.0` at `a`, `1.0` at `b`). A degenerate segment returns `a`.
#[must_use]
pub fn closest_point_on_segment(point: Loc, a: Loc, b: Loc) -> (Loc, f64) {
    let ab = vec_subtract(b, a);
    let len2 = ab[0] * ab[0] + ab[1] * ab[1];
    if len2 == 0.0 {
        return (a, 0.0);
    }
    let ap = vec_subtract(point, a);
    let t = ((ap[0] * ab[0] + ap[1] * ab[1]) / len2).clamp(0.0, 1.0);
    (vec_interp(a, b, t), t)
}

/// Tests whether the polyline through `nodes` crosses itself at a segment
/// touching the `active` node.
///
/// Only segments incident to `active` are tested against the remaining
/// segments; pairs that share an endpoint are connections, not crossings, and
/// hits within a tiny epsilon of a segment end are ignored.
#[must_use]
pub fn has_self_intersections<K: PartialEq>(nodes: &[(K, Loc)], active: &K) -> bool {
    let mut actives: Vec<[Loc; 2]> = Vec::new();
    let mut inactives: Vec<[Loc; 2]> = Vec::new();
    for pair in nodes.windows(2) {
        let (id1, loc1) = &pair[0];
        let (id2, loc2) = &pair[1];
        let segment = [*loc1, *loc2];
        if id1 == active || id2 == active {
            actives.push(segment);
        } else {
            inactives.push(segment);
        }
    }

    for p in &actives {
        for q in &inactives {
            if vec_equal(p[1], q[0], 0.0)
                || vec_equal(p[0], q[1], 0.0)
                || vec_equal(p[0], q[0], 0.0)
                || vec_equal(p[1], q[1], 0.0)
            {
                continue;
            }
            let Some(hit) = line_intersection(*p, *q) else {
                continue;
            };
            let at_end = [p[0], p[1], q[0], q[1]]
                .iter()
                .any(|end| vec_equal(*end, hit, ENDPOINT_EPSILON));
            if !at_end {
                return true;
            }
        }
    }
    false
}
