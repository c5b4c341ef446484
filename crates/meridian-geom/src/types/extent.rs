// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
use crate::Loc;

/// Axis-aligned bounding box in lon/lat space.
///
/// Invariants:
/// - `min` components are less than or equal to `max` components.
/// - Values are `[lon, lat]` degrees.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Extent {
    min: Loc,
    max: Loc,
}

impl Extent {
    /// Builds the extent spanned by two arbitrary corners.
    ///
    /// The corners may be given in any order; components are sorted so the
    /// min/max invariant always holds.
    #[must_use]
    pub fn from_corners(a: Loc, b: Loc) -> Self {
        Self {
            min: [a[0].min(b[0]), a[1].min(b[1])],
            max: [a[0].max(b[0]), a[1].max(b[1])],
        }
    }

    /// Degenerate extent covering a single point.
    #[must_use]
    pub fn from_point(loc: Loc) -> Self {
        Self { min: loc, max: loc }
    }

    /// Builds the minimal extent that contains all `points`.
    ///
    /// Returns `None` when `points` is empty.
    #[must_use]
    pub fn from_points(points: &[Loc]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(
            rest.iter()
                .fold(Self::from_point(*first), |acc, p| acc.extend_point(*p)),
        )
    }

    /// Returns the minimum (south-west) corner.
    #[must_use]
    pub fn min(&self) -> Loc {
        self.min
    }

    /// Returns the maximum (north-east) corner.
    #[must_use]
    pub fn max(&self) -> Loc {
        self.max
    }

    /// Center of the extent.
    #[must_use]
    pub fn center(&self) -> Loc {
        [
            (self.min[0] + self.max[0]) / 2.0,
            (self.min[1] + self.max[1]) / 2.0,
        ]
    }

    /// Returns `true` if this extent overlaps another (inclusive on edges).
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.max[0] < other.min[0]
            || self.min[0] > other.max[0]
            || self.max[1] < other.min[1]
            || self.min[1] > other.max[1])
    }

    /// Returns `true` when `loc` lies inside the extent (inclusive).
    #[must_use]
    pub fn contains_point(&self, loc: Loc) -> bool {
        loc[0] >= self.min[0]
            && loc[0] <= self.max[0]
            && loc[1] >= self.min[1]
            && loc[1] <= self.max[1]
    }

    /// Returns the union of two extents.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    /// Grows the extent just enough to include `loc`.
    #[must_use]
    pub fn extend_point(&self, loc: Loc) -> Self {
        self.union(&Self::from_point(loc))
    }

    /// Inflates the extent by `dlon` / `dlat` degrees in every direction.
    #[must_use]
    pub fn padded(&self, dlon: f64, dlat: f64) -> Self {
        Self {
            min: [self.min[0] - dlon, self.min[1] - dlat],
            max: [self.max[0] + dlon, self.max[1] + dlat],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corners_are_normalized() {
        let e = Extent::from_corners([2.0, -1.0], [-3.0, 4.0]);
        assert_eq!(e.min(), [-3.0, -1.0]);
        assert_eq!(e.max(), [2.0, 4.0]);
    }

    #[test]
    fn touching_extents_overlap() {
        let a = Extent::from_corners([0.0, 0.0], [1.0, 1.0]);
        let b = Extent::from_corners([1.0, 1.0], [2.0, 2.0]);
        let c = Extent::from_corners([1.5, 1.5], [2.0, 2.0]);
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn from_points_rejects_empty_input() {
        assert!(Extent::from_points(&[]).is_none());
        let e = Extent::from_points(&[[1.0, 5.0], [-1.0, 2.0], [0.0, 9.0]]);
        assert_eq!(e, Some(Extent::from_corners([-1.0, 2.0], [1.0, 9.0])));
    }
}
