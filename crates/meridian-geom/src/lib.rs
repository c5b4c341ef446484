// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![doc = r"Geometry primitives for Meridian.

This crate provides:
- Axis-aligned lon/lat extents (`Extent`).
- Planar segment math (`line_intersection`, `closest_point_on_segment`,
  `has_self_intersections`).
- Spherical helpers in meters (`spherical_distance`, `spherical_closest`).
- A spatial index trait and an R-tree backed implementation.

Design notes:
- Pure functions; no ambient state.
- Float64 throughout, coordinates are `[lon, lat]` in degrees.
- Query results are returned in ascending key order so callers observe the
  same candidate order for the same index contents.
"]

/// Spatial indexes keyed by caller-supplied ids.
pub mod broad;
/// Planar and spherical geometry utilities.
pub mod math;
/// Foundational geometric types.
pub mod types;

pub use broad::{LinearIndex, RTreeIndex, SpatialIndex};
pub use math::intersect::{
    closest_point_on_segment, has_self_intersections, line_intersection,
};
pub use math::spherical::{
    lat_to_meters, lon_to_meters, meters_to_lat, meters_to_lon, spherical_closest,
    spherical_distance,
};
pub use math::vec::{vec_cross, vec_equal, vec_interp, vec_subtract};
pub use types::extent::Extent;

/// A `[lon, lat]` coordinate in degrees.
pub type Loc = [f64; 2];
