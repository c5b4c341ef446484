// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Geometry utilities over `[lon, lat]` coordinates.
//!
//! Planar routines treat degrees as a flat plane; they are used for
//! intersection tests where only the sign of cross products matters.
//! Distances that are compared against thresholds in meters go through the
//! `spherical` helpers instead.

#[doc = "Segment intersection, projection, and ring self-intersection tests."]
pub mod intersect;
#[doc = "Equirectangular distance approximations in meters."]
pub mod spherical;
#[doc = "Two-component vector helpers."]
pub mod vec;
