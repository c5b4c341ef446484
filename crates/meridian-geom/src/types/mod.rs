// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Core geometry types used by the validator (extents).
//!
//! Overlap semantics are inclusive on edges: a degenerate extent (a single
//! point or an axis-aligned segment) still overlaps the extents it touches.

#[doc = "Axis-aligned lon/lat extents."]
pub mod extent;
