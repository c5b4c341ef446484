// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Meridian crates.
#![forbid(unsafe_code)]
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`graph`] - Graph builder keyed by numeric ids
//! - [`presets`] - Table-driven preset matcher
//! - [`session`] - History, presets and mode bundled into one editor double

pub mod config;
pub mod graph;
pub mod presets;
pub mod session;

pub use config::InMemoryConfigStore;
pub use graph::GraphBuilder;
pub use presets::StaticPresets;
pub use session::TestSession;
