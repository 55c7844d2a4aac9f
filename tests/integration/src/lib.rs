//! Integration test support for the classchat workspace
//!
//! Provides fixtures for spinning up an in-memory engine and driving it
//! through multiple concurrent sessions, the way the excluded UI layer
//! would.

pub mod fixtures;
pub mod helpers;

pub use helpers::TestEngine;
