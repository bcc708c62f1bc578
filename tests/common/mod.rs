//! Common test utilities and helpers
//!
//! Local bare repositories served over `file://` stand in for the hosting
//! server, so every integration test runs against a real git.

#![allow(dead_code)]

pub mod assertion_helpers;
pub mod test_fixtures;
