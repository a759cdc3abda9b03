//! Cross-layer integration tests for Marginalia
//!
//! Tests that verify correct interaction between multiple crates.

mod libraries;
mod sessions;
