//! Integration tests for Layer 2: Functions
//!
//! Tests for the function registry, library overlays, and the user-function
//! compiler.

mod compiler;
mod registry;
