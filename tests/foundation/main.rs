//! Integration tests for Layer 0: Foundation
//!
//! Tests for errors, variable scopes, and in-memory metadata.

mod errors;
mod locals;
mod metadata;
