//! Integration tests for Layer 1: Language
//!
//! Tests for the template scanner and the program parser.

mod programs;
mod templates;
