//! Helpers shared by the builtin functions.

pub mod dates;
pub mod duration;
pub mod fields;
pub mod languages;
pub mod number;
pub mod patterns;
pub mod text;
pub mod url;
