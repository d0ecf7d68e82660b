//! Utility functions and helpers

pub mod file;
pub mod json;
