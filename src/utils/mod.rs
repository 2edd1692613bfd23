//! Utility modules shared across the pipeline.

pub mod date;
pub mod fs;
pub mod git;
pub mod minify;
