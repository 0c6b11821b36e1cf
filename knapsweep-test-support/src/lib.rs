//! Shared test utilities used across knapsweep crates.

pub mod recording;
pub mod solver_output;
