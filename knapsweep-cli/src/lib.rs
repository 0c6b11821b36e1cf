//! Support library for the `knapsweep` binary.
//!
//! Exposes the command pipeline and logging setup so tests can drive the
//! commands without forking a subprocess.

pub mod cli;
pub mod logging;
