//! CLI library components for tabclean.

pub mod logging;
