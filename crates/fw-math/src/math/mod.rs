//! Numerical primitives.

pub mod ratio;
