//! Fare Watch math utilities.

pub mod math;

pub use math::ratio::*;
