//! Scalar values with units.
//!
//! A `ScalarUnit` is a plain immutable pair; display rules live in the
//! free `format` function keyed by `Unit`.

pub mod scalar;

pub use scalar::{format, ScalarUnit, Unit};
