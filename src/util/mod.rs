//! Utility types and functions for the recorder.
//!
//! - [`Error`] / [`Result`] - Error handling
//! - Math type re-exports from glam plus transform decomposition

mod error;
mod math;

pub use error::*;
pub use math::*;
