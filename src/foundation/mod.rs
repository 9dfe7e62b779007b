//! Shared primitive types: pixels, buffers, errors, and integer math helpers.

pub mod core;
pub mod error;
pub(crate) mod math;
