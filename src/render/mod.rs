//! Compositing backend.
//!
//! [`geometry`] derives all pixel measurements, [`paint`] holds the premul
//! byte kernels, and [`cpu`] runs the staged pipeline over them.

/// Staged CPU compositor.
pub mod cpu;
pub(crate) mod geometry;
pub(crate) mod paint;
