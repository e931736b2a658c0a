//! Foundation module - shared building blocks
//!
//! f64 math aliases and pose helpers, slotmap handle types for the object,
//! group and geometry arenas, and logger setup.

pub mod collections;
pub mod logging;
pub mod math;
