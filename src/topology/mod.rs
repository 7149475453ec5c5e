//! Lattice topology: node numbering and boundary side sets.
//!
//! Everything here depends on the point counts alone, never on coordinates.

pub mod boundary;
pub mod index;

pub use boundary::BoundarySide;
pub use index::{GridShape, MAX_DIM};
