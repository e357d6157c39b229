//! Triangle clipping against half-space planes.
//!
//! Each pass clips every triangle of a list against one [`Plane`] and yields
//! zero, one or two triangles per input. Passes are chained so that every
//! plane sees the output of the previous one.

pub mod plane;
pub mod triangle;

pub use plane::Plane;
pub use triangle::{clip_triangle, clip_triangles, Clipped};
