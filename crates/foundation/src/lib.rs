//! Geometry and geodesy primitives shared by every viewer crate.

pub mod bounds;
pub mod handles;
pub mod math;

pub use bounds::*;
pub use handles::*;
