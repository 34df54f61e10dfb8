pub mod layer;
pub mod raster;
pub mod symbology;
pub mod terrain;
pub mod tileset;
pub mod vector;

pub use layer::*;
