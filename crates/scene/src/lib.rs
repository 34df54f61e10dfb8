pub mod camera;
pub mod components;
pub mod dataset;
pub mod entity;
pub mod entity_set;
pub mod picking;
pub mod selection;
pub mod visibility;

pub use dataset::*;
pub use entity::*;
