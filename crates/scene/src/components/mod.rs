pub mod point;
pub mod properties;

pub use point::*;
pub use properties::*;
