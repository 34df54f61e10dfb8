pub mod camera;
pub mod headless;
pub mod journal;

pub use camera::*;
pub use headless::*;
pub use journal::*;
