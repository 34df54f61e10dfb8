pub mod bridge;
pub mod engine;
pub mod filter;
pub mod lifecycle;
pub mod navigation;
pub mod picking;

#[cfg(test)]
pub(crate) mod testing;

pub use bridge::*;
pub use engine::*;
pub use filter::*;
pub use lifecycle::*;
pub use navigation::*;
pub use picking::*;
