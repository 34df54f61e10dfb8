pub mod error;
pub mod http;
pub mod orchestrator;
pub mod provider;

pub use error::*;
pub use http::*;
pub use orchestrator::*;
pub use provider::*;
