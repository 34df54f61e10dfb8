pub mod epoch;
pub mod event_bus;
pub mod teardown;

pub use epoch::*;
pub use event_bus::*;
pub use teardown::*;
