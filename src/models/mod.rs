pub mod appointment;
pub mod enums;
pub mod queue;
pub mod report;

pub use appointment::*;
pub use enums::*;
pub use queue::*;
pub use report::*;
