//! Repository layer — entity-scoped database operations.
//!
//! Functions take `&Connection` so callers can compose them inside one
//! transaction (`rusqlite::Transaction` derefs to `Connection`).

mod appointment;
mod doctor;
mod queue;
mod report;
mod settings;

pub use appointment::*;
pub use doctor::*;
pub use queue::*;
pub use report::*;
pub use settings::*;
