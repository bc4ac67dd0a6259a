//! API endpoint handlers.
//!
//! Handlers parse and validate transport concerns only, then hand off to
//! the engine modules through `ApiContext::run`.

pub mod appointments;
pub mod booking;
pub mod checkin;
pub mod doctors;
pub mod health;
pub mod queue;
pub mod reports;
pub mod settings;
