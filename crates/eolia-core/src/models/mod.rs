//! Domain models for the eolia system.

mod appointment;
mod invoice;
mod patient;
mod profile;
mod schedule;

pub use appointment::*;
pub use invoice::*;
pub use patient::*;
pub use profile::*;
pub use schedule::*;
