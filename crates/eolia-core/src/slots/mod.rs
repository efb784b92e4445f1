//! Slot generation.
//!
//! Turns a practitioner's weekly working hours and the bookings already taken on a day
//! into the list of start times offered on the public booking page. The computation is
//! pure: "now" comes from an injected [`Clock`].

mod clock;
mod generator;

pub use clock::*;
pub use generator::*;

use thiserror::Error;

/// Slot generation errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotError {
    #[error("Appointment duration must be a positive number of minutes, got {0}")]
    InvalidDuration(i64),
}

pub type SlotResult<T> = Result<T, SlotError>;
