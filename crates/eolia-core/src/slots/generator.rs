//! Bookable start times for one calendar day.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use super::{Clock, SlotError, SlotResult};
use crate::models::{weekday_key, ExistingBooking, WorkingHours};

/// A bookable appointment start time.
pub type Slot = NaiveDateTime;

/// Everything needed to compute one day of slots.
#[derive(Debug, Clone)]
pub struct SlotRequest {
    pub date: NaiveDate,
    pub working_hours: WorkingHours,
    /// Fresh snapshot of non-cancelled bookings for the day
    pub existing_bookings: Vec<ExistingBooking>,
    pub duration_minutes: i64,
}

/// Slot generation bound to a clock.
#[derive(Debug, Clone, Default)]
pub struct SlotGenerator<C: Clock> {
    clock: C,
}

impl<C: Clock> SlotGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Generate the slots of `request.date` as seen from the clock's current instant.
    pub fn generate(&self, request: &SlotRequest) -> SlotResult<Vec<Slot>> {
        generate_slots(
            request.date,
            &request.working_hours,
            &request.existing_bookings,
            request.duration_minutes,
            self.clock.now(),
        )
    }

    /// See [`is_day_bookable`].
    pub fn is_day_bookable(&self, date: NaiveDate, working_hours: &WorkingHours) -> bool {
        is_day_bookable(date, working_hours, self.clock.today())
    }
}

/// Produce the ordered start times on `date` where an appointment of `duration_minutes`
/// fits inside a declared interval, overlaps no booking and starts strictly after `now`.
///
/// Candidates advance in fixed steps of `duration_minutes` from each interval's start,
/// whether or not the previous candidate was kept. Intervals with `start >= end` are
/// skipped.
pub fn generate_slots(
    date: NaiveDate,
    working_hours: &WorkingHours,
    existing_bookings: &[ExistingBooking],
    duration_minutes: i64,
    now: NaiveDateTime,
) -> SlotResult<Vec<Slot>> {
    if duration_minutes <= 0 {
        return Err(SlotError::InvalidDuration(duration_minutes));
    }
    // Longer than chrono can represent, so it cannot fit any interval
    let Some(step) = Duration::try_minutes(duration_minutes) else {
        return Ok(Vec::new());
    };

    let day = weekday_key(date.weekday());
    let schedule = match working_hours.for_date(date) {
        Some(schedule) if schedule.accepts_bookings() => schedule,
        _ => {
            debug!(%date, day, "no working hours for day");
            return Ok(Vec::new());
        }
    };

    let mut slots = Vec::new();
    for interval in &schedule.slots {
        if !interval.is_well_formed() {
            warn!(
                %date,
                day,
                start = %interval.start,
                end = %interval.end,
                "skipping malformed interval"
            );
            continue;
        }

        let interval_end = interval.end.on(date);
        let mut cursor = interval.start.on(date);

        while let Some(candidate_end) = cursor.checked_add_signed(step) {
            if candidate_end > interval_end {
                break;
            }

            let free = !existing_bookings
                .iter()
                .any(|booking| booking.overlaps(cursor, candidate_end));

            if free && cursor > now {
                slots.push(cursor);
            }

            cursor = candidate_end;
        }
    }

    slots.sort_unstable();
    slots.dedup();

    debug!(%date, day, duration_minutes, count = slots.len(), "generated slots");
    Ok(slots)
}

/// Whether the booking calendar lets a patient pick `date`: not in the past and the
/// weekday is enabled.
pub fn is_day_bookable(date: NaiveDate, working_hours: &WorkingHours, today: NaiveDate) -> bool {
    date >= today
        && working_hours
            .for_date(date)
            .is_some_and(|schedule| schedule.enabled)
}
