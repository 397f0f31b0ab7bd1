// libs/doctor-cell/src/services/availability.rs

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::models::{Doctor, SlotAvailability, TimeSlot};

/// Interprets a doctor's declared daily slots. Slots repeat every day and
/// are read as UTC wall-clock times.
pub struct AvailabilityService;

impl AvailabilityService {
    /// The declared slot that `at` starts in, if any.
    pub fn slot_containing(doctor: &Doctor, at: DateTime<Utc>) -> Option<TimeSlot> {
        let time_of_day = at.time();
        let slot = doctor
            .time_slots()
            .into_iter()
            .find(|slot| slot.contains(time_of_day));

        debug!(
            "Doctor {} slot lookup at {}: {:?}",
            doctor.id,
            time_of_day,
            slot.map(|s| s.to_string())
        );
        slot
    }

    /// Lays the declared slots onto `date` and marks the ones that no booked
    /// interval touches.
    pub fn slots_on(
        doctor: &Doctor,
        date: NaiveDate,
        booked: &[(DateTime<Utc>, DateTime<Utc>)],
    ) -> Vec<SlotAvailability> {
        let mut slots = doctor.time_slots();
        slots.sort();

        slots
            .into_iter()
            .map(|slot| {
                let start_time = date.and_time(slot.start).and_utc();
                let end_time = date.and_time(slot.end).and_utc();
                let available = !booked
                    .iter()
                    .any(|&(s, e)| intervals_overlap(start_time, end_time, s, e));

                SlotAvailability {
                    slot: slot.to_string(),
                    start_time,
                    end_time,
                    available,
                }
            })
            .collect()
    }
}

/// Half-open intervals `[s1, e1)` and `[s2, e2)` overlap iff `s1 < e2 && s2 < e1`.
pub fn intervals_overlap(
    s1: DateTime<Utc>,
    e1: DateTime<Utc>,
    s2: DateTime<Utc>,
    e2: DateTime<Utc>,
) -> bool {
    s1 < e2 && s2 < e1
}
