use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::stores::{BookingStore, StoreError};

/// Half-open interval overlap: `[a_start, a_end)` and `[b_start, b_end)`
/// intersect iff each starts before the other ends.
pub fn overlaps(
    a_start: DateTime<Utc>,
    a_end: DateTime<Utc>,
    b_start: DateTime<Utc>,
    b_end: DateTime<Utc>,
) -> bool {
    a_start < b_end && b_start < a_end
}

/// Existence checks over persisted bookings, read at call time.
#[derive(Clone)]
pub struct AvailabilityChecker {
    bookings: Arc<dyn BookingStore>,
}

impl AvailabilityChecker {
    pub fn new(bookings: Arc<dyn BookingStore>) -> Self {
        Self { bookings }
    }

    pub async fn has_doctor_conflict(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conflict = self.bookings.find_conflicts(doctor_id, start, end).await?;
        debug!(
            "Doctor {} conflict check for {} - {}: {}",
            doctor_id, start, end, conflict
        );
        Ok(conflict)
    }

    /// Also catches a requester holding an overlapping booking with a
    /// different doctor.
    pub async fn has_double_booking(
        &self,
        doctor_id: Uuid,
        requester_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let conflict = self
            .bookings
            .find_double_booking(doctor_id, requester_id, start, end)
            .await?;
        debug!(
            "Double-booking check for requester {} with doctor {}: {}",
            requester_id, doctor_id, conflict
        );
        Ok(conflict)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn test_overlap_semantics() {
        // identical
        assert!(overlaps(at(2, 0), at(2, 30), at(2, 0), at(2, 30)));
        // partial
        assert!(overlaps(at(2, 0), at(2, 30), at(2, 15), at(2, 45)));
        // containment
        assert!(overlaps(at(2, 0), at(4, 0), at(2, 15), at(2, 45)));
        // touching ends do not overlap
        assert!(!overlaps(at(2, 0), at(2, 30), at(2, 30), at(3, 0)));
        assert!(!overlaps(at(2, 30), at(3, 0), at(2, 0), at(2, 30)));
        // disjoint
        assert!(!overlaps(at(2, 0), at(2, 30), at(5, 0), at(5, 30)));
    }

    #[test]
    fn test_overlap_is_symmetric() {
        let pairs = [
            (at(1, 0), at(2, 0), at(1, 30), at(3, 0)),
            (at(1, 0), at(2, 0), at(2, 0), at(3, 0)),
            (at(1, 0), at(5, 0), at(2, 0), at(3, 0)),
        ];
        for (a0, a1, b0, b1) in pairs {
            assert_eq!(overlaps(a0, a1, b0, b1), overlaps(b0, b1, a0, a1));
        }
    }
}
