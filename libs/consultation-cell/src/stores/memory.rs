//! Process-local stores. The booking store enforces the same no-overlap
//! rule at insert time that the database exclusion constraints do.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use doctor_cell::models::DoctorSchedule;

use super::{AttachmentStore, BookingStore, ConflictSide, DoctorDirectory, StoreError};
use crate::models::{Consultation, NewConsultation, PersistedIdentity};
use crate::services::attachment::Attachment;
use crate::services::availability::overlaps;

fn poisoned<T>(_: T) -> StoreError {
    StoreError::Backend("in-memory store lock poisoned".to_string())
}

#[derive(Default)]
pub struct InMemoryDoctorDirectory {
    schedules: HashMap<Uuid, DoctorSchedule>,
}

impl InMemoryDoctorDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_doctor(mut self, doctor_id: Uuid, schedule: DoctorSchedule) -> Self {
        self.schedules.insert(doctor_id, schedule);
        self
    }
}

#[async_trait]
impl DoctorDirectory for InMemoryDoctorDirectory {
    async fn doctor_exists(&self, doctor_id: Uuid) -> Result<bool, StoreError> {
        Ok(self.schedules.contains_key(&doctor_id))
    }

    async fn get_schedule(&self, doctor_id: Uuid) -> Result<Option<DoctorSchedule>, StoreError> {
        Ok(self.schedules.get(&doctor_id).cloned())
    }
}

#[derive(Default)]
pub struct InMemoryBookingStore {
    rows: Mutex<Vec<Consultation>>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Vec<Consultation> {
        self.rows.lock().map(|rows| rows.clone()).unwrap_or_default()
    }

    fn any_overlap<F>(&self, start: DateTime<Utc>, end: DateTime<Utc>, matches: F) -> Result<bool, StoreError>
    where
        F: Fn(&Consultation) -> bool,
    {
        let rows = self.rows.lock().map_err(poisoned)?;
        Ok(rows
            .iter()
            .any(|row| matches(row) && overlaps(row.start_time, row.end_time, start, end)))
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert(&self, booking: &NewConsultation) -> Result<PersistedIdentity, StoreError> {
        let mut rows = self.rows.lock().map_err(poisoned)?;

        for row in rows.iter() {
            if !overlaps(row.start_time, row.end_time, booking.start_time, booking.end_time) {
                continue;
            }
            if row.doctor_id == booking.doctor_id {
                return Err(StoreError::Conflict(ConflictSide::Doctor));
            }
            if row.user_id == booking.user_id {
                return Err(StoreError::Conflict(ConflictSide::Requester));
            }
        }

        let identity = PersistedIdentity {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        rows.push(booking.clone().into_persisted(identity));

        Ok(identity)
    }

    async fn find_conflicts(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.any_overlap(start, end, |row| row.doctor_id == doctor_id)
    }

    async fn find_double_booking(
        &self,
        doctor_id: Uuid,
        requester_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.any_overlap(start, end, |row| {
            row.doctor_id == doctor_id || row.user_id == requester_id
        })
    }

    async fn fetch_page(
        &self,
        requester_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Consultation>, StoreError> {
        let rows = self.rows.lock().map_err(poisoned)?;

        let mut own: Vec<Consultation> = rows
            .iter()
            .filter(|row| row.user_id == requester_id)
            .cloned()
            .collect();
        // Newest first; insertion order breaks created_at ties
        own.reverse();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(own
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect())
    }

    async fn count_for_requester(&self, requester_id: Uuid) -> Result<u64, StoreError> {
        let rows = self.rows.lock().map_err(poisoned)?;
        Ok(rows.iter().filter(|row| row.user_id == requester_id).count() as u64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub path: String,
    pub content_type: String,
    pub size: usize,
}

/// Keeps uploaded objects in memory. `failing()` builds a store whose
/// uploads always fail.
pub struct InMemoryAttachmentStore {
    base_url: String,
    objects: Mutex<Vec<StoredObject>>,
    fail_uploads: bool,
}

impl InMemoryAttachmentStore {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            objects: Mutex::new(Vec::new()),
            fail_uploads: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail_uploads: true,
            ..Self::new("http://localhost")
        }
    }

    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().map(|o| o.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn upload(
        &self,
        attachment: &Attachment,
        folder: &str,
        public_id: &str,
    ) -> Result<String, StoreError> {
        if self.fail_uploads {
            return Err(StoreError::Backend("upload rejected".to_string()));
        }

        let path = format!("{}/{}.{}", folder, public_id, attachment.kind.extension());
        self.objects.lock().map_err(poisoned)?.push(StoredObject {
            path: path.clone(),
            content_type: attachment.kind.content_type().to_string(),
            size: attachment.size(),
        });

        Ok(format!("{}/{}", self.base_url, path))
    }
}
