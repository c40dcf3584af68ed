//! Collaborator contracts the booking flow depends on, with Supabase,
//! doctor-cell and in-memory implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use doctor_cell::models::DoctorSchedule;

use crate::models::{Consultation, NewConsultation, PersistedIdentity};
use crate::services::attachment::Attachment;

pub mod directory;
pub mod memory;
pub mod supabase;

pub use directory::DoctorServiceDirectory;
pub use memory::{InMemoryAttachmentStore, InMemoryBookingStore, InMemoryDoctorDirectory};
pub use supabase::{SupabaseAttachmentStore, SupabaseBookingStore};

/// Which side of an overlapping pair a storage-level constraint rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictSide {
    Doctor,
    Requester,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("booking overlaps an existing {0:?} booking")]
    Conflict(ConflictSide),

    #[error("{0}")]
    Backend(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    async fn doctor_exists(&self, doctor_id: Uuid) -> Result<bool, StoreError>;

    /// `Ok(None)` when the doctor has no schedule on record.
    async fn get_schedule(&self, doctor_id: Uuid) -> Result<Option<DoctorSchedule>, StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn insert(&self, booking: &NewConsultation) -> Result<PersistedIdentity, StoreError>;

    /// True iff a booking for `doctor_id` overlaps `[start, end)`.
    async fn find_conflicts(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// True iff a booking for `doctor_id` or for `requester_id` overlaps
    /// `[start, end)`.
    async fn find_double_booking(
        &self,
        doctor_id: Uuid,
        requester_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Newest first.
    async fn fetch_page(
        &self,
        requester_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Consultation>, StoreError>;

    async fn count_for_requester(&self, requester_id: Uuid) -> Result<u64, StoreError>;

    /// One page plus the requester's total, fetched concurrently.
    async fn list(
        &self,
        requester_id: Uuid,
        page: u32,
        page_size: u32,
    ) -> Result<(Vec<Consultation>, u64), StoreError> {
        let offset = shared_models::pagination::offset(page, page_size);
        tokio::try_join!(
            self.fetch_page(requester_id, page_size, offset),
            self.count_for_requester(requester_id),
        )
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Stores the file as `{folder}/{public_id}.{ext}` and returns its URL.
    async fn upload(
        &self,
        attachment: &Attachment,
        folder: &str,
        public_id: &str,
    ) -> Result<String, StoreError>;
}
