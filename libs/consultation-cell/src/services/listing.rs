use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::pagination::{self, PageMeta};

use crate::models::{Consultation, ConsultationError, ConsultationPage, ConsultationResponse};
use crate::services::time::{to_utc_display, TimeNormalizer};
use crate::stores::{BookingStore, SupabaseBookingStore};

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Read side: a requester's consultations, newest first.
pub struct ListingService {
    bookings: Arc<dyn BookingStore>,
    normalizer: TimeNormalizer,
    timeout: Duration,
}

impl ListingService {
    pub fn new(bookings: Arc<dyn BookingStore>, normalizer: TimeNormalizer, timeout: Duration) -> Self {
        Self {
            bookings,
            normalizer,
            timeout,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self::new(
            Arc::new(SupabaseBookingStore::new(supabase)),
            TimeNormalizer::new(config.timezone()),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub async fn list_consultations(
        &self,
        user_id: Uuid,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<ConsultationPage, ConsultationError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        pagination::validate_bounds(page, page_size).map_err(ConsultationError::Validation)?;

        debug!("Listing consultations for user {} (page {}, size {})", user_id, page, page_size);

        let (items, total) = tokio::time::timeout(
            self.timeout,
            self.bookings.list(user_id, page, page_size),
        )
        .await
        .map_err(|_| {
            error!("Listing consultations for user {} timed out", user_id);
            ConsultationError::Timeout
        })?
        .map_err(|e| {
            error!("Failed to list consultations for user {}: {}", user_id, e);
            ConsultationError::PersistenceFailure(e.to_string())
        })?;

        Ok(ConsultationPage {
            data: items.into_iter().map(|c| self.to_response(c)).collect(),
            meta: PageMeta::new(page, page_size, total),
        })
    }

    fn to_response(&self, consultation: Consultation) -> ConsultationResponse {
        ConsultationResponse {
            id: consultation.id,
            user_id: consultation.user_id,
            doctor_id: consultation.doctor_id,
            pet_type: consultation.pet_type,
            pet_name: consultation.pet_name,
            pet_age: consultation.pet_age,
            disease_description: consultation.disease_description,
            consultation_date: consultation.consultation_date.format("%Y-%m-%d").to_string(),
            start_time_utc: to_utc_display(consultation.start_time),
            end_time_utc: to_utc_display(consultation.end_time),
            start_time_local: self.normalizer.to_local_display(consultation.start_time),
            end_time_local: self.normalizer.to_local_display(consultation.end_time),
            payment_proof: consultation.payment_proof,
            created_at: consultation.created_at,
            meet_link: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone, Utc};

    use crate::models::{NewConsultation, PersistedIdentity};
    use crate::stores::{InMemoryBookingStore, StoreError};

    fn normalizer() -> TimeNormalizer {
        TimeNormalizer::new(chrono_tz::Asia::Jakarta)
    }

    async fn seed(store: &InMemoryBookingStore, user_id: Uuid, hour: u32) {
        let start = Utc.with_ymd_and_hms(2025, 6, 2, hour, 0, 0).unwrap();
        store
            .insert(&NewConsultation {
                user_id,
                doctor_id: Uuid::new_v4(),
                pet_type: "cat".to_string(),
                pet_name: "Mochi".to_string(),
                pet_age: 2,
                disease_description: "Not eating since yesterday".to_string(),
                consultation_date: start.date_naive(),
                start_time: start,
                end_time: start + chrono::Duration::minutes(30),
                payment_proof: "https://cdn.test/p.png".to_string(),
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_lists_own_consultations_with_meta() {
        let store = Arc::new(InMemoryBookingStore::new());
        let owner = Uuid::new_v4();
        for hour in 1..=3 {
            seed(&store, owner, hour).await;
        }
        seed(&store, Uuid::new_v4(), 5).await;

        let service = ListingService::new(store, normalizer(), Duration::from_secs(1));
        let page = service.list_consultations(owner, Some(1), Some(2)).await.unwrap();

        assert_eq!(page.data.len(), 2);
        assert_eq!(page.meta.total_items, 3);
        assert_eq!(page.meta.total_pages, 2);
        assert!(page.data.iter().all(|c| c.user_id == owner));
        assert!(page.data[0].created_at >= page.data[1].created_at);
        assert_eq!(page.data[0].start_time_local.len(), "2025-06-02 09:00:00".len());
    }

    #[tokio::test]
    async fn test_rejects_bad_bounds() {
        let service = ListingService::new(
            Arc::new(InMemoryBookingStore::new()),
            normalizer(),
            Duration::from_secs(1),
        );

        assert_matches!(
            service.list_consultations(Uuid::new_v4(), Some(0), Some(10)).await,
            Err(ConsultationError::Validation(_))
        );
        assert_matches!(
            service.list_consultations(Uuid::new_v4(), Some(1), Some(101)).await,
            Err(ConsultationError::Validation(_))
        );
    }

    struct SlowStore;

    #[async_trait]
    impl BookingStore for SlowStore {
        async fn insert(&self, _: &NewConsultation) -> Result<PersistedIdentity, StoreError> {
            Err(StoreError::Backend("read only".to_string()))
        }
        async fn find_conflicts(&self, _: Uuid, _: DateTime<Utc>, _: DateTime<Utc>) -> Result<bool, StoreError> {
            Ok(false)
        }
        async fn find_double_booking(
            &self,
            _: Uuid,
            _: Uuid,
            _: DateTime<Utc>,
            _: DateTime<Utc>,
        ) -> Result<bool, StoreError> {
            Ok(false)
        }
        async fn fetch_page(&self, _: Uuid, _: u32, _: u64) -> Result<Vec<Consultation>, StoreError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(vec![])
        }
        async fn count_for_requester(&self, _: Uuid) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_times_out() {
        let service = ListingService::new(Arc::new(SlowStore), normalizer(), Duration::from_millis(20));

        assert_matches!(
            service.list_consultations(Uuid::new_v4(), None, None).await,
            Err(ConsultationError::Timeout)
        );
    }
}
