use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_database::supabase::{ApiError, SupabaseClient, EXCLUSION_VIOLATION};

use super::{AttachmentStore, BookingStore, ConflictSide, StoreError};
use crate::models::{Consultation, NewConsultation, PersistedIdentity};
use crate::services::attachment::Attachment;

const TABLE: &str = "/rest/v1/consultations";

/// Name of the exclusion constraint on `(user_id, interval)`.
pub const REQUESTER_OVERLAP_CONSTRAINT: &str = "consultations_user_no_overlap";

fn instant(value: DateTime<Utc>) -> String {
    urlencoding::encode(&value.to_rfc3339_opts(SecondsFormat::Secs, true)).into_owned()
}

/// PostgREST filter for rows whose `[start_time, end_time)` overlaps the window.
fn overlap_filter(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!("start_time=lt.{}&end_time=gt.{}", instant(end), instant(start))
}

fn backend(err: anyhow::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

pub struct SupabaseBookingStore {
    supabase: Arc<SupabaseClient>,
}

impl SupabaseBookingStore {
    pub fn new(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    async fn exists(&self, filter: String) -> Result<bool, StoreError> {
        let path = format!("{}?select=id&{}&limit=1", TABLE, filter);
        let rows: Vec<serde_json::Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(backend)?;
        Ok(!rows.is_empty())
    }
}

#[async_trait]
impl BookingStore for SupabaseBookingStore {
    async fn insert(&self, booking: &NewConsultation) -> Result<PersistedIdentity, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));

        let body = serde_json::to_value(booking).map_err(|e| StoreError::Backend(e.to_string()))?;

        let result: Result<Vec<PersistedIdentity>, anyhow::Error> = self
            .supabase
            .request_with_headers(
                Method::POST,
                &format!("{}?select=id,created_at", TABLE),
                Some(body),
                Some(headers),
            )
            .await;

        match result {
            Ok(rows) => rows
                .into_iter()
                .next()
                .ok_or_else(|| StoreError::Backend("insert returned no row".to_string())),
            Err(e) if ApiError::is_pg_code(&e, EXCLUSION_VIOLATION) => {
                warn!("Insert rejected by overlap constraint: {}", e);
                let side = if ApiError::is_constraint_violation(&e, REQUESTER_OVERLAP_CONSTRAINT) {
                    ConflictSide::Requester
                } else {
                    ConflictSide::Doctor
                };
                Err(StoreError::Conflict(side))
            }
            Err(e) => Err(backend(e)),
        }
    }

    async fn find_conflicts(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.exists(format!("doctor_id=eq.{}&{}", doctor_id, overlap_filter(start, end)))
            .await
    }

    async fn find_double_booking(
        &self,
        doctor_id: Uuid,
        requester_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.exists(format!(
            "or=(doctor_id.eq.{},user_id.eq.{})&{}",
            doctor_id,
            requester_id,
            overlap_filter(start, end)
        ))
        .await
    }

    async fn fetch_page(
        &self,
        requester_id: Uuid,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Consultation>, StoreError> {
        let path = format!(
            "{}?user_id=eq.{}&order=created_at.desc&limit={}&offset={}",
            TABLE, requester_id, limit, offset
        );
        debug!("Fetching consultations: {}", path);

        self.supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(backend)
    }

    async fn count_for_requester(&self, requester_id: Uuid) -> Result<u64, StoreError> {
        self.supabase
            .count(&format!("{}?user_id=eq.{}", TABLE, requester_id))
            .await
            .map_err(backend)
    }
}

pub struct SupabaseAttachmentStore {
    supabase: Arc<SupabaseClient>,
    bucket: String,
}

impl SupabaseAttachmentStore {
    pub fn new(supabase: Arc<SupabaseClient>, bucket: &str) -> Self {
        Self {
            supabase,
            bucket: bucket.to_string(),
        }
    }
}

#[async_trait]
impl AttachmentStore for SupabaseAttachmentStore {
    async fn upload(
        &self,
        attachment: &Attachment,
        folder: &str,
        public_id: &str,
    ) -> Result<String, StoreError> {
        let object_path = format!("{}/{}.{}", folder, public_id, attachment.kind.extension());

        self.supabase
            .upload_object(
                &self.bucket,
                &object_path,
                attachment.bytes.clone(),
                attachment.kind.content_type(),
            )
            .await
            .map_err(backend)
    }
}
