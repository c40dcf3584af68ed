use std::sync::Arc;

use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::auth::{ROLE_DOCTOR, ROLE_USER};
use shared_models::pagination::{self, PageMeta};

use crate::models::{
    CreateDoctorRequest, Doctor, DoctorError, DoctorPage, DoctorSchedule, ScheduleRow,
    UpdateDoctorRequest,
};
use crate::services::validation::{
    validate_create_request, validate_profile_numbers, validate_working_days,
    validate_working_hours,
};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;

pub struct DoctorService {
    supabase: Arc<SupabaseClient>,
}

impl DoctorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: Arc::new(SupabaseClient::new(config)),
        }
    }

    pub fn with_client(supabase: Arc<SupabaseClient>) -> Self {
        Self { supabase }
    }

    fn representation() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    /// Registers a doctor profile for an existing user and promotes the
    /// user's role to `doctor`.
    pub async fn create_doctor(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor profile for user {}", request.user_id);

        validate_create_request(&request)?;

        // Step 1: the linked user must exist
        let user_path = format!("/rest/v1/users?id=eq.{}&select=id", request.user_id);
        let users: Vec<Value> = self
            .supabase
            .request(Method::GET, &user_path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if users.is_empty() {
            return Err(DoctorError::UserNotFound);
        }

        // Step 2: one doctor profile per user
        let existing_path = format!("/rest/v1/doctors?user_id=eq.{}&select=id", request.user_id);
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if !existing.is_empty() {
            return Err(DoctorError::AlreadyRegistered);
        }

        // Step 3: insert the profile
        let now = Utc::now().to_rfc3339();
        let doctor_data = json!({
            "user_id": request.user_id,
            "full_name": request.full_name,
            "last_education": request.last_education,
            "specialist_at": request.specialist_at,
            "profile_image": request.profile_image,
            "birth_date": request.birth_date.format("%Y-%m-%d").to_string(),
            "hospital_name": request.hospital_name,
            "years_of_experience": request.years_of_experience,
            "price_per_hour": request.price_per_hour,
            "gmeet_link": request.gmeet_link,
            "working_days": request.working_days,
            "working_hours_start": request.working_hours_start,
            "working_hours_end": request.working_hours_end,
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctors",
                Some(doctor_data),
                Some(Self::representation()),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        let doctor = Self::first_doctor(result)?;

        // Step 4: promote the user, undoing the insert if that fails
        if let Err(e) = self.set_user_role(doctor.user_id, ROLE_DOCTOR).await {
            error!("Failed to promote user {} to doctor: {}", doctor.user_id, e);
            if let Err(cleanup) = self.remove_doctor_row(doctor.id).await {
                warn!("Failed to roll back doctor {}: {}", doctor.id, cleanup);
            }
            return Err(e);
        }

        info!("Doctor {} registered for user {}", doctor.id, doctor.user_id);
        Ok(doctor)
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        debug!("Fetching doctor profile: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(DoctorError::NotFound);
        }

        Self::first_doctor(result)
    }

    /// Lists doctors by name. Count and page fetch run concurrently.
    pub async fn list_doctors(
        &self,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> Result<DoctorPage, DoctorError> {
        let page = page.unwrap_or(1);
        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        pagination::validate_bounds(page, limit).map_err(DoctorError::ValidationError)?;

        let offset = pagination::offset(page, limit);
        debug!("Listing doctors page {} (limit {})", page, limit);

        let fetch_path = format!(
            "/rest/v1/doctors?order=full_name.asc&limit={}&offset={}",
            limit, offset
        );

        let (rows, total) = tokio::try_join!(
            self.supabase.request::<Vec<Doctor>>(Method::GET, &fetch_path, None),
            self.supabase.count("/rest/v1/doctors"),
        )
        .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        Ok(DoctorPage {
            data: rows,
            meta: PageMeta::new(page, limit, total),
        })
    }

    pub async fn update_doctor(
        &self,
        doctor_id: Uuid,
        request: UpdateDoctorRequest,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating doctor profile: {}", doctor_id);

        validate_profile_numbers(request.years_of_experience, request.price_per_hour)?;
        if let Some(ref days) = request.working_days {
            validate_working_days(days)?;
        }

        // Hours are validated as a pair, filling the missing side from storage
        if request.working_hours_start.is_some() || request.working_hours_end.is_some() {
            let current = self.get_doctor(doctor_id).await?;
            let start = request
                .working_hours_start
                .as_deref()
                .unwrap_or(&current.working_hours_start);
            let end = request
                .working_hours_end
                .as_deref()
                .unwrap_or(&current.working_hours_end);
            validate_working_hours(start, end)?;
        }

        let mut update_data = Map::new();

        if let Some(name) = request.full_name {
            update_data.insert("full_name".to_string(), json!(name));
        }
        if let Some(education) = request.last_education {
            update_data.insert("last_education".to_string(), json!(education));
        }
        if let Some(specialist_at) = request.specialist_at {
            update_data.insert("specialist_at".to_string(), json!(specialist_at));
        }
        if let Some(image) = request.profile_image {
            update_data.insert("profile_image".to_string(), json!(image));
        }
        if let Some(birth_date) = request.birth_date {
            update_data.insert(
                "birth_date".to_string(),
                json!(birth_date.format("%Y-%m-%d").to_string()),
            );
        }
        if let Some(hospital) = request.hospital_name {
            update_data.insert("hospital_name".to_string(), json!(hospital));
        }
        if let Some(years) = request.years_of_experience {
            update_data.insert("years_of_experience".to_string(), json!(years));
        }
        if let Some(price) = request.price_per_hour {
            update_data.insert("price_per_hour".to_string(), json!(price));
        }
        if let Some(link) = request.gmeet_link {
            update_data.insert("gmeet_link".to_string(), json!(link));
        }
        if let Some(days) = request.working_days {
            update_data.insert("working_days".to_string(), json!(days));
        }
        if let Some(start) = request.working_hours_start {
            update_data.insert("working_hours_start".to_string(), json!(start));
        }
        if let Some(end) = request.working_hours_end {
            update_data.insert("working_hours_end".to_string(), json!(end));
        }

        update_data.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(Value::Object(update_data)),
                Some(Self::representation()),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if result.is_empty() {
            return Err(DoctorError::NotFound);
        }

        Self::first_doctor(result)
    }

    /// Removes the profile and returns the linked user to the `user` role.
    pub async fn delete_doctor(&self, doctor_id: Uuid) -> Result<(), DoctorError> {
        let doctor = self.get_doctor(doctor_id).await?;

        self.remove_doctor_row(doctor_id).await?;
        self.set_user_role(doctor.user_id, ROLE_USER).await?;

        info!("Doctor {} removed, user {} demoted", doctor_id, doctor.user_id);
        Ok(())
    }

    pub async fn doctor_exists(&self, doctor_id: Uuid) -> Result<bool, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}&select=id", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        Ok(!result.is_empty())
    }

    pub async fn get_schedule(&self, doctor_id: Uuid) -> Result<DoctorSchedule, DoctorError> {
        let path = format!(
            "/rest/v1/doctors?id=eq.{}&select=gmeet_link,price_per_hour,working_days,working_hours_start,working_hours_end",
            doctor_id
        );
        let rows: Vec<ScheduleRow> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        rows.into_iter()
            .next()
            .map(DoctorSchedule::from)
            .ok_or(DoctorError::NotFound)
    }

    async fn remove_doctor_row(&self, doctor_id: Uuid) -> Result<(), DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let _: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(Self::representation()))
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn set_user_role(&self, user_id: Uuid, role: &str) -> Result<(), DoctorError> {
        let path = format!("/rest/v1/users?id=eq.{}", user_id);
        let updated: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(json!({ "role": role })),
                Some(Self::representation()),
            )
            .await
            .map_err(|e| DoctorError::DatabaseError(e.to_string()))?;

        if updated.is_empty() {
            return Err(DoctorError::UserNotFound);
        }
        Ok(())
    }

    fn first_doctor(rows: Vec<Value>) -> Result<Doctor, DoctorError> {
        let row = rows
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::DatabaseError("empty response".to_string()))?;
        serde_json::from_value(row).map_err(|e| DoctorError::DatabaseError(e.to_string()))
    }
}
