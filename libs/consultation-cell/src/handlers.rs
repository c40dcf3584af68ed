use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Extension, Multipart, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{ConsultationError, ConsultationListQuery, CreateConsultationRequest};
use crate::services::booking::ConsultationService;
use crate::services::listing::ListingService;

pub const PAYMENT_PROOF_FIELD: &str = "payment_proof";

/// Text fields of the booking form, keyed by field name.
struct FormFields(HashMap<String, String>);

impl FormFields {
    fn required(&self, name: &str) -> Result<&str, AppError> {
        self.0
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::BadRequest(format!("{} is required", name)))
    }

    fn uuid(&self, name: &str) -> Result<Uuid, AppError> {
        Uuid::parse_str(self.required(name)?)
            .map_err(|_| AppError::BadRequest(format!("{} must be a UUID", name)))
    }
}

async fn read_booking_form(mut multipart: Multipart) -> Result<CreateConsultationRequest, AppError> {
    let mut fields = HashMap::new();
    let mut payment_proof = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == PAYMENT_PROOF_FIELD {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read payment proof: {}", e)))?;
            payment_proof = Some(bytes.to_vec());
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read field {}: {}", name, e)))?;
            fields.insert(name, text);
        }
    }

    let form = FormFields(fields);
    let payment_proof = payment_proof
        .ok_or_else(|| AppError::BadRequest(format!("{} is required", PAYMENT_PROOF_FIELD)))?;

    Ok(CreateConsultationRequest {
        user_id: form.uuid("user_id")?,
        doctor_id: form.uuid("doctor_id")?,
        pet_type: form.required("pet_type")?.to_string(),
        pet_name: form.required("pet_name")?.to_string(),
        pet_age: form
            .required("pet_age")?
            .parse()
            .map_err(|_| AppError::BadRequest("pet_age must be a whole number".to_string()))?,
        disease_description: form.required("disease_description")?.to_string(),
        consultation_date: form.required("consultation_date")?.to_string(),
        start_time: form.required("start_time")?.to_string(),
        end_time: form.required("end_time")?.to_string(),
        payment_proof,
    })
}

fn caller_id(user: &User) -> Result<Uuid, AppError> {
    Uuid::parse_str(&user.id).map_err(|_| AppError::Auth("Token subject is not a user id".to_string()))
}

#[axum::debug_handler]
pub async fn create_consultation(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let request = read_booking_form(multipart).await?;

    if caller_id(&user)? != request.user_id && !user.is_admin() {
        return Err(ConsultationError::Forbidden.into());
    }

    debug!("User {} submitted a booking form", user.id);

    let consultation_service = ConsultationService::from_config(&state);
    let consultation = consultation_service.create_consultation(request).await?;

    Ok(Json(json!({
        "success": true,
        "consultation": consultation
    })))
}

#[axum::debug_handler]
pub async fn list_consultations(
    State(state): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<ConsultationListQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = caller_id(&user)?;

    let listing_service = ListingService::from_config(&state);
    let page = listing_service
        .list_consultations(user_id, query.page, query.page_size)
        .await?;

    Ok(Json(json!(page)))
}
