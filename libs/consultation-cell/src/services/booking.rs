use std::sync::Arc;

use chrono::Duration;
use chrono_tz::Tz;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use doctor_cell::services::doctor::DoctorService;
use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{
    ConsultationError, ConsultationResponse, CreateConsultationRequest, NewConsultation,
};
use crate::services::attachment::{self, Attachment};
use crate::services::availability::AvailabilityChecker;
use crate::services::clock::{Clock, SystemClock};
use crate::services::schedule::validate_schedule;
use crate::services::time::{check_interval, to_utc_display, TimeNormalizer};
use crate::stores::{
    AttachmentStore, BookingStore, ConflictSide, DoctorDirectory, DoctorServiceDirectory,
    StoreError, SupabaseAttachmentStore, SupabaseBookingStore,
};

pub const MIN_CONSULTATION_MINUTES: i64 = 30;
pub const PAYMENT_PROOF_FOLDER: &str = "payment_proofs";

#[derive(Debug, Clone)]
pub struct BookingRules {
    pub timezone: Tz,
    pub min_duration: Duration,
    pub max_attachment_bytes: usize,
    pub upload_folder: String,
}

impl BookingRules {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            timezone: config.timezone(),
            max_attachment_bytes: config.max_upload_bytes,
            ..Self::default()
        }
    }
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            timezone: chrono_tz::Asia::Jakarta,
            min_duration: Duration::minutes(MIN_CONSULTATION_MINUTES),
            max_attachment_bytes: shared_config::DEFAULT_MAX_UPLOAD_BYTES,
            upload_folder: PAYMENT_PROOF_FOLDER.to_string(),
        }
    }
}

/// Runs one booking attempt through every validation stage before any side
/// effect, then uploads the payment proof and persists the booking.
pub struct ConsultationService {
    directory: Arc<dyn DoctorDirectory>,
    bookings: Arc<dyn BookingStore>,
    attachments: Arc<dyn AttachmentStore>,
    availability: AvailabilityChecker,
    clock: Arc<dyn Clock>,
    normalizer: TimeNormalizer,
    rules: BookingRules,
}

impl ConsultationService {
    pub fn new(
        directory: Arc<dyn DoctorDirectory>,
        bookings: Arc<dyn BookingStore>,
        attachments: Arc<dyn AttachmentStore>,
        clock: Arc<dyn Clock>,
        rules: BookingRules,
    ) -> Self {
        Self {
            directory,
            availability: AvailabilityChecker::new(Arc::clone(&bookings)),
            bookings,
            attachments,
            clock,
            normalizer: TimeNormalizer::new(rules.timezone),
            rules,
        }
    }

    /// Supabase-backed service for the running API.
    pub fn from_config(config: &AppConfig) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self::new(
            Arc::new(DoctorServiceDirectory::new(DoctorService::with_client(
                Arc::clone(&supabase),
            ))),
            Arc::new(SupabaseBookingStore::new(Arc::clone(&supabase))),
            Arc::new(SupabaseAttachmentStore::new(supabase, &config.storage_bucket)),
            Arc::new(SystemClock),
            BookingRules::from_config(config),
        )
    }

    pub async fn create_consultation(
        &self,
        request: CreateConsultationRequest,
    ) -> Result<ConsultationResponse, ConsultationError> {
        info!(
            "Booking consultation for user {} with doctor {} on {} {}-{}",
            request.user_id,
            request.doctor_id,
            request.consultation_date,
            request.start_time,
            request.end_time
        );

        request.validate()?;

        let CreateConsultationRequest {
            user_id,
            doctor_id,
            pet_type,
            pet_name,
            pet_age,
            disease_description,
            consultation_date,
            start_time,
            end_time,
            payment_proof,
        } = request;

        // **Step 1: Attachment intake**
        let attachment = attachment::intake(payment_proof, self.rules.max_attachment_bytes)?;
        debug!(
            "Payment proof accepted as {} ({} bytes)",
            attachment.kind.content_type(),
            attachment.size()
        );

        // **Step 2: Time normalization**
        let window = self
            .normalizer
            .normalize(&consultation_date, &start_time, &end_time)?;

        // **Step 3: Basic interval sanity**
        check_interval(&window, self.clock.now(), self.rules.min_duration)?;

        // **Step 4: Doctor existence**
        match self.directory.doctor_exists(doctor_id).await {
            Ok(true) => {}
            Ok(false) => return Err(ConsultationError::DoctorNotFound),
            Err(e) => {
                warn!("Doctor lookup failed for {}: {}", doctor_id, e);
                return Err(ConsultationError::DoctorNotFound);
            }
        }

        // **Step 5: Schedule fetch**
        let schedule = match self.directory.get_schedule(doctor_id).await {
            Ok(Some(schedule)) => schedule,
            Ok(None) => return Err(ConsultationError::DoctorNotFound),
            Err(e) => {
                warn!("Schedule lookup failed for doctor {}: {}", doctor_id, e);
                return Err(ConsultationError::DoctorNotFound);
            }
        };

        // **Step 6: Schedule validation**
        validate_schedule(window.start, window.end, &schedule, self.normalizer.timezone())?;

        // **Step 7: Doctor availability**
        let doctor_busy = self
            .availability
            .has_doctor_conflict(doctor_id, window.start, window.end)
            .await
            .map_err(|e| Self::check_failure(e, user_id, doctor_id))?;
        if doctor_busy {
            warn!("Doctor {} already booked for {} - {}", doctor_id, window.start, window.end);
            return Err(ConsultationError::DoctorNotAvailable);
        }

        // **Step 8: Double booking**
        let double_booked = self
            .availability
            .has_double_booking(doctor_id, user_id, window.start, window.end)
            .await
            .map_err(|e| Self::check_failure(e, user_id, doctor_id))?;
        if double_booked {
            warn!("User {} already has a consultation at {} - {}", user_id, window.start, window.end);
            return Err(ConsultationError::DuplicateBooking);
        }

        // **Step 9: Attachment upload**
        let payment_url = self.upload_payment_proof(&attachment, user_id, doctor_id).await?;

        // **Step 10: Persistence**
        let booking = NewConsultation {
            user_id,
            doctor_id,
            pet_type,
            pet_name,
            pet_age,
            disease_description,
            consultation_date: window.date,
            start_time: window.start,
            end_time: window.end,
            payment_proof: payment_url,
        };

        let identity = self.bookings.insert(&booking).await.map_err(|e| match e {
            StoreError::Conflict(ConflictSide::Doctor) => ConsultationError::DoctorNotAvailable,
            StoreError::Conflict(ConflictSide::Requester) => ConsultationError::DuplicateBooking,
            StoreError::Backend(msg) => {
                error!(
                    "Failed to persist consultation (user_id={}, doctor_id={}, file_size={}): {}; uploaded payment proof {} is orphaned",
                    user_id,
                    doctor_id,
                    attachment.size(),
                    msg,
                    booking.payment_proof
                );
                ConsultationError::PersistenceFailure(msg)
            }
        })?;

        let consultation = booking.into_persisted(identity);
        info!("Consultation {} booked for user {}", consultation.id, user_id);

        // **Step 11: Response assembly**
        Ok(ConsultationResponse {
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
            start_time_local: window.start_local,
            end_time_local: window.end_local,
            payment_proof: consultation.payment_proof,
            created_at: consultation.created_at,
            meet_link: Some(schedule.meet_link),
        })
    }

    async fn upload_payment_proof(
        &self,
        attachment: &Attachment,
        user_id: Uuid,
        doctor_id: Uuid,
    ) -> Result<String, ConsultationError> {
        // Unique per attempt: one user may book twice within the same second
        let public_id = format!(
            "payment_{}_{}_{}",
            user_id,
            self.clock.now().timestamp(),
            Uuid::new_v4().simple()
        );

        self.attachments
            .upload(attachment, &self.rules.upload_folder, &public_id)
            .await
            .map_err(|e| {
                error!(
                    "Failed to upload payment proof (user_id={}, doctor_id={}, file_size={}): {}",
                    user_id,
                    doctor_id,
                    attachment.size(),
                    e
                );
                ConsultationError::UploadFailure(e.to_string())
            })
    }

    fn check_failure(err: StoreError, user_id: Uuid, doctor_id: Uuid) -> ConsultationError {
        error!(
            "Availability check failed (user_id={}, doctor_id={}): {}",
            user_id, doctor_id, err
        );
        ConsultationError::PersistenceFailure(err.to_string())
    }
}
