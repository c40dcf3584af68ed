use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{Duration, TimeZone, Utc};
use uuid::Uuid;

use consultation_cell::models::{ConsultationError, CreateConsultationRequest};
use consultation_cell::services::availability::overlaps;
use consultation_cell::services::booking::{BookingRules, ConsultationService};
use consultation_cell::services::clock::FixedClock;
use consultation_cell::stores::{
    InMemoryAttachmentStore, InMemoryBookingStore, InMemoryDoctorDirectory,
};
use doctor_cell::models::{DoctorSchedule, WorkingHours};

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

struct Clinic {
    service: ConsultationService,
    bookings: Arc<InMemoryBookingStore>,
    attachments: Arc<InMemoryAttachmentStore>,
    doctor_a: Uuid,
    doctor_b: Uuid,
}

fn weekday_schedule() -> DoctorSchedule {
    DoctorSchedule {
        meet_link: "https://meet.google.com/abc-defg-hij".to_string(),
        price_per_hour: 150000.0,
        working_days: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday"]
            .iter()
            .map(|d| d.to_string())
            .collect(),
        working_hours: WorkingHours {
            start: "08:00".to_string(),
            end: "20:00".to_string(),
        },
    }
}

fn clinic_with(attachments: InMemoryAttachmentStore) -> Clinic {
    let doctor_a = Uuid::new_v4();
    let doctor_b = Uuid::new_v4();

    let directory = InMemoryDoctorDirectory::new()
        .with_doctor(doctor_a, weekday_schedule())
        .with_doctor(doctor_b, weekday_schedule());
    let bookings = Arc::new(InMemoryBookingStore::new());
    let attachments = Arc::new(attachments);

    // Sunday 2025-06-01 00:00 WIB
    let now = Utc.with_ymd_and_hms(2025, 5, 31, 17, 0, 0).unwrap();

    let service = ConsultationService::new(
        Arc::new(directory),
        bookings.clone(),
        attachments.clone(),
        Arc::new(FixedClock(now)),
        BookingRules::default(),
    );

    Clinic {
        service,
        bookings,
        attachments,
        doctor_a,
        doctor_b,
    }
}

fn clinic() -> Clinic {
    clinic_with(InMemoryAttachmentStore::new("https://storage.test"))
}

fn request(user_id: Uuid, doctor_id: Uuid, date: &str, start: &str, end: &str) -> CreateConsultationRequest {
    CreateConsultationRequest {
        user_id,
        doctor_id,
        pet_type: "cat".to_string(),
        pet_name: "Mochi".to_string(),
        pet_age: 3,
        disease_description: "Sneezing and watery eyes for three days".to_string(),
        consultation_date: date.to_string(),
        start_time: start.to_string(),
        end_time: end.to_string(),
        payment_proof: JPEG.to_vec(),
    }
}

#[tokio::test]
async fn test_monday_morning_booking_succeeds() {
    let clinic = clinic();
    let owner = Uuid::new_v4();

    let response = clinic
        .service
        .create_consultation(request(owner, clinic.doctor_a, "2025-06-02", "09:00", "09:30"))
        .await
        .unwrap();

    assert_eq!(response.user_id, owner);
    assert_eq!(response.doctor_id, clinic.doctor_a);
    assert_eq!(response.consultation_date, "2025-06-02");
    assert_eq!(response.start_time_utc, "2025-06-02T02:00:00Z");
    assert_eq!(response.end_time_utc, "2025-06-02T02:30:00Z");
    assert_eq!(response.start_time_local, "2025-06-02 09:00:00");
    assert_eq!(response.end_time_local, "2025-06-02 09:30:00");
    assert_eq!(response.meet_link.as_deref(), Some("https://meet.google.com/abc-defg-hij"));
    assert!(response.payment_proof.starts_with("https://storage.test/payment_proofs/payment_"));
    assert!(response.payment_proof.ends_with(".jpg"));

    let stored = clinic.bookings.snapshot();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].id, response.id);
    assert_eq!(stored[0].end_time - stored[0].start_time, Duration::minutes(30));

    let objects = clinic.attachments.objects();
    assert_eq!(objects.len(), 1);
    assert_eq!(objects[0].content_type, "image/jpeg");
    assert_eq!(objects[0].size, JPEG.len());
}

#[tokio::test]
async fn test_saturday_is_invalid_working_day() {
    let clinic = clinic();

    let result = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-07", "09:00", "09:30"))
        .await;

    assert_matches!(result, Err(ConsultationError::InvalidWorkingDay(_)));
    assert!(clinic.bookings.snapshot().is_empty());
}

#[tokio::test]
async fn test_before_opening_is_outside_working_hours() {
    let clinic = clinic();

    let result = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "07:00", "07:30"))
        .await;

    assert_matches!(result, Err(ConsultationError::OutsideWorkingHours(_)));
}

#[tokio::test]
async fn test_running_past_closing_is_outside_working_hours() {
    let clinic = clinic();

    let result = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "19:45", "20:15"))
        .await;

    assert_matches!(result, Err(ConsultationError::OutsideWorkingHours(_)));
}

#[tokio::test]
async fn test_same_slot_twice_is_doctor_not_available() {
    let clinic = clinic();

    clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "09:00", "09:30"))
        .await
        .unwrap();

    let second = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "09:00", "09:30"))
        .await;

    assert_matches!(second, Err(ConsultationError::DoctorNotAvailable));
    assert_eq!(clinic.bookings.snapshot().len(), 1);
    assert_eq!(clinic.attachments.objects().len(), 1);
}

#[tokio::test]
async fn test_partial_overlap_is_doctor_not_available() {
    let clinic = clinic();

    clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "09:00", "10:00"))
        .await
        .unwrap();

    let second = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "09:30", "10:30"))
        .await;

    assert_matches!(second, Err(ConsultationError::DoctorNotAvailable));
}

#[tokio::test]
async fn test_back_to_back_slots_are_allowed() {
    let clinic = clinic();

    clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "09:00", "09:30"))
        .await
        .unwrap();
    clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "09:30", "10:00"))
        .await
        .unwrap();

    assert_eq!(clinic.bookings.snapshot().len(), 2);
}

#[tokio::test]
async fn test_same_owner_two_doctors_overlapping_is_duplicate() {
    let clinic = clinic();
    let owner = Uuid::new_v4();

    clinic
        .service
        .create_consultation(request(owner, clinic.doctor_a, "2025-06-02", "09:00", "09:30"))
        .await
        .unwrap();

    let second = clinic
        .service
        .create_consultation(request(owner, clinic.doctor_b, "2025-06-02", "09:15", "09:45"))
        .await;

    assert_matches!(second, Err(ConsultationError::DuplicateBooking));
}

#[tokio::test]
async fn test_same_owner_same_doctor_non_overlapping_is_allowed() {
    let clinic = clinic();
    let owner = Uuid::new_v4();

    clinic
        .service
        .create_consultation(request(owner, clinic.doctor_a, "2025-06-02", "09:00", "09:30"))
        .await
        .unwrap();
    clinic
        .service
        .create_consultation(request(owner, clinic.doctor_a, "2025-06-03", "09:00", "09:30"))
        .await
        .unwrap();

    assert_eq!(clinic.bookings.snapshot().len(), 2);
}

#[tokio::test]
async fn test_same_second_bookings_get_distinct_payment_proofs() {
    let clinic = clinic();
    let owner = Uuid::new_v4();

    let first = clinic
        .service
        .create_consultation(request(owner, clinic.doctor_a, "2025-06-02", "09:00", "09:30"))
        .await
        .unwrap();
    let second = clinic
        .service
        .create_consultation(request(owner, clinic.doctor_a, "2025-06-03", "09:00", "09:30"))
        .await
        .unwrap();

    assert_ne!(first.payment_proof, second.payment_proof);

    let prefix = format!("https://storage.test/payment_proofs/payment_{}_", owner);
    assert!(first.payment_proof.starts_with(&prefix));
    assert!(second.payment_proof.starts_with(&prefix));

    let objects = clinic.attachments.objects();
    assert_eq!(objects.len(), 2);
    assert_ne!(objects[0].path, objects[1].path);
}

#[tokio::test]
async fn test_past_start_is_rejected() {
    let clinic = clinic();

    let result = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-05-30", "09:00", "09:30"))
        .await;

    assert_matches!(result, Err(ConsultationError::ConsultationPastDate));
}

#[tokio::test]
async fn test_short_and_inverted_windows_are_rejected() {
    let clinic = clinic();

    let short = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "09:00", "09:20"))
        .await;
    assert_matches!(short, Err(ConsultationError::DurationTooShort { minimum: 30 }));

    let inverted = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "10:00", "09:00"))
        .await;
    assert_matches!(inverted, Err(ConsultationError::InvalidInterval));
}

#[tokio::test]
async fn test_unknown_doctor_is_not_found() {
    let clinic = clinic();

    let result = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), Uuid::new_v4(), "2025-06-02", "09:00", "09:30"))
        .await;

    assert_matches!(result, Err(ConsultationError::DoctorNotFound));
}

#[tokio::test]
async fn test_malformed_time_is_invalid_format() {
    let clinic = clinic();

    let result = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "9am", "09:30"))
        .await;

    assert_matches!(result, Err(ConsultationError::InvalidTimeFormat(_)));
}

#[tokio::test]
async fn test_non_image_attachment_is_rejected() {
    let clinic = clinic();
    let mut req = request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "09:00", "09:30");
    req.payment_proof = b"GIF89a fake".to_vec();

    let result = clinic.service.create_consultation(req).await;

    assert_matches!(result, Err(ConsultationError::InvalidFileType(_)));
    assert!(clinic.attachments.objects().is_empty());
}

#[tokio::test]
async fn test_upload_failure_leaves_no_booking() {
    let clinic = clinic_with(InMemoryAttachmentStore::failing());

    let result = clinic
        .service
        .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-02", "09:00", "09:30"))
        .await;

    assert_matches!(result, Err(ConsultationError::UploadFailure(_)));
    assert!(clinic.bookings.snapshot().is_empty());
}

#[tokio::test]
async fn test_accepted_bookings_per_doctor_are_disjoint() {
    let clinic = clinic();
    let slots = [
        ("08:00", "09:00"),
        ("08:30", "09:30"),
        ("09:00", "09:30"),
        ("09:15", "10:15"),
        ("10:00", "11:00"),
        ("10:30", "11:00"),
        ("11:00", "11:30"),
        ("07:30", "08:30"),
        ("19:30", "20:00"),
    ];

    for (start, end) in slots {
        let _ = clinic
            .service
            .create_consultation(request(Uuid::new_v4(), clinic.doctor_a, "2025-06-04", start, end))
            .await;
    }

    let stored = clinic.bookings.snapshot();
    assert!(stored.len() >= 4);
    for (i, a) in stored.iter().enumerate() {
        assert!(a.end_time - a.start_time >= Duration::minutes(30));
        for b in stored.iter().skip(i + 1) {
            assert!(!overlaps(a.start_time, a.end_time, b.start_time, b.end_time));
        }
    }
}

#[tokio::test]
async fn test_concurrent_requests_for_one_slot_yield_one_booking() {
    let clinic = Arc::new(clinic());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let clinic = Arc::clone(&clinic);
        handles.push(tokio::spawn(async move {
            clinic
                .service
                .create_consultation(request(Uuid::new_v4(), clinic.doctor_b, "2025-06-05", "13:00", "13:30"))
                .await
        }));
    }

    let mut accepted = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(e) => assert_matches!(e, ConsultationError::DoctorNotAvailable),
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(clinic.bookings.snapshot().len(), 1);
}
