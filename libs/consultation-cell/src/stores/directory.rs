use async_trait::async_trait;
use uuid::Uuid;

use doctor_cell::models::{DoctorError, DoctorSchedule};
use doctor_cell::services::doctor::DoctorService;

use super::{DoctorDirectory, StoreError};

/// Serves doctor lookups from the doctor cell.
pub struct DoctorServiceDirectory {
    doctors: DoctorService,
}

impl DoctorServiceDirectory {
    pub fn new(doctors: DoctorService) -> Self {
        Self { doctors }
    }
}

#[async_trait]
impl DoctorDirectory for DoctorServiceDirectory {
    async fn doctor_exists(&self, doctor_id: Uuid) -> Result<bool, StoreError> {
        self.doctors
            .doctor_exists(doctor_id)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn get_schedule(&self, doctor_id: Uuid) -> Result<Option<DoctorSchedule>, StoreError> {
        match self.doctors.get_schedule(doctor_id).await {
            Ok(schedule) => Ok(Some(schedule)),
            Err(DoctorError::NotFound) => Ok(None),
            Err(e) => Err(StoreError::Backend(e.to_string())),
        }
    }
}
