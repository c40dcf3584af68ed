pub mod doctor;
pub mod validation;

pub use doctor::DoctorService;
