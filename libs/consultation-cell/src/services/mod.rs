pub mod attachment;
pub mod availability;
pub mod booking;
pub mod clock;
pub mod listing;
pub mod schedule;
pub mod time;

pub use booking::{BookingRules, ConsultationService};
pub use listing::ListingService;
