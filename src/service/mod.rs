pub mod alerts;
pub mod donation;

pub use alerts::{AlertService, CreateAlertForm, ImageUpload};
pub use donation::{register_donation, DonationForm};
