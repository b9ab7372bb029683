pub mod geolocation;
pub mod reports;
pub mod social_analysis;
pub mod submission;
pub mod urgency;
