pub mod analytics;
pub mod dashboard;
pub mod geolocation;
pub mod health;
pub mod map;
pub mod reports;
pub mod session;
