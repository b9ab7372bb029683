//! Domain types and the pure view logic shared by the coastal hazard services.
//!
//! Nothing in here performs I/O: every function derives its output from a
//! report list that was fetched elsewhere.

pub mod filter;
pub mod map;
pub mod models;
pub mod presentation;
pub mod stats;
