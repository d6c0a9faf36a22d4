//! Field-workforce attendance service.
//!
//! The binary in `main.rs` runs the HTTP surface; the library exposes the
//! device-facing capture core (`capture`, `geofence`, `model`, `store`) for
//! check-in clients that embed it directly.

pub mod api;
pub mod auth;
pub mod capture;
pub mod config;
pub mod db;
pub mod docs;
pub mod geofence;
pub mod model;
pub mod models;
pub mod routes;
pub mod store;
pub mod utils;
