//! Keycloak bearer-token guard for axum services.
//!
//! Verifies realm-signed access tokens against the configured realm public key,
//! authorizes them against an allow-list of client resources and maps a claim
//! to the authenticated [`Principal`](services::auth::Principal).

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod repos;
pub mod services;
pub mod state;
