//! JWT bearer authentication middleware for axum.
//!
//! The core lives in [`services::auth`]: an ordered extractor chain over
//! header / query / path / cookie / form sources, pluggable key resolution
//! (single key or `kid` map) and a verifier that refuses algorithm downgrades.
//! [`middleware::auth::apply`] wires it into a router; handlers read the
//! verified claims through [`api::v1::extractors::Authenticated`].

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
