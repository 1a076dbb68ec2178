//! # propdesk-adapter-http-axum
//!
//! HTTP adapter built on [axum](https://docs.rs/axum).
//!
//! ## Responsibilities
//! - Serve a JSON API over every entity kind
//!   (`/api/properties`, `/api/agents/{id}`, …)
//! - Map query strings and JSON bodies into application service calls
//!   (driving adapter)
//! - Map service results and errors into HTTP responses
//! - Fire create notifications for the kinds that ask for them
//!
//! ## Dependency rule
//! Depends on `propdesk-app` (for port traits and services) and
//! `propdesk-domain` (for domain types used in request/response mapping).
//! Never leaks axum types into the domain.

pub mod api;
pub mod error;
pub mod router;
pub mod state;
