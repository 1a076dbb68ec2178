//! # propdesk-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `ListingRepository`: filtered reads and CRUD for every entity kind
//!   - `Notifier`: confirmation and alert messages after creates
//! - Define the **driving/inbound** use-case service:
//!   - `ListingService`: list, get, create, update, delete, relation expansion
//! - Orchestrate domain objects without knowing *how* persistence or IO works
//!
//! ## Dependency rule
//! Depends on `propdesk-domain` only.
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod ports;
pub mod services;
