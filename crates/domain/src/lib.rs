//! # propdesk-domain
//!
//! Pure domain model for the propdesk property back office.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **entity schemas** (the allow-list of fields per kind: properties,
//!   agents, enquiries, questions, valuations, profiles)
//! - Define **values** and their coercion from loosely-typed input
//! - Define **listings** and the create/patch rules, including derived slugs
//! - Define **queries** (filters, sort, page window) and **expansion** plans
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod expansion;
pub mod listing;
pub mod query;
pub mod schema;
pub mod slug;
pub mod value;
