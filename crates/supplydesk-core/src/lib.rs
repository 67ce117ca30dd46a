//! Supplydesk Core — domain types shared by every supplier directory crate.
//!
//! Contains the models, the error taxonomy, input validation and the
//! store traits that the database layer implements and the service
//! layer consumes.

pub mod error;
pub mod models;
pub mod plan;
pub mod repository;
pub mod validation;
