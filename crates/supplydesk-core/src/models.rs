//! Domain models for the supplier directory.

pub mod segment;
pub mod supplier;
pub mod view;
