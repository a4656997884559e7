//! Cage aggregate: creation, lookup and power status.

pub mod rules;
mod service;

pub use service::CageService;
