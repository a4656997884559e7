//! Dinosaur aggregate.

mod service;

pub use service::DinosaurService;
