//! Domain layer for the faqbot pipeline
//!
//! Core models, errors and the ports the services are written against.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
