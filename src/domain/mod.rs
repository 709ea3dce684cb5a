//! Domain layer - Pure business abstractions
//!
//! No framework dependencies here, only the domain error taxonomy shared by
//! the service and API layers.

pub mod errors;

pub use errors::DomainError;
