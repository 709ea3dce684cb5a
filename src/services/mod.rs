//! Service layer - business logic without the HTTP layer
//!
//! Handlers call into these functions and map `DomainError` to status codes.

pub mod engagement_service;
pub mod list_service;
pub mod review_service;
