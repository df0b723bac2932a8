//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, validation, imports and calls to
//! third-party APIs.

pub mod activity_service;
pub mod auth_service;
pub mod dashboard_service;
pub mod email_service;
pub mod export_service;
pub mod ingestion;
pub mod investor_service;
pub mod parsing;
pub mod payment_service;
pub mod potential_investor_service;
pub mod subscription_service;
pub mod user_service;
