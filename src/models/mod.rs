//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response bodies built around them.

/// Admin audit trail
pub mod admin_activity;
/// Founder and admin dashboard shapes
pub mod dashboard;
/// Mailbox connections and email logs
pub mod email;
/// Canonical investor records
pub mod investor;
/// Razorpay checkout bodies
pub mod payment;
/// Imported leads and their review workflow
pub mod potential_investor;
/// Shared query-string and pagination helpers
pub mod query;
/// Bearer sessions
pub mod session;
/// Subscriptions and billing history
pub mod subscription;
/// Users and auth bodies
pub mod user;
