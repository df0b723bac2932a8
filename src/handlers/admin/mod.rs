//! `/api/admin` handlers. Every route here runs behind `session_auth`,
//! `require_admin` and the activity logger.

pub mod dashboard;
pub mod investors;
pub mod potential_investors;
pub mod subscriptions;
pub mod users;
