//! Admin audit trail models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::query::{empty_as_none, parsed_or_none};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_target", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityTarget {
    User,
    Investor,
    Subscription,
    System,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "activity_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    Success,
    Failed,
    Pending,
}

/// Activity row joined with the acting admin.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminActivity {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub admin_name: Option<String>,
    pub admin_email: Option<String>,
    pub action: String,
    pub target_type: ActivityTarget,
    pub target_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: ActivityStatus,
    pub error_message: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Insert payload written by the activity middleware.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub admin_id: Uuid,
    pub action: &'static str,
    pub target_type: ActivityTarget,
    pub target_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Query parameters for `GET /api/admin/dashboard/activity-log`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityFilters {
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub action: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub target_type: Option<ActivityTarget>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub admin_id: Option<Uuid>,
}
