//! Response shapes for the founder and admin dashboards.

use serde::Serialize;

use crate::models::{
    admin_activity::AdminActivity, subscription::PlanBreakdown, user::RecentSignup,
};

/// Response body for `GET /api/dashboard/stats`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FounderStats {
    pub potential_matches: i64,
    pub grants_available: i64,
    pub active_investors: i64,
    pub profile_views: i64,
    pub emails_sent: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub total_users: i64,
    pub active_users: i64,
    pub total_subscriptions: i64,
    pub active_subscriptions: i64,
    pub total_investors: i64,
    pub verified_investors: i64,
    pub recent_signups: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Revenue {
    pub mrr_cents: i64,
    pub arr_cents: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserTypeCount {
    pub user_type: String,
    pub count: i64,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct DailyCount {
    /// `YYYY-MM-DD`
    pub date: String,
    pub count: i64,
}

/// Response body for `GET /api/admin/dashboard/stats`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub overview: Overview,
    pub revenue: Revenue,
    pub subscription_breakdown: Vec<PlanBreakdown>,
    pub user_type_breakdown: Vec<UserTypeCount>,
    pub signup_trend: Vec<DailyCount>,
    pub recent_signups: Vec<RecentSignup>,
    pub recent_activities: Vec<AdminActivity>,
}

#[derive(Debug, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TableEstimate {
    pub table: String,
    pub rows: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseHealth {
    pub status: &'static str,
    pub tables: Vec<TableEstimate>,
}

/// Response body for `GET /api/admin/system/health`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub database: DatabaseHealth,
    pub uptime_seconds: u64,
    pub version: &'static str,
}
