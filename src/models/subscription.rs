//! Subscription data models and API request/response types.
//!
//! This module defines:
//! - Plan, status and payment enums shared with the `users` table
//! - `Subscription`: one row per user in the `subscriptions` table
//! - `BillingEntry`: payment history rows
//! - Admin update request and list/analytics response shapes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::query::{empty_as_none, flexible_datetime, parsed_or_none};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_plan", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Pro,
    Enterprise,
}

impl SubscriptionPlan {
    /// Name shown on the founder profile card.
    pub fn display_name(self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "Free",
            SubscriptionPlan::Pro => "Pro",
            SubscriptionPlan::Enterprise => "Enterprise",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Cancelled,
    Expired,
    Trial,
}

impl SubscriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::Trial => "trial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Card,
    BankTransfer,
    Paypal,
    Other,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Paypal => "paypal",
            PaymentMethod::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "billing_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BillingStatus {
    Success,
    Failed,
    Pending,
    Refunded,
}

/// Represents a subscription record from the database.
///
/// Amounts are stored in minor units (cents/paise), like every money column
/// in this service.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan: SubscriptionPlan,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub renewal_date: Option<DateTime<Utc>>,
    pub amount_cents: i64,
    pub currency: String,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Subscription joined with the owning user's name and email.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub subscription: Subscription,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
}

/// Billing history row.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingEntry {
    pub id: Uuid,
    pub subscription_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub amount_cents: i64,
    pub status: BillingStatus,
    pub transaction_id: Option<String>,
    pub description: Option<String>,
}

/// Query parameters for `GET /api/admin/subscriptions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionFilters {
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub limit: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub plan: Option<SubscriptionPlan>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<SubscriptionStatus>,
    /// Matches the owner's name or email
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
}

/// Query parameters for `GET /api/admin/revenue/analytics`.
///
/// The window restricts which subscriptions count towards MRR, by creation date.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueFilters {
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "flexible_datetime")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Partial update for `PATCH /api/admin/subscriptions/{id}`.
///
/// Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub plan: Option<SubscriptionPlan>,
    pub status: Option<SubscriptionStatus>,
    pub amount_cents: Option<i64>,
    pub currency: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub end_date: Option<DateTime<Utc>>,
    pub renewal_date: Option<DateTime<Utc>>,
}

/// Per-plan slice of active subscriptions.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanBreakdown {
    pub plan: String,
    pub count: i64,
    pub revenue_cents: i64,
}

/// Latest billing entry per subscription, for the revenue page.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransaction {
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub plan: SubscriptionPlan,
    pub amount_cents: i64,
    pub date: DateTime<Utc>,
    pub status: BillingStatus,
}

/// Response body for `GET /api/admin/revenue/analytics`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenueAnalytics {
    pub mrr_cents: i64,
    pub arr_cents: i64,
    pub churn_rate: f64,
    pub active_subscriptions: i64,
    pub plan_breakdown: Vec<PlanBreakdown>,
    pub recent_transactions: Vec<RecentTransaction>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enums_use_database_spelling() {
        assert_eq!(
            serde_json::to_value(PaymentMethod::BankTransfer).unwrap(),
            "bank_transfer"
        );
        assert_eq!(PaymentMethod::BankTransfer.as_str(), "bank_transfer");
        assert_eq!(serde_json::to_value(SubscriptionPlan::Pro).unwrap(), "pro");
    }

    #[test]
    fn update_request_accepts_partial_bodies() {
        let request: UpdateSubscriptionRequest =
            serde_json::from_str(r#"{"status": "cancelled"}"#).unwrap();
        assert_eq!(request.status, Some(SubscriptionStatus::Cancelled));
        assert!(request.plan.is_none());
        assert!(request.amount_cents.is_none());
    }
}
