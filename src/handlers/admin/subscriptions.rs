//! Admin subscription management and revenue analytics.

use axum::{
    Json,
    extract::{Path, Query, State},
    response::Response,
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    handlers::{MessageResponse, csv_download},
    models::{
        query::Page,
        subscription::{
            RevenueAnalytics, RevenueFilters, Subscription, SubscriptionFilters,
            SubscriptionWithUser, UpdateSubscriptionRequest,
        },
    },
    services::{export_service, subscription_service},
};

/// `GET /api/admin/subscriptions?page&limit&plan&status&search`
pub async fn list(
    State(pool): State<DbPool>,
    Query(filters): Query<SubscriptionFilters>,
) -> Result<Json<Page<SubscriptionWithUser>>, AppError> {
    Ok(Json(subscription_service::list(&pool, &filters).await?))
}

/// `GET /api/admin/subscriptions/export`
pub async fn export(
    State(pool): State<DbPool>,
    Query(filters): Query<SubscriptionFilters>,
) -> Result<Response, AppError> {
    let subscriptions = subscription_service::list_all(&pool, &filters).await?;
    let bytes = export_service::subscriptions_csv(&subscriptions)?;
    Ok(csv_download("subscriptions_export.csv", bytes))
}

/// Partially update a subscription.
///
/// The owner's `subscriptionPlan` and `subscriptionStatus` are updated in
/// the same transaction.
pub async fn update(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSubscriptionRequest>,
) -> Result<Json<MessageResponse<Subscription>>, AppError> {
    let subscription = subscription_service::update(&pool, id, request).await?;
    Ok(Json(MessageResponse::new(
        "Subscription updated successfully",
        subscription,
    )))
}

/// `GET /api/admin/revenue/analytics?startDate&endDate`
///
/// MRR and ARR are in minor units. Churn is a percentage with two decimals.
pub async fn revenue_analytics(
    State(pool): State<DbPool>,
    Query(filters): Query<RevenueFilters>,
) -> Result<Json<RevenueAnalytics>, AppError> {
    Ok(Json(
        subscription_service::revenue_analytics(&pool, &filters).await?,
    ))
}
