//! Admin dashboard, activity log and system health.

use axum::{
    Json,
    extract::{Query, State},
};

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        admin_activity::{ActivityFilters, AdminActivity},
        dashboard::{AdminDashboard, SystemHealth},
        query::Page,
    },
    services::{activity_service, dashboard_service},
    state::AppState,
};

/// `GET /api/admin/dashboard/stats`
pub async fn stats(State(pool): State<DbPool>) -> Result<Json<AdminDashboard>, AppError> {
    Ok(Json(dashboard_service::admin_dashboard(&pool).await?))
}

/// `GET /api/admin/dashboard/activity-log?page&limit&action&targetType&adminId`
pub async fn activity_log(
    State(pool): State<DbPool>,
    Query(filters): Query<ActivityFilters>,
) -> Result<Json<Page<AdminActivity>>, AppError> {
    Ok(Json(activity_service::list(&pool, &filters).await?))
}

/// `GET /api/admin/system/health`
pub async fn system_health(State(state): State<AppState>) -> Json<SystemHealth> {
    Json(dashboard_service::system_health(&state.pool, state.started_at).await)
}
