//! Founder-facing read endpoints under `/api`.

use axum::{Extension, Json, extract::State};

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        dashboard::FounderStats,
        email::Campaign,
        investor::InvestorCard,
        user::ProfileResponse,
    },
    services::{dashboard_service, email_service, investor_service, user_service},
};

/// `GET /api/user/profile`
pub async fn profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProfileResponse>, AppError> {
    let user = user_service::find(&pool, auth.user_id).await?;

    Ok(Json(ProfileResponse {
        name: user.name,
        email: user.email,
        profile_completion: user.profile_completion,
        current_plan: user.subscription_plan.display_name(),
        subscription_status: user.subscription_status,
    }))
}

/// `GET /api/dashboard/stats`
pub async fn dashboard_stats(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<FounderStats>, AppError> {
    Ok(Json(
        dashboard_service::founder_stats(&pool, auth.user_id).await?,
    ))
}

/// `GET /api/investors`
///
/// Every active investor, newest first, in card shape.
pub async fn investors(State(pool): State<DbPool>) -> Result<Json<Vec<InvestorCard>>, AppError> {
    let investors = investor_service::list_active(&pool).await?;
    Ok(Json(investors.into_iter().map(InvestorCard::from).collect()))
}

/// `GET /api/grants`
pub async fn grants(State(pool): State<DbPool>) -> Result<Json<Vec<InvestorCard>>, AppError> {
    let grants = investor_service::list_grants(&pool).await?;
    Ok(Json(grants.into_iter().map(InvestorCard::from).collect()))
}

/// `GET /api/crm/campaigns`
pub async fn campaigns(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<Campaign>>, AppError> {
    Ok(Json(email_service::campaigns(&pool, auth.user_id).await?))
}
