//! Admin user management.
//!
//! - GET /api/admin/users - Paginated, filterable list
//! - GET /api/admin/users/export - CSV of the filtered list
//! - GET /api/admin/users/{id} - User with their subscription
//! - PATCH /api/admin/users/{id}/status - Activate, suspend or delete

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
        user::{UpdateUserStatusRequest, UserDetails, UserFilters, UserResponse, parse_account_status},
    },
    services::{export_service, user_service},
};

/// List users, newest signups first.
///
/// # Query Parameters
///
/// `page`, `limit`, `search` (name or email), `subscriptionPlan`,
/// `subscriptionStatus`, `accountStatus`, `userType`, `startDate`, `endDate`.
/// Blank values are ignored.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "data": [ { "id": "...", "name": "Ada", "email": "ada@example.com", ... } ],
///   "pagination": { "page": 1, "limit": 50, "total": 1, "pages": 1 }
/// }
/// ```
pub async fn list(
    State(pool): State<DbPool>,
    Query(filters): Query<UserFilters>,
) -> Result<Json<Page<UserResponse>>, AppError> {
    Ok(Json(user_service::list(&pool, &filters).await?))
}

pub async fn export(
    State(pool): State<DbPool>,
    Query(filters): Query<UserFilters>,
) -> Result<Response, AppError> {
    let users = user_service::list_all(&pool, &filters).await?;
    let bytes = export_service::users_csv(&users)?;
    Ok(csv_download("users_export.csv", bytes))
}

pub async fn details(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserDetails>, AppError> {
    Ok(Json(user_service::details(&pool, id).await?))
}

/// Change a user's account status.
///
/// # Request Body
///
/// ```json
/// { "accountStatus": "suspended" }
/// ```
///
/// Anything other than `active`, `suspended` or `deleted` is a 400.
/// Leaving `active` logs the user out everywhere.
pub async fn update_status(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateUserStatusRequest>,
) -> Result<Json<MessageResponse<UserResponse>>, AppError> {
    let status = parse_account_status(request.account_status.trim()).ok_or_else(|| {
        AppError::InvalidRequest(
            "Invalid account status. Must be one of: active, suspended, deleted".to_string(),
        )
    })?;

    let user = user_service::set_account_status(&pool, id, status).await?;
    Ok(Json(MessageResponse::new(
        "User status updated successfully",
        user,
    )))
}
