//! Admin investor management and spreadsheet imports.
//!
//! - GET /api/admin/investors - Paginated, filterable list
//! - POST /api/admin/investors - Manual create
//! - PATCH /api/admin/investors/{id} - Partial update
//! - DELETE /api/admin/investors/{id} - Soft delete
//! - POST /api/admin/investors/bulk-delete - Soft delete many
//! - GET /api/admin/investors/export - CSV of active investors
//! - GET /api/admin/investors/template - CSV upload template
//! - POST /api/admin/investors/upload-excel - Flat-template import
//! - POST /api/admin/investors/upload-workbook - Named-sheet import

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    handlers::{MessageResponse, csv_download, read_upload},
    middleware::auth::AuthContext,
    models::{
        investor::{
            BulkDeleteRequest, BulkDeleteResponse, CreateInvestorRequest, Investor,
            InvestorFilters, UpdateInvestorRequest,
        },
        query::Page,
    },
    services::{export_service, ingestion, investor_service},
};

pub async fn list(
    State(pool): State<DbPool>,
    Query(filters): Query<InvestorFilters>,
) -> Result<Json<Page<Investor>>, AppError> {
    Ok(Json(investor_service::list(&pool, &filters).await?))
}

/// Create an investor by hand.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Sarah Chen",
///   "email": "sarah.chen@accel.com",
///   "company": "Accel Partners",
///   "ticketSize": { "min": 500000, "max": 2000000 },
///   "industries": ["AI/ML", "SaaS"]
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: `{message, data}`
/// - **400**: missing name/email, or the email is already taken
pub async fn create(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateInvestorRequest>,
) -> Result<(StatusCode, Json<MessageResponse<Investor>>), AppError> {
    let investor = investor_service::create(&pool, request, auth.user_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Investor created successfully", investor)),
    ))
}

pub async fn update(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInvestorRequest>,
) -> Result<Json<MessageResponse<Investor>>, AppError> {
    let investor = investor_service::update(&pool, id, request).await?;
    Ok(Json(MessageResponse::new(
        "Investor updated successfully",
        investor,
    )))
}

/// Soft delete: the investor is hidden from founders but kept.
pub async fn delete(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    investor_service::deactivate(&pool, id).await?;
    Ok(Json(json!({ "message": "Investor deleted successfully" })))
}

pub async fn bulk_delete(
    State(pool): State<DbPool>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    let count = investor_service::deactivate_many(&pool, &request.ids).await?;
    Ok(Json(BulkDeleteResponse {
        message: format!("{count} investors deleted successfully"),
        count,
    }))
}

pub async fn export(State(pool): State<DbPool>) -> Result<Response, AppError> {
    let investors = investor_service::list_active(&pool).await?;
    let bytes = export_service::investors_csv(&investors)?;
    Ok(csv_download("investors_export.csv", bytes))
}

pub async fn template() -> Result<Response, AppError> {
    let bytes = export_service::investor_template_csv()?;
    Ok(csv_download("investors_template.csv", bytes))
}

/// Import investors from the flat template (first sheet only).
///
/// Invalid rows are skipped and reported as `Row N: ...`. When no row is
/// valid the response is a 400 that still carries the row errors and stats.
///
/// # Response (200 OK)
///
/// ```json
/// {
///   "message": "Investors imported successfully",
///   "stats": { "totalRows": 3, "validRows": 2, "invalidRows": 1, "imported": 1, "duplicates": 1 },
///   "errors": ["Row 4: Invalid email format"],
///   "duplicateEmails": ["sarah.chen@accel.com"]
/// }
/// ```
pub async fn upload_excel(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let upload = read_upload(multipart).await?;
    let sheets = ingestion::load_workbook(&upload.filename, upload.bytes)?;
    let import = investor_service::import_flat(&pool, sheets, auth.user_id).await?;

    if import.stats.valid_rows == 0 {
        let body = json!({
            "error": {
                "code": "invalid_request",
                "message": "No valid investor rows found",
            },
            "errors": import.errors,
            "stats": import.stats,
        });
        return Ok((StatusCode::BAD_REQUEST, Json(body)).into_response());
    }

    tracing::info!(
        admin_id = %auth.user_id,
        imported = import.stats.imported,
        duplicates = import.stats.duplicates,
        invalid = import.stats.invalid_rows,
        "flat investor import finished"
    );

    Ok(Json(json!({
        "message": "Investors imported successfully",
        "stats": import.stats,
        "errors": import.errors,
        "duplicateEmails": import.duplicate_emails,
    }))
    .into_response())
}

/// Import the `Angel Investors` and `Institutional Investors` sheets of a
/// workbook, upserting on email.
pub async fn upload_workbook(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<serde_json::Value>, AppError> {
    let upload = read_upload(multipart).await?;
    let sheets = ingestion::load_workbook(&upload.filename, upload.bytes)?;
    let (stats, errors) = investor_service::import_workbook(&pool, sheets, auth.user_id).await?;

    tracing::info!(
        admin_id = %auth.user_id,
        created = stats.created,
        updated = stats.updated,
        errors = stats.errors,
        "workbook investor import finished"
    );

    Ok(Json(json!({
        "message": "Workbook processed",
        "stats": stats,
        "errors": errors,
    })))
}
