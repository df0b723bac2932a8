//! Potential-investor review queue.
//!
//! Leads come in through spreadsheet uploads, get edited and reviewed, and
//! are promoted into `investors` on approval.

use axum::{
    Extension, Json,
    extract::{Multipart, Path, Query, State},
};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    handlers::{MessageResponse, read_upload},
    middleware::auth::AuthContext,
    models::{
        potential_investor::{
            LeadImportResult, PotentialInvestor, PotentialInvestorFilters, ReviewAction,
            ReviewOutcome, ReviewRequest, UpdatePotentialInvestorRequest,
        },
        query::Page,
    },
    services::{ingestion, potential_investor_service},
};

/// List leads in serial order.
///
/// # Query Parameters
///
/// - `status`: `pending`, `verified`, `approved` or `rejected`
/// - `search`: company, names, email or serial number
/// - `fromSerial` / `toSerial`: inclusive range, as `AA0012` or `12`
pub async fn list(
    State(pool): State<DbPool>,
    Query(filters): Query<PotentialInvestorFilters>,
) -> Result<Json<Page<PotentialInvestor>>, AppError> {
    Ok(Json(potential_investor_service::list(&pool, &filters).await?))
}

pub async fn get(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
) -> Result<Json<PotentialInvestor>, AppError> {
    Ok(Json(potential_investor_service::get(&pool, id).await?))
}

/// Edit a lead. Approved leads are locked (409).
pub async fn update(
    State(pool): State<DbPool>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdatePotentialInvestorRequest>,
) -> Result<Json<MessageResponse<PotentialInvestor>>, AppError> {
    let lead = potential_investor_service::update(&pool, id, request).await?;
    Ok(Json(MessageResponse::new(
        "Potential investor updated successfully",
        lead,
    )))
}

async fn review(
    pool: &DbPool,
    auth: &AuthContext,
    id: Uuid,
    action: ReviewAction,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<ReviewOutcome>, AppError> {
    let admin_notes = body.and_then(|Json(request)| request.admin_notes);
    let outcome =
        potential_investor_service::review(pool, id, action, auth.user_id, admin_notes).await?;
    Ok(Json(outcome))
}

pub async fn verify(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<ReviewOutcome>, AppError> {
    review(&pool, &auth, id, ReviewAction::Verify, body).await
}

/// Approve a lead and promote it into `investors`.
///
/// The response carries `investorId`, the created or linked investor.
pub async fn approve(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<ReviewOutcome>, AppError> {
    review(&pool, &auth, id, ReviewAction::Approve, body).await
}

pub async fn reject(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<ReviewOutcome>, AppError> {
    review(&pool, &auth, id, ReviewAction::Reject, body).await
}

pub async fn reopen(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    body: Option<Json<ReviewRequest>>,
) -> Result<Json<ReviewOutcome>, AppError> {
    review(&pool, &auth, id, ReviewAction::Reopen, body).await
}

/// Import leads from a workbook or CSV.
///
/// `Grants`, `Angel Investors` and `Institutional Investors` sheets have
/// their own column layouts; any other sheet uses the lead columns.
/// Duplicates (same email, or same company name) are skipped.
pub async fn upload(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    multipart: Multipart,
) -> Result<Json<LeadImportResult>, AppError> {
    let upload = read_upload(multipart).await?;
    let sheets = ingestion::load_workbook(&upload.filename, upload.bytes)?;
    let result = potential_investor_service::import(&pool, sheets).await;

    tracing::info!(
        admin_id = %auth.user_id,
        inserted = result.total_inserted,
        skipped = result.total_skipped,
        "lead import finished"
    );

    Ok(Json(result))
}
