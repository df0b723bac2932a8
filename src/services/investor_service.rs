//! Investor service - canonical investor records.
//!
//! This service handles:
//! - Admin CRUD with soft deletion
//! - The founder-facing listings (all active, grants)
//! - Flat-template and named-sheet spreadsheet imports
//!
//! # Uniqueness
//!
//! Non-blank emails are unique (partial index). Inserts surface a clash as
//! `Duplicate`; the workbook import upserts on it instead.

use sqlx::{Postgres, QueryBuilder, types::Json};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::{AppError, duplicate_on_unique},
    models::{
        investor::{
            CreateInvestorRequest, Investor, InvestorFilters, InvestorSource, InvestorType,
            NewInvestor, UpdateInvestorRequest,
        },
        query::{Page, PageParams, like_pattern},
    },
    services::{
        ingestion::{self, SheetTable},
        parsing::{is_valid_email, normalize_email},
    },
};

/// Tag that marks an investor as a grant provider.
pub const GRANT_TAG: &str = "Grant";

/// Insert one investor. Usable with a pool or inside a transaction.
pub async fn insert<'e, E>(
    executor: E,
    investor: &NewInvestor,
    created_by: Option<Uuid>,
) -> Result<Investor, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, Investor>(
        r#"
        INSERT INTO investors (
            name, serial_number, email, company, location, country, description,
            investment_thesis, regional_focus, ticket_size_min, ticket_size_max,
            team_members, industries, investment_stage, linkedin_url, website_url,
            notes, tags, investor_type, is_verified, is_wishlisted, source, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15,
                $16, $17, $18, $19, $20, $21, $22, $23)
        RETURNING *
        "#,
    )
    .bind(&investor.name)
    .bind(&investor.serial_number)
    .bind(&investor.email)
    .bind(&investor.company)
    .bind(&investor.location)
    .bind(&investor.country)
    .bind(&investor.description)
    .bind(&investor.investment_thesis)
    .bind(&investor.regional_focus)
    .bind(investor.ticket_size_min)
    .bind(investor.ticket_size_max)
    .bind(Json(&investor.team_members))
    .bind(&investor.industries)
    .bind(&investor.investment_stage)
    .bind(&investor.linkedin_url)
    .bind(&investor.website_url)
    .bind(&investor.notes)
    .bind(&investor.tags)
    .bind(investor.investor_type)
    .bind(investor.is_verified)
    .bind(investor.is_wishlisted)
    .bind(investor.source)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, filters: &InvestorFilters) {
    builder.push(" WHERE TRUE");
    if let Some(search) = &filters.search {
        let pattern = like_pattern(search);
        builder
            .push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(industry) = &filters.industry {
        builder
            .push(" AND EXISTS (SELECT 1 FROM unnest(industries) AS i WHERE i ILIKE ")
            .push_bind(like_pattern(industry))
            .push(")");
    }
    if let Some(location) = &filters.location {
        builder
            .push(" AND location ILIKE ")
            .push_bind(like_pattern(location));
    }
    if let Some(source) = filters.source {
        builder.push(" AND source = ").push_bind(source);
    }
    if let Some(is_active) = filters.is_active {
        builder.push(" AND is_active = ").push_bind(is_active);
    }
    if let Some(is_verified) = filters.is_verified {
        builder.push(" AND is_verified = ").push_bind(is_verified);
    }
}

/// Paginated admin listing, newest first.
pub async fn list(pool: &DbPool, filters: &InvestorFilters) -> Result<Page<Investor>, AppError> {
    let params = PageParams::new(filters.page, filters.limit);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM investors");
    push_filters(&mut count, filters);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM investors");
    push_filters(&mut query, filters);
    query
        .push(" ORDER BY created_at DESC LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.offset());
    let data = query.build_query_as::<Investor>().fetch_all(pool).await?;

    Ok(Page::new(data, params, total))
}

/// All active investors, newest first.
pub async fn list_active(pool: &DbPool) -> Result<Vec<Investor>, AppError> {
    let rows = sqlx::query_as::<_, Investor>(
        "SELECT * FROM investors WHERE is_active = true ORDER BY created_at DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Active investors tagged as grant providers.
pub async fn list_grants(pool: &DbPool) -> Result<Vec<Investor>, AppError> {
    let rows = sqlx::query_as::<_, Investor>(
        "SELECT * FROM investors WHERE is_active = true AND $1 = ANY(tags) ORDER BY created_at DESC",
    )
    .bind(GRANT_TAG)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Manual creation from the admin panel.
///
/// # Errors
///
/// - `InvalidRequest`: blank name or malformed email
/// - `Duplicate`: email already used by another investor
pub async fn create(
    pool: &DbPool,
    request: CreateInvestorRequest,
    admin_id: Uuid,
) -> Result<Investor, AppError> {
    let name = request.name.trim();
    let email = normalize_email(&request.email);
    if name.is_empty() {
        return Err(AppError::InvalidRequest("Name is required".to_string()));
    }
    if !is_valid_email(&email) {
        return Err(AppError::InvalidRequest("Invalid email format".to_string()));
    }

    let mut investor = NewInvestor::named(name, email, InvestorSource::Manual);
    investor.company = request.company;
    investor.location = request.location;
    investor.country = request.country;
    investor.description = request.description;
    investor.investment_thesis = request.investment_thesis;
    investor.regional_focus = request.regional_focus;
    investor.ticket_size_min = request.ticket_size.min;
    investor.ticket_size_max = request.ticket_size.max;
    investor.team_members = request.team_members;
    investor.industries = request.industries;
    investor.investment_stage = request.investment_stage;
    investor.linkedin_url = request.linkedin_url;
    investor.website_url = request.website_url;
    investor.notes = request.notes;
    investor.investor_type = Some(
        request
            .investor_type
            .unwrap_or_else(|| InvestorType::from_tags(&request.tags)),
    );
    investor.tags = request.tags;
    investor.is_verified = request.is_verified;

    insert(pool, &investor, Some(admin_id))
        .await
        .map_err(|e| duplicate_on_unique(e, "Investor with this email already exists"))
}

/// Apply a partial update. Absent fields are left untouched.
///
/// # Errors
///
/// - `NotFound`: no investor with this id
/// - `Duplicate`: new email collides with another investor
pub async fn update(
    pool: &DbPool,
    id: Uuid,
    request: UpdateInvestorRequest,
) -> Result<Investor, AppError> {
    let mut query = QueryBuilder::<Postgres>::new("UPDATE investors SET updated_at = NOW()");

    macro_rules! set_field {
        ($column:literal, $value:expr) => {
            if let Some(value) = $value {
                query.push(concat!(", ", $column, " = ")).push_bind(value);
            }
        };
    }

    if let Some(name) = &request.name {
        if name.trim().is_empty() {
            return Err(AppError::InvalidRequest("Name cannot be empty".to_string()));
        }
    }
    let email = match request.email.as_deref().map(normalize_email) {
        Some(email) if !is_valid_email(&email) => {
            return Err(AppError::InvalidRequest("Invalid email format".to_string()));
        }
        other => other,
    };

    set_field!("name", request.name.map(|n| n.trim().to_string()));
    set_field!("email", email);
    set_field!("company", request.company);
    set_field!("location", request.location);
    set_field!("country", request.country);
    set_field!("description", request.description);
    set_field!("investment_thesis", request.investment_thesis);
    set_field!("regional_focus", request.regional_focus);
    set_field!("ticket_size_min", request.ticket_size.map(|t| t.min));
    set_field!("ticket_size_max", request.ticket_size.map(|t| t.max));
    set_field!("team_members", request.team_members.map(Json));
    set_field!("industries", request.industries);
    set_field!("investment_stage", request.investment_stage);
    set_field!("linkedin_url", request.linkedin_url);
    set_field!("website_url", request.website_url);
    set_field!("notes", request.notes);
    set_field!("tags", request.tags);
    set_field!("investor_type", request.investor_type);
    set_field!("is_active", request.is_active);
    set_field!("is_verified", request.is_verified);
    set_field!("is_wishlisted", request.is_wishlisted);
    set_field!("avatar", request.avatar);

    query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

    query
        .build_query_as::<Investor>()
        .fetch_optional(pool)
        .await
        .map_err(|e| duplicate_on_unique(e, "Investor with this email already exists"))?
        .ok_or(AppError::NotFound("Investor"))
}

/// Soft delete: the row stays, `is_active` goes false.
pub async fn deactivate(pool: &DbPool, id: Uuid) -> Result<(), AppError> {
    let affected = sqlx::query(
        "UPDATE investors SET is_active = false, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .execute(pool)
    .await?
    .rows_affected();

    if affected == 0 {
        return Err(AppError::NotFound("Investor"));
    }
    Ok(())
}

/// Soft-delete many investors at once; returns how many rows changed.
pub async fn deactivate_many(pool: &DbPool, ids: &[Uuid]) -> Result<u64, AppError> {
    if ids.is_empty() {
        return Err(AppError::InvalidRequest(
            "Please provide an array of investor IDs".to_string(),
        ));
    }

    let affected = sqlx::query(
        "UPDATE investors SET is_active = false, updated_at = NOW() WHERE id = ANY($1)",
    )
    .bind(ids)
    .execute(pool)
    .await?
    .rows_affected();

    Ok(affected)
}

/// Outcome of a flat-template import.
#[derive(Debug, Default, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FlatImportStats {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub imported: usize,
    pub duplicates: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
pub struct FlatImport {
    pub stats: FlatImportStats,
    pub errors: Vec<String>,
    pub duplicate_emails: Vec<String>,
}

impl FlatImport {
    /// Tally the insert of one valid row. A failed row is reported and the
    /// import carries on with the next one.
    fn record_insert(&mut self, row: usize, email: &str, result: Result<(), sqlx::Error>) {
        match result {
            Ok(()) => self.stats.imported += 1,
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                self.stats.duplicates += 1;
                self.duplicate_emails.push(email.to_string());
            }
            Err(err) => {
                tracing::warn!(row, error = %err, "investor row insert failed");
                self.stats.failed += 1;
                self.errors.push(format!("Row {row}: could not be saved"));
            }
        }
    }
}

/// Validate every row of the first sheet and insert the valid ones.
///
/// Invalid rows are skipped and reported; the import only fails as a whole
/// when not a single row is valid.
pub async fn import_flat(
    pool: &DbPool,
    sheets: Vec<SheetTable>,
    admin_id: Uuid,
) -> Result<FlatImport, AppError> {
    let sheet = sheets.into_iter().next().unwrap_or_default();
    if sheet.rows.is_empty() {
        return Err(AppError::InvalidRequest(
            "Excel file is empty or has no data".to_string(),
        ));
    }

    let mut import = FlatImport::default();
    import.stats.total_rows = sheet.rows.len();

    let mut valid = Vec::new();
    for row in &sheet.rows {
        match ingestion::flat_investor(row) {
            Ok(investor) => valid.push((row.number, investor)),
            Err(row_errors) => {
                tracing::debug!(row = row.number, "skipping invalid investor row");
                import.errors.extend(row_errors);
            }
        }
    }
    import.stats.valid_rows = valid.len();
    import.stats.invalid_rows = import.stats.total_rows - import.stats.valid_rows;

    for (row, investor) in &valid {
        let result = insert(pool, investor, Some(admin_id)).await.map(|_| ());
        import.record_insert(*row, &investor.email, result);
    }

    Ok(import)
}

/// Outcome of a named-sheet workbook import.
#[derive(Debug, Default, serde::Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookImportStats {
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    pub errors: usize,
}

/// Import the "Angel Investors" and "Institutional Investors" sheets,
/// upserting on email. Other sheets are ignored.
pub async fn import_workbook(
    pool: &DbPool,
    sheets: Vec<SheetTable>,
    admin_id: Uuid,
) -> Result<(WorkbookImportStats, Vec<String>), AppError> {
    let mut stats = WorkbookImportStats::default();
    let mut errors = Vec::new();

    let wanted = [ingestion::ANGEL_SHEET, ingestion::INSTITUTIONAL_SHEET];
    for sheet in sheets.iter().filter(|s| wanted.contains(&s.name.as_str())) {
        for row in &sheet.rows {
            let investor = match ingestion::workbook_investor(&sheet.name, row) {
                Ok(Some(investor)) => investor,
                Ok(None) => continue,
                Err(message) => {
                    errors.push(message);
                    continue;
                }
            };

            match upsert_by_email(pool, &investor, admin_id).await {
                Ok(true) => stats.created += 1,
                Ok(false) => stats.updated += 1,
                Err(err) => {
                    tracing::warn!(error = %err, email = %investor.email, "investor upsert failed");
                    errors.push(format!(
                        "{} row {}: could not be saved",
                        sheet.name, row.number
                    ));
                    continue;
                }
            }
            stats.processed += 1;
        }
    }

    stats.errors = errors.len();
    Ok((stats, errors))
}

/// Insert or overwrite the sheet-provided fields; `true` when a row was created.
async fn upsert_by_email(
    pool: &DbPool,
    investor: &NewInvestor,
    admin_id: Uuid,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        INSERT INTO investors (
            name, email, company, location, country, description, investment_thesis,
            linkedin_url, website_url, notes, industries, tags, investor_type,
            is_wishlisted, source, created_by
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ON CONFLICT (email) WHERE email <> '' DO UPDATE SET
            name = EXCLUDED.name,
            company = CASE WHEN EXCLUDED.company <> '' THEN EXCLUDED.company ELSE investors.company END,
            location = EXCLUDED.location,
            country = EXCLUDED.country,
            description = CASE WHEN EXCLUDED.description <> '' THEN EXCLUDED.description ELSE investors.description END,
            investment_thesis = CASE WHEN EXCLUDED.investment_thesis <> '' THEN EXCLUDED.investment_thesis ELSE investors.investment_thesis END,
            linkedin_url = CASE WHEN EXCLUDED.linkedin_url <> '' THEN EXCLUDED.linkedin_url ELSE investors.linkedin_url END,
            website_url = CASE WHEN EXCLUDED.website_url <> '' THEN EXCLUDED.website_url ELSE investors.website_url END,
            notes = CASE WHEN EXCLUDED.notes <> '' THEN EXCLUDED.notes ELSE investors.notes END,
            industries = CASE WHEN cardinality(EXCLUDED.industries) > 0 THEN EXCLUDED.industries ELSE investors.industries END,
            tags = EXCLUDED.tags,
            investor_type = EXCLUDED.investor_type,
            is_wishlisted = investors.is_wishlisted OR EXCLUDED.is_wishlisted,
            source = EXCLUDED.source,
            updated_at = NOW()
        RETURNING (xmax = 0)
        "#,
    )
    .bind(&investor.name)
    .bind(&investor.email)
    .bind(&investor.company)
    .bind(&investor.location)
    .bind(&investor.country)
    .bind(&investor.description)
    .bind(&investor.investment_thesis)
    .bind(&investor.linkedin_url)
    .bind(&investor.website_url)
    .bind(&investor.notes)
    .bind(&investor.industries)
    .bind(&investor.tags)
    .bind(investor.investor_type)
    .bind(investor.is_wishlisted)
    .bind(investor.source)
    .bind(admin_id)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::testing::unique_violation;

    #[test]
    fn flat_import_tallies_each_insert_and_keeps_going() {
        let mut import = FlatImport::default();

        import.record_insert(2, "sarah@accel.com", Ok(()));
        import.record_insert(3, "michael@sequoia.com", Err(unique_violation()));
        import.record_insert(
            4,
            "kim@kite.vc",
            Err(sqlx::Error::Protocol("connection reset".to_string())),
        );
        import.record_insert(5, "lee@lumen.vc", Ok(()));

        assert_eq!(import.stats.imported, 2);
        assert_eq!(import.stats.duplicates, 1);
        assert_eq!(import.stats.failed, 1);
        assert_eq!(import.duplicate_emails, vec!["michael@sequoia.com"]);
        assert_eq!(import.errors, vec!["Row 4: could not be saved"]);
    }
}
