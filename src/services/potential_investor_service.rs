//! Potential investor service - the lead review workflow.
//!
//! This service handles:
//! - Lead insertion with sequence-backed serial numbers
//! - Filtered listing by status, search text and serial range
//! - Review transitions (verify, approve, reject, reopen)
//! - Promotion of approved leads into `investors`
//!
//! # Atomicity Guarantees
//!
//! Every transition locks the lead row (`FOR UPDATE`) inside a database
//! transaction. Approval creates or links the investor in the same
//! transaction, so a lead is never approved without its investor.

use sqlx::{Postgres, QueryBuilder, types::Json};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::{
        investor::{InvestorSource, InvestorType, NewInvestor, TeamMember},
        potential_investor::{
            LeadImportResult, NewLead, PotentialInvestor, PotentialInvestorFilters,
            ReviewAction, ReviewOutcome, ReviewStatus, SERIAL_PREFIX, SheetImportSummary,
            UpdatePotentialInvestorRequest, parse_serial,
        },
        query::{Page, PageParams, like_pattern},
    },
    services::{
        ingestion::{self, SheetTable},
        investor_service,
        parsing::{
            normalize_email, parse_investment_stages, parse_ticket_size, split_list,
        },
    },
};

/// Insert a lead. The serial is drawn from `potential_investor_serial_seq`
/// and formatted in the same statement.
pub async fn insert(pool: &DbPool, lead: &NewLead) -> Result<PotentialInvestor, AppError> {
    let row = sqlx::query_as::<_, PotentialInvestor>(
        r#"
        WITH next AS (SELECT nextval('potential_investor_serial_seq') AS seq)
        INSERT INTO potential_investors (
            serial_seq, serial_number, company_name, website, company_linkedin_url,
            twitter_url, industry, stage_of_investment, first_name, last_name, email,
            person_linkedin_url, authentic, notes, description, investment_thesis,
            regional_focus, ticket_size, team_members, tags, investor_type, source
        )
        SELECT next.seq, $1 || lpad(next.seq::text, GREATEST(4, length(next.seq::text)), '0'),
               $2, $3, $4, $5, $6, $7, $8,
               $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20, $21
        FROM next
        RETURNING *
        "#,
    )
    .bind(SERIAL_PREFIX)
    .bind(&lead.company_name)
    .bind(&lead.website)
    .bind(&lead.company_linkedin_url)
    .bind(&lead.twitter_url)
    .bind(&lead.industry)
    .bind(&lead.stage_of_investment)
    .bind(&lead.first_name)
    .bind(&lead.last_name)
    .bind(&lead.email)
    .bind(&lead.person_linkedin_url)
    .bind(&lead.authentic)
    .bind(&lead.notes)
    .bind(&lead.description)
    .bind(&lead.investment_thesis)
    .bind(&lead.regional_focus)
    .bind(&lead.ticket_size)
    .bind(Json(&lead.team_members))
    .bind(&lead.tags)
    .bind(&lead.investor_type)
    .bind(&lead.source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Postgres>,
    filters: &PotentialInvestorFilters,
) -> Result<(), AppError> {
    builder.push(" WHERE TRUE");
    if let Some(status) = filters.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = &filters.search {
        let pattern = like_pattern(search);
        builder.push(" AND (");
        let mut columns = builder.separated(" OR ");
        for column in [
            "company_name",
            "first_name",
            "last_name",
            "email",
            "serial_number",
            "industry",
        ] {
            columns
                .push(format!("{column} ILIKE "))
                .push_bind_unseparated(pattern.clone());
        }
        builder.push(")");
    }
    for (bound, op) in [(&filters.from_serial, ">="), (&filters.to_serial, "<=")] {
        if let Some(raw) = bound {
            let seq = parse_serial(raw).ok_or_else(|| {
                AppError::InvalidRequest(format!("Invalid serial number: {raw}"))
            })?;
            builder
                .push(format!(" AND serial_seq {op} "))
                .push_bind(seq);
        }
    }
    Ok(())
}

/// Paginated listing in serial order.
pub async fn list(
    pool: &DbPool,
    filters: &PotentialInvestorFilters,
) -> Result<Page<PotentialInvestor>, AppError> {
    let params = PageParams::new(filters.page, filters.limit);

    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM potential_investors");
    push_filters(&mut count, filters)?;
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let mut query = QueryBuilder::<Postgres>::new("SELECT * FROM potential_investors");
    push_filters(&mut query, filters)?;
    query
        .push(" ORDER BY serial_seq ASC LIMIT ")
        .push_bind(params.limit)
        .push(" OFFSET ")
        .push_bind(params.offset());
    let data = query
        .build_query_as::<PotentialInvestor>()
        .fetch_all(pool)
        .await?;

    Ok(Page::new(data, params, total))
}

pub async fn get(pool: &DbPool, id: Uuid) -> Result<PotentialInvestor, AppError> {
    sqlx::query_as::<_, PotentialInvestor>("SELECT * FROM potential_investors WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Potential investor"))
}

/// Edit a lead's fields. Approved leads are frozen.
pub async fn update(
    pool: &DbPool,
    id: Uuid,
    request: UpdatePotentialInvestorRequest,
) -> Result<PotentialInvestor, AppError> {
    let mut tx = pool.begin().await?;

    let status: ReviewStatus =
        sqlx::query_scalar("SELECT status FROM potential_investors WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Potential investor"))?;

    if status == ReviewStatus::Approved {
        return Err(AppError::InvalidTransition(
            "Approved investors can no longer be edited".to_string(),
        ));
    }

    let mut query =
        QueryBuilder::<Postgres>::new("UPDATE potential_investors SET updated_at = NOW()");

    macro_rules! set_field {
        ($column:literal, $value:expr) => {
            if let Some(value) = $value {
                query.push(concat!(", ", $column, " = ")).push_bind(value);
            }
        };
    }

    set_field!("company_name", request.company_name);
    set_field!("website", request.website);
    set_field!("company_linkedin_url", request.company_linkedin_url);
    set_field!("twitter_url", request.twitter_url);
    set_field!("industry", request.industry);
    set_field!("stage_of_investment", request.stage_of_investment);
    set_field!("first_name", request.first_name);
    set_field!("last_name", request.last_name);
    set_field!("email", request.email.as_deref().map(normalize_email));
    set_field!("person_linkedin_url", request.person_linkedin_url);
    set_field!("authentic", request.authentic);
    set_field!("notes", request.notes);
    set_field!("admin_notes", request.admin_notes);
    set_field!("description", request.description);
    set_field!("investment_thesis", request.investment_thesis);
    set_field!("regional_focus", request.regional_focus);
    set_field!("ticket_size", request.ticket_size);
    set_field!("team_members", request.team_members.map(Json));
    set_field!("tags", request.tags);
    set_field!("investor_type", request.investor_type);

    query.push(" WHERE id = ").push_bind(id).push(" RETURNING *");
    let updated = query
        .build_query_as::<PotentialInvestor>()
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(updated)
}

/// Apply a review action.
///
/// # Process
///
/// 1. Lock the lead row
/// 2. Check the transition is allowed from the current status
/// 3. On approval, create (or link) the canonical investor
/// 4. Record the new status, reviewer and review time
/// 5. Commit
///
/// # Errors
///
/// - `NotFound`: no lead with this id
/// - `InvalidTransition`: action not allowed from the current status
pub async fn review(
    pool: &DbPool,
    id: Uuid,
    action: ReviewAction,
    reviewer: Uuid,
    admin_notes: Option<String>,
) -> Result<ReviewOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let lead = sqlx::query_as::<_, PotentialInvestor>(
        "SELECT * FROM potential_investors WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::NotFound("Potential investor"))?;

    let next = action.apply(lead.status).ok_or_else(|| {
        AppError::InvalidTransition(format!(
            "Cannot {} an investor that is {}",
            action.as_str(),
            lead.status.as_str()
        ))
    })?;

    let investor_id = if next == ReviewStatus::Approved {
        Some(promote(&mut tx, &lead, reviewer).await?)
    } else {
        None
    };

    let updated = sqlx::query_as::<_, PotentialInvestor>(
        r#"
        UPDATE potential_investors
        SET status = $2,
            reviewed_by = $3,
            reviewed_at = NOW(),
            admin_notes = COALESCE($4, admin_notes),
            promoted_investor_id = COALESCE($5, promoted_investor_id),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(next)
    .bind(reviewer)
    .bind(admin_notes)
    .bind(investor_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!(
        serial = %updated.serial_number,
        lead = %updated.display_name(),
        action = action.as_str(),
        status = next.as_str(),
        "potential investor reviewed"
    );

    let message = match action {
        ReviewAction::Verify => "Investor verified",
        ReviewAction::Approve => "Investor approved and added to investors",
        ReviewAction::Reject => "Investor rejected",
        ReviewAction::Reopen => "Investor moved back to pending",
    };

    Ok(ReviewOutcome {
        message: message.to_string(),
        data: updated,
        investor_id,
    })
}

/// Create the canonical investor for an approved lead, or link the one
/// that already carries its email or serial number.
async fn promote(
    tx: &mut sqlx::Transaction<'_, Postgres>,
    lead: &PotentialInvestor,
    reviewer: Uuid,
) -> Result<Uuid, AppError> {
    let investor = to_investor(lead);

    let candidates: Vec<(Uuid, bool)> = sqlx::query_as(
        r#"
        SELECT id, (email <> '' AND email = $1) AS email_match
        FROM investors
        WHERE (email <> '' AND email = $1) OR serial_number = $2
        "#,
    )
    .bind(&investor.email)
    .bind(&lead.serial_number)
    .fetch_all(&mut **tx)
    .await?;

    if let Some(id) = preferred_match(&candidates) {
        sqlx::query(
            r#"
            UPDATE investors
            SET is_active = true, is_verified = true,
                serial_number = COALESCE(
                    serial_number,
                    CASE WHEN NOT EXISTS (SELECT 1 FROM investors WHERE serial_number = $2)
                         THEN $2 END
                ),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&lead.serial_number)
        .execute(&mut **tx)
        .await?;
        return Ok(id);
    }

    let created = investor_service::insert(&mut **tx, &investor, Some(reviewer)).await?;
    Ok(created.id)
}

/// Investor to link an approved lead to: the one sharing its email, else the
/// one sharing its serial number.
fn preferred_match(candidates: &[(Uuid, bool)]) -> Option<Uuid> {
    candidates
        .iter()
        .find(|(_, email_match)| *email_match)
        .or_else(|| candidates.first())
        .map(|(id, _)| *id)
}

/// Map a lead onto the investor schema.
pub fn to_investor(lead: &PotentialInvestor) -> NewInvestor {
    let person = format!("{} {}", lead.first_name.trim(), lead.last_name.trim())
        .trim()
        .to_string();

    let first_member = lead.team_members.0.first();
    let name = [
        person.clone(),
        first_member.map(|m| m.name.trim().to_string()).unwrap_or_default(),
        lead.company_name.trim().to_string(),
    ]
    .into_iter()
    .find(|candidate| !candidate.is_empty())
    .unwrap_or_else(|| "Unknown".to_string());

    let email = if lead.email.is_empty() {
        first_member
            .map(|m| normalize_email(&m.email))
            .unwrap_or_default()
    } else {
        lead.email.clone()
    };

    let mut team_members = lead.team_members.0.clone();
    if team_members.is_empty() && (!lead.first_name.is_empty() || !lead.person_linkedin_url.is_empty()) {
        team_members.push(TeamMember {
            name: person,
            role: String::new(),
            linkedin_url: lead.person_linkedin_url.clone(),
            email: lead.email.clone(),
        });
    }

    let (ticket_min, ticket_max) = parse_ticket_size(&lead.ticket_size);
    let linkedin_url = if lead.person_linkedin_url.is_empty() {
        lead.company_linkedin_url.clone()
    } else {
        lead.person_linkedin_url.clone()
    };

    let mut investor = NewInvestor::named(name, email, InvestorSource::Migration);
    investor.serial_number = Some(lead.serial_number.clone());
    investor.company = lead.company_name.clone();
    investor.description = lead.description.clone();
    investor.investment_thesis = lead.investment_thesis.clone();
    investor.regional_focus = split_list(&lead.regional_focus);
    investor.ticket_size_min = ticket_min;
    investor.ticket_size_max = ticket_max;
    investor.team_members = team_members;
    investor.industries = split_list(&lead.industry);
    investor.investment_stage = parse_investment_stages(&lead.stage_of_investment);
    investor.linkedin_url = linkedin_url;
    investor.website_url = lead.website.clone();
    investor.notes = lead.notes.clone();
    investor.tags = lead.tags.clone();
    investor.investor_type = Some(InvestorType::from_label(&lead.investor_type));
    investor.is_verified = true;
    investor
}

/// What makes two leads the same: the email, or a company name longer than
/// two characters compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateKey {
    pub email: Option<String>,
    pub company: Option<String>,
}

impl DuplicateKey {
    /// `None` when the lead carries nothing to compare on.
    pub fn of(lead: &NewLead) -> Option<Self> {
        let email = (!lead.email.is_empty()).then(|| lead.email.clone());
        let company = lead.company_name.trim();
        let company = (company.chars().count() > 2).then(|| company.to_lowercase());

        if email.is_none() && company.is_none() {
            return None;
        }
        Some(Self { email, company })
    }

    pub fn matches(&self, lead: &NewLead) -> bool {
        let same_email = self.email.as_deref().is_some_and(|email| email == lead.email);
        let same_company = self
            .company
            .as_deref()
            .is_some_and(|company| company == lead.company_name.trim().to_lowercase());
        same_email || same_company
    }
}

/// Where a lead import reads duplicates from and writes new leads to.
pub trait LeadStore {
    fn contains(&self, key: &DuplicateKey) -> impl Future<Output = Result<bool, AppError>> + Send;

    fn add(&self, lead: &NewLead) -> impl Future<Output = Result<(), AppError>> + Send;
}

impl LeadStore for DbPool {
    async fn contains(&self, key: &DuplicateKey) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM potential_investors
                WHERE ($1::text IS NOT NULL AND email = $1)
                   OR ($2::text IS NOT NULL AND lower(company_name) = $2)
            )
            "#,
        )
        .bind(&key.email)
        .bind(&key.company)
        .fetch_one(self)
        .await?;

        Ok(exists)
    }

    async fn add(&self, lead: &NewLead) -> Result<(), AppError> {
        insert(self, lead).await.map(|_| ())
    }
}

fn row_error(row: usize, err: &AppError) -> String {
    match err {
        AppError::Database(_) => format!("Row {row}: could not be saved"),
        other => format!("Row {row}: {other}"),
    }
}

/// Import one sheet. A row that fails to save is reported in the summary
/// and the remaining rows are still imported.
pub async fn import_sheet<S: LeadStore>(store: &S, sheet: &SheetTable) -> SheetImportSummary {
    let mut summary = SheetImportSummary {
        sheet: sheet.name.clone(),
        ..SheetImportSummary::default()
    };

    for row in &sheet.rows {
        let Some(lead) = ingestion::lead_from_row(&sheet.name, row) else {
            continue;
        };

        if let Some(key) = DuplicateKey::of(&lead) {
            match store.contains(&key).await {
                Ok(true) => {
                    summary.skipped += 1;
                    continue;
                }
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(sheet = %sheet.name, row = row.number, error = %err, "duplicate check failed");
                    summary.errors.push(row_error(row.number, &err));
                    continue;
                }
            }
        }

        if !ingestion::has_known_stage(&lead) {
            summary.errors.push(format!(
                "Row {}: unrecognised investment stage '{}'",
                row.number, lead.stage_of_investment
            ));
        }

        match store.add(&lead).await {
            Ok(()) => summary.inserted += 1,
            Err(err) => {
                tracing::warn!(sheet = %sheet.name, row = row.number, error = %err, "lead insert failed");
                summary.errors.push(row_error(row.number, &err));
            }
        }
    }

    summary
}

/// Import leads from every sheet of an upload.
pub async fn import(pool: &DbPool, sheets: Vec<SheetTable>) -> LeadImportResult {
    let mut summaries = Vec::new();

    for sheet in &sheets {
        let summary = import_sheet(pool, sheet).await;
        tracing::info!(
            sheet = %summary.sheet,
            inserted = summary.inserted,
            skipped = summary.skipped,
            errors = summary.errors.len(),
            "lead sheet imported"
        );
        summaries.push(summary);
    }

    let total_inserted = summaries.iter().map(|s| s.inserted).sum();
    let total_skipped = summaries.iter().map(|s| s.skipped).sum();

    LeadImportResult {
        message: format!(
            "Imported {total_inserted} potential investors, skipped {total_skipped} duplicates"
        ),
        sheets: summaries,
        total_inserted,
        total_skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::investor_service::GRANT_TAG;
    use chrono::{DateTime, Utc};

    fn lead() -> PotentialInvestor {
        let now: DateTime<Utc> = Utc::now();
        PotentialInvestor {
            id: Uuid::new_v4(),
            serial_seq: 7,
            serial_number: "AA0007".to_string(),
            company_name: "Nexus Ventures".to_string(),
            website: "https://nexusvp.com".to_string(),
            company_linkedin_url: "https://linkedin.com/company/nexus".to_string(),
            twitter_url: String::new(),
            industry: "SaaS; Fintech / AI".to_string(),
            stage_of_investment: "Seed & Series A".to_string(),
            first_name: "Priya".to_string(),
            last_name: "Rao".to_string(),
            email: "priya@nexusvp.com".to_string(),
            person_linkedin_url: String::new(),
            authentic: String::new(),
            notes: "Met at demo day".to_string(),
            admin_notes: String::new(),
            description: String::new(),
            investment_thesis: String::new(),
            regional_focus: "India, SEA".to_string(),
            ticket_size: "$500K - $2M".to_string(),
            team_members: Json(Vec::new()),
            tags: vec![GRANT_TAG.to_string()],
            investor_type: "Institutional".to_string(),
            source: "excel-import-Grants".to_string(),
            status: ReviewStatus::Verified,
            reviewed_by: None,
            reviewed_at: None,
            promoted_investor_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn promotion_normalises_fields() {
        let investor = to_investor(&lead());
        assert_eq!(investor.name, "Priya Rao");
        assert_eq!(investor.serial_number.as_deref(), Some("AA0007"));
        assert_eq!(investor.industries, vec!["SaaS", "Fintech", "AI"]);
        assert_eq!(investor.investment_stage, vec!["seed", "series-a"]);
        assert_eq!(investor.regional_focus, vec!["India", "SEA"]);
        assert_eq!((investor.ticket_size_min, investor.ticket_size_max), (500_000.0, 2_000_000.0));
        assert_eq!(investor.linkedin_url, "https://linkedin.com/company/nexus");
        assert_eq!(investor.source, InvestorSource::Migration);
        assert_eq!(investor.investor_type, Some(InvestorType::Institutional));
        assert!(investor.is_verified);
        assert_eq!(investor.team_members.len(), 1);
        assert_eq!(investor.team_members[0].email, "priya@nexusvp.com");
    }

    #[test]
    fn promotion_falls_back_to_team_then_company() {
        let mut lead = lead();
        lead.first_name.clear();
        lead.last_name.clear();
        lead.email.clear();
        lead.team_members = Json(vec![TeamMember {
            name: "Arjun".to_string(),
            email: "Arjun@Nexusvp.com".to_string(),
            ..TeamMember::default()
        }]);
        let investor = to_investor(&lead);
        assert_eq!(investor.name, "Arjun");
        assert_eq!(investor.email, "arjun@nexusvp.com");

        lead.team_members = Json(Vec::new());
        let investor = to_investor(&lead);
        assert_eq!(investor.name, "Nexus Ventures");
        assert!(investor.email.is_empty());
        assert!(investor.team_members.is_empty());
    }

    #[test]
    fn angel_leads_promote_as_angels() {
        let mut lead = lead();
        lead.investor_type = "Angel".to_string();
        let investor = to_investor(&lead);
        assert_eq!(investor.investor_type, Some(InvestorType::Angel));
        assert_eq!(investor.tags, vec![GRANT_TAG]);
    }

    #[derive(Default)]
    struct MemoryStore {
        leads: std::sync::Mutex<Vec<NewLead>>,
        unwritable_email: Option<&'static str>,
    }

    impl LeadStore for MemoryStore {
        async fn contains(&self, key: &DuplicateKey) -> Result<bool, AppError> {
            Ok(self.leads.lock().unwrap().iter().any(|lead| key.matches(lead)))
        }

        async fn add(&self, lead: &NewLead) -> Result<(), AppError> {
            if self.unwritable_email == Some(lead.email.as_str()) {
                return Err(AppError::Database(sqlx::Error::Protocol(
                    "connection reset".to_string(),
                )));
            }
            self.leads.lock().unwrap().push(lead.clone());
            Ok(())
        }
    }

    fn new_lead(company: &str, email: &str) -> NewLead {
        NewLead {
            company_name: company.to_string(),
            email: email.to_string(),
            ..NewLead::default()
        }
    }

    #[test]
    fn duplicate_key_needs_an_email_or_a_real_company_name() {
        assert_eq!(DuplicateKey::of(&new_lead("AB", "")), None);
        assert_eq!(
            DuplicateKey::of(&new_lead("  Nexus Ventures ", "")),
            Some(DuplicateKey {
                email: None,
                company: Some("nexus ventures".to_string()),
            })
        );
        assert_eq!(
            DuplicateKey::of(&new_lead("AB", "ab@fund.com")),
            Some(DuplicateKey {
                email: Some("ab@fund.com".to_string()),
                company: None,
            })
        );
    }

    #[test]
    fn duplicate_key_matches_email_or_company() {
        let key = DuplicateKey::of(&new_lead("Nexus Ventures", "priya@nexusvp.com")).unwrap();
        assert!(key.matches(&new_lead("Other Fund", "priya@nexusvp.com")));
        assert!(key.matches(&new_lead("NEXUS VENTURES", "ravi@elsewhere.com")));
        assert!(!key.matches(&new_lead("Orbit Capital", "sam@orbit.vc")));

        let short = DuplicateKey::of(&new_lead("AB", "ab@fund.com")).unwrap();
        assert!(!short.matches(&new_lead("AB", "other@fund.com")));
    }

    #[tokio::test]
    async fn sheet_import_skips_duplicates_and_keeps_going_after_a_failed_row() {
        let sheet = SheetTable::from_rows(
            "Leads",
            [
                ["Company Name", "Email", "First Name", "Stage of investment"],
                ["Nexus Ventures", "priya@nexusvp.com", "Priya", "Seed"],
                ["NEXUS VENTURES", "ravi@elsewhere.com", "Ravi", "Seed"],
                ["Orbit Capital", "PRIYA@nexusvp.com", "Sam", "Seed"],
                ["Kite Fund", "kim@kite.vc", "Kim", "Seed"],
                ["Lumen", "lee@lumen.vc", "Lee", "Moonshot"],
                ["AB", "", "Al", ""],
                ["", "", "", ""],
            ]
            .iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect(),
        );
        let store = MemoryStore {
            unwritable_email: Some("kim@kite.vc"),
            ..MemoryStore::default()
        };

        let summary = import_sheet(&store, &sheet).await;

        assert_eq!(summary.sheet, "Leads");
        assert_eq!(summary.inserted, 3);
        assert_eq!(summary.skipped, 2);
        assert_eq!(
            summary.errors,
            vec![
                "Row 5: could not be saved".to_string(),
                "Row 6: unrecognised investment stage 'Moonshot'".to_string(),
            ]
        );

        let stored: Vec<String> = store
            .leads
            .lock()
            .unwrap()
            .iter()
            .map(|lead| lead.company_name.clone())
            .collect();
        assert_eq!(stored, vec!["Nexus Ventures", "Lumen", "AB"]);
    }

    #[test]
    fn email_match_wins_over_serial_match() {
        let by_serial = Uuid::new_v4();
        let by_email = Uuid::new_v4();

        assert_eq!(
            preferred_match(&[(by_serial, false), (by_email, true)]),
            Some(by_email)
        );
        assert_eq!(preferred_match(&[(by_serial, false)]), Some(by_serial));
        assert_eq!(preferred_match(&[]), None);
    }
}
