//! Potential investor (imported lead) models and the review state machine.
//!
//! Leads are imported from spreadsheets, reviewed by an admin and finally
//! promoted into the `investors` table on approval.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::{
    investor::TeamMember,
    query::{empty_as_none, parsed_or_none},
};

/// Prefix of every lead serial number; the sequence value follows, padded to four digits.
pub const SERIAL_PREFIX: &str = "AA";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "review_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    Pending,
    Verified,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Verified => "verified",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }
}

/// Admin action on a lead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewAction {
    Verify,
    Approve,
    Reject,
    Reopen,
}

impl ReviewAction {
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewAction::Verify => "verify",
            ReviewAction::Approve => "approve",
            ReviewAction::Reject => "reject",
            ReviewAction::Reopen => "reopen",
        }
    }

    /// Status the lead ends up in, or `None` when the action is not allowed
    /// from `current`. Approved leads are final.
    pub fn apply(self, current: ReviewStatus) -> Option<ReviewStatus> {
        use ReviewStatus::*;
        match (self, current) {
            (ReviewAction::Verify, Pending) => Some(Verified),
            (ReviewAction::Approve, Pending | Verified) => Some(Approved),
            (ReviewAction::Reject, Pending | Verified) => Some(Rejected),
            (ReviewAction::Reopen, Rejected) => Some(Pending),
            _ => None,
        }
    }
}

/// Sequence value of a serial filter: `"AA0012"`, `"aa12"` and `"12"` all give 12.
pub fn parse_serial(value: &str) -> Option<i64> {
    let digits = value.trim().trim_start_matches(|c: char| c.is_ascii_alphabetic());
    if digits.is_empty() {
        return None;
    }
    digits.parse().ok()
}

/// Represents a potential investor record from the database.
///
/// # Database Table
///
/// Maps to the `potential_investors` table. `serial_seq` is drawn from
/// `potential_investor_serial_seq` in the inserting statement and
/// `serial_number` is derived from it.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialInvestor {
    pub id: Uuid,
    #[serde(skip)]
    pub serial_seq: i64,
    pub serial_number: String,
    pub company_name: String,
    pub website: String,
    pub company_linkedin_url: String,
    pub twitter_url: String,
    pub industry: String,
    pub stage_of_investment: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub person_linkedin_url: String,
    pub authentic: String,
    pub notes: String,
    pub admin_notes: String,
    pub description: String,
    pub investment_thesis: String,
    pub regional_focus: String,
    pub ticket_size: String,
    pub team_members: Json<Vec<TeamMember>>,
    pub tags: Vec<String>,
    pub investor_type: String,
    pub source: String,
    pub status: ReviewStatus,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub promoted_investor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PotentialInvestor {
    /// Person name, falling back to the company when the lead has none.
    pub fn display_name(&self) -> String {
        let person = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let person = person.trim();
        if !person.is_empty() {
            person.to_string()
        } else if !self.company_name.trim().is_empty() {
            self.company_name.trim().to_string()
        } else {
            self.serial_number.clone()
        }
    }
}

/// A lead parsed from a spreadsheet row, ready to insert.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewLead {
    pub company_name: String,
    pub website: String,
    pub company_linkedin_url: String,
    pub twitter_url: String,
    pub industry: String,
    pub stage_of_investment: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub person_linkedin_url: String,
    pub authentic: String,
    pub notes: String,
    pub description: String,
    pub investment_thesis: String,
    pub regional_focus: String,
    pub ticket_size: String,
    pub team_members: Vec<TeamMember>,
    pub tags: Vec<String>,
    pub investor_type: String,
    pub source: String,
}

/// Query parameters for `GET /api/admin/potential-investors`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotentialInvestorFilters {
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub limit: Option<i64>,
    /// Matches company, names, email or serial number
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<ReviewStatus>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub from_serial: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub to_serial: Option<String>,
}

/// Body of `PUT /api/admin/potential-investors/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePotentialInvestorRequest {
    pub company_name: Option<String>,
    pub website: Option<String>,
    pub company_linkedin_url: Option<String>,
    pub twitter_url: Option<String>,
    pub industry: Option<String>,
    pub stage_of_investment: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub person_linkedin_url: Option<String>,
    pub authentic: Option<String>,
    pub notes: Option<String>,
    pub admin_notes: Option<String>,
    pub description: Option<String>,
    pub investment_thesis: Option<String>,
    pub regional_focus: Option<String>,
    pub ticket_size: Option<String>,
    pub team_members: Option<Vec<TeamMember>>,
    pub tags: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub investor_type: Option<String>,
}

/// Optional body of the review actions.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewRequest {
    pub admin_notes: Option<String>,
}

/// Result of one review action.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub message: String,
    pub data: PotentialInvestor,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investor_id: Option<Uuid>,
}

/// Per-sheet result of a lead upload.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SheetImportSummary {
    pub sheet: String,
    pub inserted: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

/// Response body of `POST /api/admin/potential-investors/upload`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadImportResult {
    pub message: String,
    pub sheets: Vec<SheetImportSummary>,
    pub total_inserted: usize,
    pub total_skipped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_filters_accept_prefixed_and_bare_values() {
        assert_eq!(parse_serial("AA0012"), Some(12));
        assert_eq!(parse_serial(" aa7 "), Some(7));
        assert_eq!(parse_serial("30"), Some(30));
        assert_eq!(parse_serial("AA"), None);
        assert_eq!(parse_serial("AAxx"), None);
    }

    #[test]
    fn review_transitions() {
        use ReviewAction::*;
        use ReviewStatus::*;

        assert_eq!(Verify.apply(Pending), Some(Verified));
        assert_eq!(Approve.apply(Pending), Some(Approved));
        assert_eq!(Approve.apply(Verified), Some(Approved));
        assert_eq!(Reject.apply(Verified), Some(Rejected));
        assert_eq!(Reopen.apply(Rejected), Some(Pending));

        assert_eq!(Verify.apply(Verified), None);
        assert_eq!(Approve.apply(Rejected), None);
        assert_eq!(Reopen.apply(Pending), None);
        for action in [Verify, Approve, Reject, Reopen] {
            assert_eq!(action.apply(Approved), None, "approved is final");
        }
    }

    #[test]
    fn update_request_reads_type_field() {
        let request: UpdatePotentialInvestorRequest =
            serde_json::from_str(r#"{"type": "Angel", "adminNotes": "call back"}"#).unwrap();
        assert_eq!(request.investor_type.as_deref(), Some("Angel"));
        assert_eq!(request.admin_notes.as_deref(), Some("call back"));
    }
}
