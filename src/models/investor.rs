//! Investor data models and API request/response types.
//!
//! This module defines:
//! - `Investor`: canonical investor record (the `investors` table)
//! - `NewInvestor`: insert payload shared by manual creation, imports and promotion
//! - Admin create/update bodies and list filters
//! - `InvestorCard`: the founder-facing projection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use crate::models::query::{empty_as_none, parsed_or_none};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "investor_type")]
pub enum InvestorType {
    Angel,
    Institutional,
}

impl InvestorType {
    /// Angel when any tag says so, Institutional otherwise.
    pub fn from_tags(tags: &[String]) -> Self {
        if tags.iter().any(|t| t.trim().eq_ignore_ascii_case("angel")) {
            InvestorType::Angel
        } else {
            InvestorType::Institutional
        }
    }

    /// Lenient parse of free-text type columns (`"angel"`, `"Angel Investor"`).
    pub fn from_label(label: &str) -> Self {
        if label.trim().to_ascii_lowercase().starts_with("angel") {
            InvestorType::Angel
        } else {
            InvestorType::Institutional
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InvestorType::Angel => "Angel",
            InvestorType::Institutional => "Institutional",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "investor_source", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum InvestorSource {
    Manual,
    ExcelImport,
    Api,
    Migration,
}

impl InvestorSource {
    pub fn as_str(self) -> &'static str {
        match self {
            InvestorSource::Manual => "manual",
            InvestorSource::ExcelImport => "excel-import",
            InvestorSource::Api => "api",
            InvestorSource::Migration => "migration",
        }
    }
}

/// A person on an investor's team.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TeamMember {
    pub name: String,
    pub role: String,
    pub linkedin_url: String,
    pub email: String,
}

/// Represents an investor record from the database.
///
/// # Database Table
///
/// Maps to the `investors` table. Non-blank emails are unique (partial
/// index); deletion is soft, through `is_active`.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Investor {
    pub id: Uuid,
    pub name: String,
    pub serial_number: Option<String>,
    pub email: String,
    pub company: String,
    pub location: String,
    pub country: String,
    pub description: String,
    pub investment_thesis: String,
    pub regional_focus: Vec<String>,
    pub ticket_size_min: f64,
    pub ticket_size_max: f64,
    pub team_members: Json<Vec<TeamMember>>,
    pub industries: Vec<String>,
    pub investment_stage: Vec<String>,
    pub linkedin_url: String,
    pub website_url: String,
    pub notes: String,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub investor_type: Option<InvestorType>,
    pub is_active: bool,
    pub is_verified: bool,
    pub source: InvestorSource,
    pub created_by: Option<Uuid>,
    pub avatar: String,
    pub is_wishlisted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the `investors` table.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvestor {
    pub name: String,
    pub serial_number: Option<String>,
    pub email: String,
    pub company: String,
    pub location: String,
    pub country: String,
    pub description: String,
    pub investment_thesis: String,
    pub regional_focus: Vec<String>,
    pub ticket_size_min: f64,
    pub ticket_size_max: f64,
    pub team_members: Vec<TeamMember>,
    pub industries: Vec<String>,
    pub investment_stage: Vec<String>,
    pub linkedin_url: String,
    pub website_url: String,
    pub notes: String,
    pub tags: Vec<String>,
    pub investor_type: Option<InvestorType>,
    pub is_verified: bool,
    pub is_wishlisted: bool,
    pub source: InvestorSource,
}

impl NewInvestor {
    /// Empty record with just a name and email, everything else defaulted.
    pub fn named(name: impl Into<String>, email: impl Into<String>, source: InvestorSource) -> Self {
        Self {
            name: name.into(),
            serial_number: None,
            email: email.into(),
            company: String::new(),
            location: String::new(),
            country: String::new(),
            description: String::new(),
            investment_thesis: String::new(),
            regional_focus: Vec::new(),
            ticket_size_min: 0.0,
            ticket_size_max: 0.0,
            team_members: Vec::new(),
            industries: Vec::new(),
            investment_stage: Vec::new(),
            linkedin_url: String::new(),
            website_url: String::new(),
            notes: String::new(),
            tags: Vec::new(),
            investor_type: None,
            is_verified: false,
            is_wishlisted: false,
            source,
        }
    }
}

/// Ticket size range in the request bodies.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct TicketSize {
    pub min: f64,
    pub max: f64,
}

/// Request body for `POST /api/admin/investors`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvestorRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub investment_thesis: String,
    #[serde(default)]
    pub regional_focus: Vec<String>,
    #[serde(default)]
    pub ticket_size: TicketSize,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    #[serde(default)]
    pub industries: Vec<String>,
    #[serde(default)]
    pub investment_stage: Vec<String>,
    #[serde(default)]
    pub linkedin_url: String,
    #[serde(default)]
    pub website_url: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, rename = "type")]
    pub investor_type: Option<InvestorType>,
    #[serde(default)]
    pub is_verified: bool,
}

/// Partial update for `PATCH /api/admin/investors/{id}`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateInvestorRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    pub description: Option<String>,
    pub investment_thesis: Option<String>,
    pub regional_focus: Option<Vec<String>>,
    pub ticket_size: Option<TicketSize>,
    pub team_members: Option<Vec<TeamMember>>,
    pub industries: Option<Vec<String>>,
    pub investment_stage: Option<Vec<String>>,
    pub linkedin_url: Option<String>,
    pub website_url: Option<String>,
    pub notes: Option<String>,
    pub tags: Option<Vec<String>>,
    #[serde(rename = "type")]
    pub investor_type: Option<InvestorType>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    pub is_wishlisted: Option<bool>,
    pub avatar: Option<String>,
}

/// Query parameters for `GET /api/admin/investors`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorFilters {
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub limit: Option<i64>,
    /// Matches name, email or company
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub industry: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub source: Option<InvestorSource>,
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub is_active: Option<bool>,
    #[serde(default, deserialize_with = "parsed_or_none")]
    pub is_verified: Option<bool>,
}

/// Request body for `POST /api/admin/investors/bulk-delete`.
#[derive(Debug, Deserialize)]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub ids: Vec<Uuid>,
}

/// Response body for `POST /api/admin/investors/bulk-delete`.
#[derive(Debug, Serialize)]
pub struct BulkDeleteResponse {
    pub message: String,
    pub count: u64,
}

/// Investor as shown on the founder discovery pages.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestorCard {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub company: String,
    pub location: String,
    pub ticket_size: String,
    pub industries: Vec<String>,
    pub investment_stage: Vec<String>,
    pub linkedin_url: String,
    pub website: String,
    pub description: String,
    pub investment_thesis: String,
    pub regional_focus: Vec<String>,
    pub team_members: Vec<TeamMember>,
    pub tags: Vec<String>,
    #[serde(rename = "type")]
    pub investor_type: Option<InvestorType>,
    pub is_verified: bool,
    pub is_wishlisted: bool,
    pub avatar: String,
    pub source: InvestorSource,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const NOT_AVAILABLE: &str = "N/A";

impl From<Investor> for InvestorCard {
    fn from(investor: Investor) -> Self {
        let description = [&investor.description, &investor.notes]
            .into_iter()
            .find(|text| !text.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| "No description available.".to_string());

        Self {
            id: investor.id,
            ticket_size: format_ticket_size(investor.ticket_size_min, investor.ticket_size_max),
            company: or_not_available(investor.company),
            location: or_not_available(investor.location),
            name: investor.name,
            email: investor.email,
            industries: investor.industries,
            investment_stage: investor.investment_stage,
            linkedin_url: investor.linkedin_url,
            website: investor.website_url,
            description,
            investment_thesis: investor.investment_thesis,
            regional_focus: investor.regional_focus,
            team_members: investor.team_members.0,
            tags: investor.tags,
            investor_type: investor.investor_type,
            is_verified: investor.is_verified,
            is_wishlisted: investor.is_wishlisted,
            avatar: investor.avatar,
            source: investor.source,
            created_at: investor.created_at,
            updated_at: investor.updated_at,
        }
    }
}

fn or_not_available(value: String) -> String {
    if value.trim().is_empty() {
        NOT_AVAILABLE.to_string()
    } else {
        value
    }
}

/// `"$<min>K - $<max>K"`, or `"N/A"` when both bounds are zero.
pub fn format_ticket_size(min: f64, max: f64) -> String {
    if min == 0.0 && max == 0.0 {
        return NOT_AVAILABLE.to_string();
    }
    format!("${}K - ${}K", format_amount(min), format_amount(max))
}

/// Whole numbers without a trailing `.0`.
pub fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_from_tags() {
        let tags = vec!["Top Tier".to_string(), "angel".to_string()];
        assert_eq!(InvestorType::from_tags(&tags), InvestorType::Angel);
        assert_eq!(InvestorType::from_tags(&[]), InvestorType::Institutional);
        assert_eq!(InvestorType::from_label("Angel Network"), InvestorType::Angel);
        assert_eq!(InvestorType::from_label("VC"), InvestorType::Institutional);
    }

    #[test]
    fn ticket_size_formatting() {
        assert_eq!(format_ticket_size(0.0, 0.0), "N/A");
        assert_eq!(format_ticket_size(50.0, 500.0), "$50K - $500K");
        assert_eq!(format_ticket_size(0.0, 2.5), "$0K - $2.5K");
    }

    #[test]
    fn source_uses_kebab_case() {
        assert_eq!(
            serde_json::to_value(InvestorSource::ExcelImport).unwrap(),
            "excel-import"
        );
        let parsed: InvestorSource = serde_json::from_str("\"migration\"").unwrap();
        assert_eq!(parsed, InvestorSource::Migration);
    }

    #[test]
    fn team_member_tolerates_missing_fields() {
        let member: TeamMember = serde_json::from_str(r#"{"name": "Ana"}"#).unwrap();
        assert_eq!(member.name, "Ana");
        assert!(member.linkedin_url.is_empty());
    }
}
