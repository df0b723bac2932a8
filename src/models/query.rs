//! Query-string helpers shared by the list endpoints.
//!
//! Browser forms send every filter, including the ones left blank
//! (`?plan=&status=active`). The deserializers here treat blank values as
//! absent instead of failing the whole request.

use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{DeserializeOwned, Error as _, IntoDeserializer},
};

/// Blank-tolerant `Option<T>` for enums, strings and UUIDs.
pub fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => {
            let de: serde::de::value::StrDeserializer<'_, D::Error> = value.into_deserializer();
            T::deserialize(de).map(Some)
        }
    }
}

/// Blank-tolerant `Option<T>` for numbers and booleans.
pub fn parsed_or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(D::Error::custom),
    }
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates (midnight UTC).
pub fn flexible_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_datetime(value)
            .map(Some)
            .ok_or_else(|| D::Error::custom(format!("invalid date: {value}"))),
    }
}

pub fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;
/// Highest page whose offset still fits in an `i64` at any page size.
const MAX_PAGE: i64 = i64::MAX / MAX_PAGE_SIZE;

/// Normalized page/limit pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageParams {
    pub page: i64,
    pub limit: i64,
}

impl PageParams {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).clamp(1, MAX_PAGE),
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination block returned alongside list data.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl PaginationMeta {
    pub fn new(params: PageParams, total: i64) -> Self {
        Self {
            page: params.page,
            limit: params.limit,
            total,
            pages: (total + params.limit - 1) / params.limit,
        }
    }
}

/// A page of results.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    pub fn new(data: Vec<T>, params: PageParams, total: i64) -> Self {
        Self {
            data,
            pagination: PaginationMeta::new(params, total),
        }
    }
}

/// Escape `%` and `_` so user input is matched literally inside `ILIKE`.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Filters {
        #[serde(default, deserialize_with = "empty_as_none")]
        status: Option<crate::models::subscription::SubscriptionStatus>,
        #[serde(default, deserialize_with = "parsed_or_none")]
        is_active: Option<bool>,
        #[serde(default, deserialize_with = "parsed_or_none")]
        page: Option<i64>,
        #[serde(default, deserialize_with = "flexible_datetime")]
        start_date: Option<DateTime<Utc>>,
    }

    fn parse(query: &str) -> Filters {
        let uri: axum::http::Uri = format!("/x?{query}").parse().unwrap();
        axum::extract::Query::<Filters>::try_from_uri(&uri).unwrap().0
    }

    #[test]
    fn blank_filters_are_ignored() {
        let filters = parse("status=&isActive=&page=&startDate=");
        assert!(filters.status.is_none());
        assert!(filters.is_active.is_none());
        assert!(filters.page.is_none());
        assert!(filters.start_date.is_none());
    }

    #[test]
    fn filled_filters_are_parsed() {
        let filters = parse("status=cancelled&isActive=false&page=3&startDate=2025-02-01");
        assert_eq!(
            filters.status,
            Some(crate::models::subscription::SubscriptionStatus::Cancelled)
        );
        assert_eq!(filters.is_active, Some(false));
        assert_eq!(filters.page, Some(3));
        let start = filters.start_date.unwrap();
        assert_eq!((start.month(), start.day(), start.hour()), (2, 1, 0));
    }

    #[test]
    fn page_params_are_clamped() {
        let params = PageParams::new(Some(0), Some(10_000));
        assert_eq!(params, PageParams { page: 1, limit: MAX_PAGE_SIZE });

        let params = PageParams::new(Some(3), Some(20));
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn huge_page_numbers_do_not_overflow_the_offset() {
        let params = PageParams::new(Some(i64::MAX), Some(MAX_PAGE_SIZE));
        assert_eq!(params.page, MAX_PAGE);
        assert!(params.offset() > 0);
        assert_eq!(params.offset(), (MAX_PAGE - 1) * MAX_PAGE_SIZE);
    }

    #[test]
    fn pages_round_up() {
        let meta = PaginationMeta::new(PageParams::new(None, Some(50)), 101);
        assert_eq!(meta.pages, 3);
        let empty = PaginationMeta::new(PageParams::new(None, None), 0);
        assert_eq!(empty.pages, 0);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
