//! Field normalisers for spreadsheet imports and lead promotion.
//!
//! Spreadsheet cells arrive as free text ("$50K - $2M", "Seed & Series A",
//! "India; SEA"). These helpers turn them into the typed columns of the
//! `investors` table.

use std::sync::LazyLock;

use regex::Regex;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\$?(\d+(?:\.\d+)?)\s*([KMB])?").expect("valid amount regex")
});

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trimmed and lowercased, the form every email column is stored in.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Extract a `(min, max)` range from a free-text ticket size.
///
/// Every `$?<number><K|M|B>?` token counts. Two or more tokens give the
/// smallest and largest, a single token gives a fixed ticket, no token
/// gives `(0, 0)`.
pub fn parse_ticket_size(text: &str) -> (f64, f64) {
    let amounts: Vec<f64> = AMOUNT_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let value: f64 = caps.get(1)?.as_str().parse().ok()?;
            let multiplier = match caps.get(2).map(|m| m.as_str().to_ascii_uppercase()) {
                Some(suffix) if suffix == "K" => 1_000.0,
                Some(suffix) if suffix == "M" => 1_000_000.0,
                Some(suffix) if suffix == "B" => 1_000_000_000.0,
                _ => 1.0,
            };
            Some(value * multiplier)
        })
        .collect();

    match amounts.as_slice() {
        [] => (0.0, 0.0),
        [only] => (*only, *only),
        many => {
            let min = many.iter().copied().fold(f64::INFINITY, f64::min);
            let max = many.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            (min, max)
        }
    }
}

/// Split on `,` `;` and `/`, trimming and dropping empty parts.
///
/// Used for regional focus and industry lists.
pub fn split_list(text: &str) -> Vec<String> {
    text.split([',', ';', '/'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Comma-separated cell to a list (tags, industries in flat imports).
pub fn split_commas(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn canonical_stage(token: &str) -> Option<&'static str> {
    let stage = match token {
        "preseed" | "pre-seed" | "pre seed" => "pre-seed",
        "seed" | "early stage" | "early" => "seed",
        "series a" | "series-a" | "seriesa" => "series-a",
        "series b" | "series-b" | "seriesb" => "series-b",
        "series c" | "series-c" | "seriesc" => "series-c",
        "growth" => "growth",
        "late stage" | "late-stage" | "latestage" => "late-stage",
        _ => return None,
    };
    Some(stage)
}

/// Map free-text stages to canonical ones, deduplicated in first-seen order.
/// Unknown tokens are dropped.
pub fn parse_investment_stages(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut stages: Vec<String> = Vec::new();
    for token in lowered.split([',', ';', '/', '&']).map(str::trim) {
        if let Some(stage) = canonical_stage(token) {
            if !stages.iter().any(|s| s == stage) {
                stages.push(stage.to_string());
            }
        }
    }
    stages
}

/// Split "First Middle Last" into `("First", "Middle Last")`.
pub fn split_name(full: &str) -> (String, String) {
    let full = full.trim();
    match full.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (full.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("sarah.chen@accel.com"));
        assert!(!is_valid_email("sarah chen@accel.com"));
        assert!(!is_valid_email("sarah@accel"));
        assert!(!is_valid_email(""));
        assert_eq!(normalize_email("  Sarah@Accel.COM "), "sarah@accel.com");
    }

    #[test]
    fn ticket_size_ranges() {
        assert_eq!(parse_ticket_size("$50K - $500K"), (50_000.0, 500_000.0));
        assert_eq!(parse_ticket_size("50000-500000"), (50_000.0, 500_000.0));
        assert_eq!(parse_ticket_size("$1M+"), (1_000_000.0, 1_000_000.0));
        assert_eq!(parse_ticket_size("$2m to $250k"), (250_000.0, 2_000_000.0));
        assert_eq!(parse_ticket_size("$1.5B"), (1_500_000_000.0, 1_500_000_000.0));
        assert_eq!(parse_ticket_size("undisclosed"), (0.0, 0.0));
        assert_eq!(parse_ticket_size(""), (0.0, 0.0));
    }

    #[test]
    fn lists_split_on_all_separators() {
        assert_eq!(
            split_list("India; SEA / USA,, "),
            vec!["India", "SEA", "USA"]
        );
        assert!(split_list("  ").is_empty());
        assert_eq!(split_commas("AI/ML, SaaS"), vec!["AI/ML", "SaaS"]);
    }

    #[test]
    fn stages_are_canonicalised() {
        assert_eq!(
            parse_investment_stages("Pre Seed, Seed & Series A; early stage"),
            vec!["pre-seed", "seed", "series-a"]
        );
        assert_eq!(parse_investment_stages("Late Stage / Growth"), vec!["late-stage", "growth"]);
        assert!(parse_investment_stages("mezzanine").is_empty());
    }

    #[test]
    fn names_split_on_first_space() {
        assert_eq!(
            split_name("Mary Ann Lee"),
            ("Mary".to_string(), "Ann Lee".to_string())
        );
        assert_eq!(split_name("Cher"), ("Cher".to_string(), String::new()));
    }
}
