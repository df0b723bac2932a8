//! CSV renderings of the admin tables, plus the investor upload template.

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{investor::Investor, subscription::SubscriptionWithUser, user::User},
};

/// MIME type for every download produced here.
pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";

fn writer() -> csv::Writer<Vec<u8>> {
    csv::Writer::from_writer(Vec::new())
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, AppError> {
    writer
        .into_inner()
        .map_err(|err| AppError::Internal(format!("csv flush failed: {}", err.error())))
}

fn csv_error(err: csv::Error) -> AppError {
    AppError::Internal(format!("csv write failed: {err}"))
}

fn date(value: Option<DateTime<Utc>>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "Yes" } else { "No" }
}

/// Whole numbers print without a trailing `.0`.
fn number(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

pub fn users_csv(users: &[User]) -> Result<Vec<u8>, AppError> {
    let mut out = writer();
    out.write_record([
        "Name",
        "Email",
        "User Type",
        "Subscription Plan",
        "Subscription Status",
        "Account Status",
        "Profile Completion",
        "Signup Date",
        "Last Login",
    ])
    .map_err(csv_error)?;

    for user in users {
        let last_login = match user.last_login {
            Some(ts) => ts.format("%Y-%m-%d").to_string(),
            None => "Never".to_string(),
        };
        out.write_record([
            user.name.as_str(),
            user.email.as_str(),
            user.user_type.as_str(),
            user.subscription_plan.as_str(),
            user.subscription_status.as_str(),
            user.account_status.as_str(),
            &format!("{}%", user.profile_completion),
            &date(Some(user.signup_date)),
            &last_login,
        ])
        .map_err(csv_error)?;
    }

    finish(out)
}

pub fn subscriptions_csv(subscriptions: &[SubscriptionWithUser]) -> Result<Vec<u8>, AppError> {
    let mut out = writer();
    out.write_record([
        "User Email",
        "Plan",
        "Status",
        "Amount",
        "Currency",
        "Start Date",
        "End Date",
        "Renewal Date",
        "Payment Method",
    ])
    .map_err(csv_error)?;

    for row in subscriptions {
        let sub = &row.subscription;
        out.write_record([
            row.user_email.as_deref().unwrap_or("N/A"),
            sub.plan.as_str(),
            sub.status.as_str(),
            &format!("{:.2}", sub.amount_cents as f64 / 100.0),
            sub.currency.as_str(),
            &date(Some(sub.start_date)),
            &date(sub.end_date),
            &date(sub.renewal_date),
            sub.payment_method.as_str(),
        ])
        .map_err(csv_error)?;
    }

    finish(out)
}

pub fn investors_csv(investors: &[Investor]) -> Result<Vec<u8>, AppError> {
    let mut out = writer();
    out.write_record([
        "Name",
        "Email",
        "Company",
        "Location",
        "Ticket Size Min",
        "Ticket Size Max",
        "Industries",
        "Investment Stage",
        "LinkedIn URL",
        "Website URL",
        "Tags",
        "Active",
        "Verified",
        "Source",
    ])
    .map_err(csv_error)?;

    for investor in investors {
        out.write_record([
            investor.name.as_str(),
            investor.email.as_str(),
            investor.company.as_str(),
            investor.location.as_str(),
            &number(investor.ticket_size_min),
            &number(investor.ticket_size_max),
            &investor.industries.join(", "),
            &investor.investment_stage.join(", "),
            investor.linkedin_url.as_str(),
            investor.website_url.as_str(),
            &investor.tags.join(", "),
            yes_no(investor.is_active),
            yes_no(investor.is_verified),
            investor.source.as_str(),
        ])
        .map_err(csv_error)?;
    }

    finish(out)
}

/// Flat-upload template. The header row uses the column names the
/// `upload-excel` importer recognises.
pub fn investor_template_csv() -> Result<Vec<u8>, AppError> {
    const HEADER: [&str; 12] = [
        "name",
        "email",
        "company",
        "location",
        "ticketSizeMin",
        "ticketSizeMax",
        "industries",
        "investmentStage",
        "linkedinUrl",
        "websiteUrl",
        "notes",
        "tags",
    ];
    const ROWS: [[&str; 12]; 2] = [
        [
            "Sarah Chen",
            "sarah.chen@accel.com",
            "Accel Partners",
            "San Francisco, CA",
            "500000",
            "2000000",
            "AI/ML, SaaS, Fintech",
            "seed, series-a",
            "https://linkedin.com/in/sarahchen",
            "https://accel.com",
            "Focus on AI startups in healthcare",
            "AI, Healthcare, Active",
        ],
        [
            "Michael Roberts",
            "mroberts@sequoia.com",
            "Sequoia Capital",
            "Menlo Park, CA",
            "1000000",
            "5000000",
            "Fintech, Enterprise, SaaS",
            "series-a, series-b",
            "https://linkedin.com/in/michaelroberts",
            "https://sequoiacap.com",
            "Enterprise SaaS specialist",
            "Enterprise, SaaS, Top Tier",
        ],
    ];

    let mut out = writer();
    out.write_record(HEADER).map_err(csv_error)?;
    for row in ROWS {
        out.write_record(row).map_err(csv_error)?;
    }
    finish(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::ingestion;

    #[test]
    fn template_round_trips_through_the_flat_importer() {
        let bytes = investor_template_csv().unwrap();
        let sheets = ingestion::load_workbook("investors_template.csv", bytes).unwrap();
        let sheet = &sheets[0];
        assert_eq!(sheet.rows.len(), 2);

        let first = ingestion::flat_investor(&sheet.rows[0]).unwrap();
        assert_eq!(first.name, "Sarah Chen");
        assert_eq!(first.ticket_size_max, 2_000_000.0);
        assert_eq!(first.investment_stage, vec!["seed", "series-a"]);
        assert_eq!(sheet.rows[1].number, 3);
    }

    #[test]
    fn numbers_drop_trailing_zero_fraction() {
        assert_eq!(number(500000.0), "500000");
        assert_eq!(number(2.5), "2.5");
        assert_eq!(yes_no(false), "No");
    }
}
