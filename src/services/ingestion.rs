//! Spreadsheet loading and row mapping.
//!
//! Uploads are read into `SheetTable`s (header row plus keyed data rows)
//! by `load_workbook`, then mapped row by row into insert payloads:
//! - `flat_investor`: the single-sheet investor template
//! - `workbook_investor`: the named "Angel Investors" / "Institutional Investors" sheets
//! - `lead_from_row`: potential investor leads
//!
//! Mapping is pure; the services decide what to do with each result.

use std::{collections::HashMap, io::Cursor};

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use csv::{ReaderBuilder, Trim};

use crate::{
    error::AppError,
    models::{
        investor::{InvestorSource, InvestorType, NewInvestor, TeamMember},
        potential_investor::NewLead,
    },
    services::parsing::{
        is_valid_email, normalize_email, parse_investment_stages, split_commas, split_name,
    },
};

pub const ANGEL_SHEET: &str = "Angel Investors";
pub const INSTITUTIONAL_SHEET: &str = "Institutional Investors";
pub const GRANTS_SHEET: &str = "Grants";

/// Accepted upload extensions.
const SPREADSHEET_EXTENSIONS: [&str; 4] = ["xlsx", "xls", "xlsm", "ods"];

/// One data row, keyed by header text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    /// 1-based row number in the sheet (the header is row 1)
    pub number: usize,
    pub cells: HashMap<String, String>,
}

impl SheetRow {
    /// First non-blank value among `keys`, trimmed.
    pub fn get(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.cells.get(*key))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    /// Like `get`, but blank when absent.
    pub fn text(&self, keys: &[&str]) -> String {
        self.get(keys).unwrap_or_default().to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<SheetRow>,
}

impl SheetTable {
    /// Build a table from raw rows, the first being the header row.
    ///
    /// Rows where every cell is blank are dropped; row numbers still count them.
    pub fn from_rows(name: impl Into<String>, raw: Vec<Vec<String>>) -> Self {
        let mut raw = raw.into_iter();
        let headers: Vec<String> = raw
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|h| h.trim().to_string())
            .collect();

        let rows = raw
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| !c.trim().is_empty()))
            .map(|(index, cells)| SheetRow {
                number: index + 2,
                cells: headers
                    .iter()
                    .zip(cells)
                    .filter(|(header, _)| !header.is_empty())
                    .map(|(header, value)| (header.clone(), value))
                    .collect(),
            })
            .collect();

        Self {
            name: name.into(),
            headers,
            rows,
        }
    }
}

fn extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default()
}

/// Read every sheet of an uploaded `.xlsx`/`.xls`/`.csv` file.
///
/// CSV files yield a single sheet named after the file.
pub fn load_workbook(filename: &str, bytes: Vec<u8>) -> Result<Vec<SheetTable>, AppError> {
    let ext = extension(filename);
    if ext == "csv" {
        return Ok(vec![read_csv(filename, &bytes)?]);
    }
    if !SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        return Err(AppError::InvalidRequest(
            "Only Excel (.xlsx, .xls) or CSV files are allowed".to_string(),
        ));
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AppError::InvalidRequest(format!("Failed to read spreadsheet: {e}")))?;

    let mut tables = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| AppError::InvalidRequest(format!("Failed to read sheet '{name}': {e}")))?;

        let raw: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        tables.push(SheetTable::from_rows(name, raw));
    }

    Ok(tables)
}

fn read_csv(filename: &str, bytes: &[u8]) -> Result<SheetTable, AppError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(bytes);

    let mut raw = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.map_err(|e| {
            AppError::InvalidRequest(format!("Failed to parse CSV row {}: {e}", index + 1))
        })?;
        raw.push(record.iter().map(str::to_string).collect());
    }

    let name = filename.rsplit_once('.').map_or(filename, |(stem, _)| stem);
    Ok(SheetTable::from_rows(name, raw))
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn parse_amount(value: Option<&str>) -> f64 {
    value
        .map(|v| v.replace([',', '$'], ""))
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0.0)
}

/// Map a row of the flat investor template.
///
/// # Errors
///
/// Every problem found in the row, each prefixed with `Row N:`.
pub fn flat_investor(row: &SheetRow) -> Result<NewInvestor, Vec<String>> {
    let n = row.number;
    let mut errors = Vec::new();

    let name = row.get(&["name"]);
    if name.is_none() {
        errors.push(format!("Row {n}: Name is required"));
    }
    let email = row.get(&["email"]).map(normalize_email);
    match email.as_deref() {
        None => errors.push(format!("Row {n}: Email is required")),
        Some(email) if !is_valid_email(email) => {
            errors.push(format!("Row {n}: Invalid email format"))
        }
        Some(_) => {}
    }

    let (Some(name), Some(email), true) = (name, email, errors.is_empty()) else {
        return Err(errors);
    };

    let mut investor = NewInvestor::named(name, email, InvestorSource::ExcelImport);
    investor.company = row.text(&["company"]);
    investor.location = row.text(&["location"]);
    investor.ticket_size_min = parse_amount(row.get(&["ticketSizeMin", "ticket_size_min"]));
    investor.ticket_size_max = parse_amount(row.get(&["ticketSizeMax", "ticket_size_max"]));
    investor.industries = split_commas(&row.text(&["industries"]));
    investor.investment_stage = split_commas(&row.text(&["investmentStage", "investment_stage"]))
        .into_iter()
        .map(|stage| stage.to_lowercase())
        .collect();
    investor.linkedin_url = row.text(&["linkedinUrl", "linkedin_url", "linkedin"]);
    investor.website_url = row.text(&["websiteUrl", "website_url", "website"]);
    investor.notes = row.text(&["notes"]);
    investor.tags = split_commas(&row.text(&["tags"]));
    investor.investor_type = Some(InvestorType::from_tags(&investor.tags));

    Ok(investor)
}

fn is_featured(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.to_ascii_lowercase()).as_deref(),
        Some("yes" | "true" | "y" | "1")
    )
}

/// Map a row of a named investor sheet.
///
/// `Ok(None)` means the row has no email and is skipped silently.
pub fn workbook_investor(sheet: &str, row: &SheetRow) -> Result<Option<NewInvestor>, String> {
    let n = row.number;
    let email_key: &[&str] = match sheet {
        ANGEL_SHEET => &["Email Address"],
        INSTITUTIONAL_SHEET => &["Contact Information"],
        _ => return Ok(None),
    };
    let Some(email) = row.get(email_key).map(normalize_email) else {
        return Ok(None);
    };
    if !is_valid_email(&email) {
        return Err(format!("{sheet} row {n}: Invalid email format"));
    }

    let investor = if sheet == ANGEL_SHEET {
        let name = row
            .get(&["Name"])
            .ok_or_else(|| format!("{sheet} row {n}: Name is required"))?;
        let mut investor = NewInvestor::named(name, email, InvestorSource::ExcelImport);
        investor.company = row.text(&["Company"]);
        investor.location = row.text(&["Country"]);
        investor.country = row.text(&["Country"]);
        investor.linkedin_url = row.text(&["LinkedIn Profile"]);
        investor.investor_type = Some(InvestorType::Angel);
        investor.tags = vec!["Angel".to_string()];
        investor.is_wishlisted = is_featured(row.get(&["Featured"]));
        investor
    } else {
        let name = row
            .get(&["Investor Name / ID"])
            .ok_or_else(|| format!("{sheet} row {n}: Investor name is required"))?;
        let description = row.text(&["Description"]);
        let thesis = row.text(&["Investment Thesis"]);

        let mut investor = NewInvestor::named(name, email, InvestorSource::ExcelImport);
        investor.notes = format!("{description}\n\nThesis: {thesis}");
        investor.description = description;
        investor.investment_thesis = thesis;
        investor.location = row.text(&["Country"]);
        investor.country = row.text(&["Country"]);
        investor.website_url = row.text(&["Website"]);
        investor.industries = split_commas(&row.text(&["Industry Focus"]));
        investor.investor_type = Some(InvestorType::Institutional);
        investor.tags = vec!["Institutional".to_string()];
        if let Some(kind) = row.get(&["Investor Type"]) {
            investor.tags.push(kind.to_string());
        }
        investor
    };

    Ok(Some(investor))
}

/// Map a lead row. The sheet name selects the column layout; unknown sheets
/// and CSV files use the generic lead columns.
///
/// Returns `None` for rows that carry nothing to identify the lead.
pub fn lead_from_row(sheet: &str, row: &SheetRow) -> Option<NewLead> {
    let mut lead = NewLead {
        source: format!("excel-import-{sheet}"),
        investor_type: "Institutional".to_string(),
        ..NewLead::default()
    };

    match sheet {
        GRANTS_SHEET => {
            lead.company_name = row.get(&["Grant Name / ID"])?.to_string();
            lead.website = row.text(&["Website"]);
            lead.industry = row.text(&["Industry Focus"]);
            lead.email = row.text(&["Contact Information"]);
            lead.description = row.text(&["Description"]);
            lead.investment_thesis = row.text(&["Investment Thesis"]);
            lead.notes = format!(
                "Scheme Type: {}\n\nDeadline: {}",
                row.text(&["Scheme Type"]),
                row.text(&["Deadline"])
            );
            lead.first_name = "Grant".to_string();
            lead.last_name = "Provider".to_string();
            lead.tags = vec!["Grant".to_string()];
        }
        ANGEL_SHEET => {
            let (first, last) = split_name(row.get(&["Name"])?);
            lead.first_name = first;
            lead.last_name = last;
            lead.company_name = row.text(&["Company"]);
            lead.email = row.text(&["Email Address"]);
            lead.person_linkedin_url = row.text(&["LinkedIn Profile"]);
            lead.industry = row.text(&["Industry Focus"]);
            lead.stage_of_investment = row.text(&["Investment Stage"]);
            lead.notes = format!("Country: {}", row.text(&["Country"]));
            lead.investor_type = "Angel".to_string();
            lead.tags = vec!["Angel".to_string()];
        }
        INSTITUTIONAL_SHEET => {
            lead.company_name = row.get(&["Institutional Investor Name"])?.to_string();
            lead.email = row.text(&["Email Id", "Investor Email ID"]);
            lead.industry = row.text(&["Industry Focus"]);
            lead.stage_of_investment = row.text(&["Investment Stage"]);
            lead.description = row.text(&["Description"]);
            lead.investment_thesis = row.text(&["Investment Thesis", "Description"]);
            lead.investor_type = row.text(&["Investor Type"]);
            if lead.investor_type.is_empty() {
                lead.investor_type = "Institutional".to_string();
            }
            lead.regional_focus = row.text(&["Regional Focus"]);
            lead.ticket_size = row.text(&["Ticket Size"]);
            lead.website = row.text(&["Website", "Application Link"]);
            lead.notes = format!("Application Link: {}", row.text(&["Application Link"]));

            if let Some(member) = row.get(&["Team Member"]) {
                let linkedin = row.text(&["Investor LinkedIn Profile"]);
                let (first, last) = split_name(member);
                lead.first_name = first;
                lead.last_name = last;
                lead.person_linkedin_url = linkedin.clone();
                lead.team_members = vec![TeamMember {
                    name: member.to_string(),
                    role: row.get(&["Role"]).unwrap_or("Team Member").to_string(),
                    linkedin_url: linkedin,
                    email: String::new(),
                }];
            }
        }
        _ => {
            lead.company_name = row.text(&["Company Name"]);
            lead.website = row.text(&["Website"]);
            lead.company_linkedin_url = row.text(&["Company Linkedin Url"]);
            lead.twitter_url = row.text(&["Twitter Url"]);
            lead.industry = row.text(&["Industry"]);
            lead.stage_of_investment = row.text(&["Stage of investment"]);
            lead.first_name = row.text(&["First Name"]);
            lead.last_name = row.text(&["Last Name"]);
            lead.email = row.text(&["Email"]);
            lead.person_linkedin_url = row.text(&["Person Linkedin Url"]);
            lead.authentic = row.text(&["Authentic"]);
            lead.notes = row.text(&["Notes"]);
            lead.source = "csv-import".to_string();

            if lead.company_name.is_empty()
                && lead.email.is_empty()
                && lead.first_name.is_empty()
                && lead.last_name.is_empty()
            {
                return None;
            }
        }
    }

    lead.email = normalize_email(&lead.email);
    Some(lead)
}

/// Whether the stage text of a lead maps to anything canonical. Used to
/// report leads whose stage will be dropped on promotion.
pub fn has_known_stage(lead: &NewLead) -> bool {
    lead.stage_of_investment.trim().is_empty()
        || !parse_investment_stages(&lead.stage_of_investment).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> SheetTable {
        SheetTable::from_rows(
            "Sheet1",
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    #[test]
    fn rows_are_numbered_from_the_header() {
        let t = table(&[
            &["name", "email"],
            &["Ana", "ana@fund.com"],
            &["", ""],
            &["Bo", "bo@fund.com"],
        ]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].number, 2);
        assert_eq!(t.rows[1].number, 4);
        assert_eq!(t.rows[1].get(&["name"]), Some("Bo"));
    }

    #[test]
    fn csv_upload_is_read_as_one_sheet() {
        let csv = "Company Name,Email\nAcme Ventures, Partner@Acme.vc \n";
        let tables = load_workbook("leads.csv", csv.as_bytes().to_vec()).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].name, "leads");
        assert_eq!(tables[0].rows[0].get(&["Email"]), Some("Partner@Acme.vc"));
    }

    #[test]
    fn unsupported_extensions_are_rejected() {
        let err = load_workbook("investors.pdf", vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }

    #[test]
    fn whole_floats_render_without_decimals() {
        assert_eq!(cell_text(&Data::Float(500000.0)), "500000");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn flat_rows_collect_every_error() {
        let t = table(&[&["name", "email"], &["", "not-an-email"], &["Ana", ""]]);
        assert_eq!(
            flat_investor(&t.rows[0]).unwrap_err(),
            vec!["Row 2: Name is required", "Row 2: Invalid email format"]
        );
        assert_eq!(
            flat_investor(&t.rows[1]).unwrap_err(),
            vec!["Row 3: Email is required"]
        );
    }

    #[test]
    fn flat_row_maps_all_columns() {
        let t = table(&[
            &[
                "name", "email", "company", "ticket_size_min", "ticketSizeMax", "industries",
                "investment_stage", "linkedin", "tags",
            ],
            &[
                "Sarah Chen", "Sarah@Accel.com", "Accel", "500000", "2,000,000", "AI/ML, SaaS",
                "Seed, Series-A", "https://linkedin.com/in/sarah", "Angel, Active",
            ],
        ]);
        let investor = flat_investor(&t.rows[0]).unwrap();
        assert_eq!(investor.email, "sarah@accel.com");
        assert_eq!(investor.ticket_size_min, 500_000.0);
        assert_eq!(investor.ticket_size_max, 2_000_000.0);
        assert_eq!(investor.industries, vec!["AI/ML", "SaaS"]);
        assert_eq!(investor.investment_stage, vec!["seed", "series-a"]);
        assert_eq!(investor.linkedin_url, "https://linkedin.com/in/sarah");
        assert_eq!(investor.investor_type, Some(InvestorType::Angel));
        assert_eq!(investor.source, InvestorSource::ExcelImport);
    }

    #[test]
    fn angel_sheet_rows() {
        let t = table(&[
            &["Name", "Company", "Country", "Email Address", "LinkedIn Profile", "Featured"],
            &["Raj Mehta", "Mehta Capital", "India", "RAJ@mehta.in", "", "Yes"],
            &["No Email", "", "", "", "", ""],
        ]);
        let investor = workbook_investor(ANGEL_SHEET, &t.rows[0]).unwrap().unwrap();
        assert_eq!(investor.email, "raj@mehta.in");
        assert_eq!(investor.location, "India");
        assert!(investor.is_wishlisted);
        assert_eq!(investor.tags, vec!["Angel"]);
        assert_eq!(workbook_investor(ANGEL_SHEET, &t.rows[1]).unwrap(), None);
    }

    #[test]
    fn institutional_sheet_rows_tag_the_investor_type() {
        let t = table(&[
            &["Investor Name / ID", "Description", "Investment Thesis", "Contact Information", "Industry Focus", "Investor Type"],
            &["Blume", "Early VC", "Tech", "deals@blume.vc", "SaaS, Fintech", "VC"],
        ]);
        let investor = workbook_investor(INSTITUTIONAL_SHEET, &t.rows[0]).unwrap().unwrap();
        assert_eq!(investor.notes, "Early VC\n\nThesis: Tech");
        assert_eq!(investor.tags, vec!["Institutional", "VC"]);
        assert_eq!(investor.industries, vec!["SaaS", "Fintech"]);
    }

    #[test]
    fn grant_leads_are_tagged() {
        let t = table(&[
            &["Grant Name / ID", "Website", "Contact Information", "Scheme Type"],
            &["Startup India Seed Fund", "https://seedfund.gov", "Seed@Gov.in", "Seed"],
        ]);
        let lead = lead_from_row(GRANTS_SHEET, &t.rows[0]).unwrap();
        assert_eq!(lead.company_name, "Startup India Seed Fund");
        assert_eq!(lead.email, "seed@gov.in");
        assert_eq!(lead.tags, vec!["Grant"]);
        assert_eq!(lead.source, "excel-import-Grants");
    }

    #[test]
    fn institutional_leads_carry_team_members() {
        let t = table(&[
            &["Institutional Investor Name", "Investor Email ID", "Team Member", "Investor LinkedIn Profile"],
            &["Peak XV", "hello@peakxv.com", "Rajan Anandan", "https://linkedin.com/in/rajan"],
        ]);
        let lead = lead_from_row(INSTITUTIONAL_SHEET, &t.rows[0]).unwrap();
        assert_eq!(lead.first_name, "Rajan");
        assert_eq!(lead.last_name, "Anandan");
        assert_eq!(lead.team_members.len(), 1);
        assert_eq!(lead.team_members[0].role, "Team Member");
        assert_eq!(lead.investor_type, "Institutional");
    }

    #[test]
    fn generic_lead_rows_need_some_identity() {
        let t = table(&[
            &["Company Name", "First Name", "Email", "Notes"],
            &["", "", "", "just a note"],
            &["Acme", "", "", ""],
        ]);
        assert_eq!(lead_from_row("investors", &t.rows[0]), None);
        let lead = lead_from_row("investors", &t.rows[1]).unwrap();
        assert_eq!(lead.source, "csv-import");
        assert!(has_known_stage(&lead));
    }
}
