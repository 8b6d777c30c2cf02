//! Class roster CSV exchange.
//!
//! Imports expect the registrar's column headings:
//! `Student Number, Last Name, First Name, Middle Name, Email, Section`.

use std::io::Read;

use serde::{Deserialize, Deserializer, Serialize};

use super::domain::{Intern, InternDraft};
use crate::ids::{AccountId, InternId, ProgramId};

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RosterRow {
    #[serde(rename = "Student Number")]
    pub(crate) student_number: String,
    #[serde(rename = "Last Name")]
    pub(crate) last_name: String,
    #[serde(rename = "First Name")]
    pub(crate) first_name: String,
    #[serde(
        rename = "Middle Name",
        default,
        deserialize_with = "empty_string_as_none"
    )]
    pub(crate) middle_name: Option<String>,
    #[serde(rename = "Email")]
    pub(crate) email: String,
    #[serde(rename = "Section")]
    pub(crate) section: String,
}

impl RosterRow {
    pub(crate) fn into_draft(
        self,
        program_id: ProgramId,
        school_year: &str,
        required_hours: Option<u32>,
    ) -> InternDraft {
        InternDraft {
            student_number: self.student_number,
            last_name: self.last_name,
            first_name: self.first_name,
            middle_name: self.middle_name,
            email: self.email,
            program_id,
            section: self.section,
            school_year: school_year.to_string(),
            required_hours,
        }
    }
}

/// A data row and the 1-based line it came from; header is line 1.
#[derive(Debug)]
pub(crate) struct ParsedRow {
    pub(crate) line: u64,
    pub(crate) row: Result<RosterRow, String>,
}

/// Reads every data row, keeping malformed rows as per-line errors.
pub(crate) fn parse_roster<R: Read>(reader: R) -> Result<Vec<ParsedRow>, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    csv_reader.headers()?;

    let mut rows = Vec::new();
    for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
        let fallback_line = index as u64 + 2;
        let parsed = match record {
            Ok(row) => ParsedRow {
                line: fallback_line,
                row: Ok(row),
            },
            Err(err) => ParsedRow {
                line: err
                    .position()
                    .map(csv::Position::line)
                    .unwrap_or(fallback_line),
                row: Err(describe(&err)),
            },
        };
        rows.push(parsed);
    }
    Ok(rows)
}

fn describe(err: &csv::Error) -> String {
    match err.kind() {
        csv::ErrorKind::Deserialize { err, .. } => format!("malformed row: {err}"),
        csv::ErrorKind::UnequalLengths { len, .. } => {
            format!("row has {len} columns; expected 6")
        }
        _ => format!("unreadable row: {err}"),
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

#[derive(Debug, Clone, Serialize)]
pub struct EnrolledRow {
    pub line: u64,
    pub student_number: String,
    pub intern_id: InternId,
    pub account_id: AccountId,
    pub initial_password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RowIssue {
    pub line: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_number: Option<String>,
    pub reason: String,
}

/// Per-row outcome of a roster import.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub enrolled: Vec<EnrolledRow>,
    pub skipped: Vec<RowIssue>,
    pub failed: Vec<RowIssue>,
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Student Number")]
    student_number: &'a str,
    #[serde(rename = "Last Name")]
    last_name: &'a str,
    #[serde(rename = "First Name")]
    first_name: &'a str,
    #[serde(rename = "Middle Name")]
    middle_name: &'a str,
    #[serde(rename = "Email")]
    email: &'a str,
    #[serde(rename = "Section")]
    section: &'a str,
    #[serde(rename = "Status")]
    status: &'a str,
    #[serde(rename = "Company")]
    company: &'a str,
}

/// Writes interns with their company names, in the import column order.
pub(crate) fn write_roster<'a, I>(interns: I) -> Result<String, csv::Error>
where
    I: IntoIterator<Item = (&'a Intern, &'a str)>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    for (intern, company) in interns {
        writer.serialize(ExportRow {
            student_number: &intern.student_number,
            last_name: &intern.last_name,
            first_name: &intern.first_name,
            middle_name: intern.middle_name.as_deref().unwrap_or(""),
            email: &intern.email,
            section: &intern.section,
            status: intern.status.label(),
            company,
        })?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| csv::Error::from(err.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
