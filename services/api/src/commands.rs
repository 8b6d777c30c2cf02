use crate::infra::open_portal;
use chrono::{Local, NaiveDate, Utc};
use clap::{Args, Subcommand};
use sinag::config::AppConfig;
use sinag::error::AppError;
use sinag::ids::{InternId, ProgramId};
use sinag::SqliteStore;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub(crate) struct BootstrapArgs {
    /// Login email of the coordinator
    #[arg(long)]
    pub(crate) email: String,
    /// Display name shown in the portal
    #[arg(long)]
    pub(crate) name: String,
    /// Initial password (at least 8 characters)
    #[arg(long)]
    pub(crate) password: String,
}

#[derive(Subcommand, Debug)]
pub(crate) enum ReportCommand {
    /// Activity report with every log entry and the hours summary
    Intern(InternReportArgs),
    /// Roster of a program's interns with their placement status
    Roster(RosterReportArgs),
}

#[derive(Args, Debug)]
pub(crate) struct InternReportArgs {
    #[arg(long)]
    pub(crate) intern_id: i64,
    /// Where to write the PDF
    #[arg(long)]
    pub(crate) output: PathBuf,
    /// Date printed on the report (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub(crate) struct RosterReportArgs {
    #[arg(long)]
    pub(crate) program_id: i64,
    /// Where to write the PDF
    #[arg(long)]
    pub(crate) output: PathBuf,
    /// Date printed on the report (defaults to today)
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

pub(crate) fn run_migrate() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let store = SqliteStore::open(&config.storage.database_path)?;
    println!(
        "Database {} is at schema version {}",
        store.path().display(),
        store.schema_version()?
    );
    Ok(())
}

pub(crate) fn run_bootstrap(args: BootstrapArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let portal = open_portal(&config)?;
    let account = portal.accounts.bootstrap_coordinator(
        &args.email,
        &args.name,
        &args.password,
        Utc::now(),
    )?;
    println!(
        "Created coordinator {} <{}> (account {})",
        account.display_name, account.email, account.id
    );
    Ok(())
}

pub(crate) fn run_report(command: ReportCommand) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let portal = open_portal(&config)?;

    let (pdf, output) = match command {
        ReportCommand::Intern(args) => {
            let today = args.today.unwrap_or_else(|| Local::now().date_naive());
            let pdf = portal
                .reports
                .intern_activity_pdf(InternId(args.intern_id), today)?;
            (pdf, args.output)
        }
        ReportCommand::Roster(args) => {
            let today = args.today.unwrap_or_else(|| Local::now().date_naive());
            let pdf = portal
                .reports
                .program_roster_pdf(ProgramId(args.program_id), today)?;
            (pdf, args.output)
        }
    };

    write_pdf(&output, &pdf)?;
    println!("Wrote {} ({} bytes)", output.display(), pdf.len());
    Ok(())
}

fn write_pdf(output: &Path, pdf: &[u8]) -> Result<(), AppError> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, pdf)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_pdf_creates_missing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let output = dir.path().join("reports").join("roster.pdf");
        write_pdf(&output, b"%PDF-1.3 test").expect("written");
        assert_eq!(fs::read(&output).expect("read back"), b"%PDF-1.3 test");
    }
}
