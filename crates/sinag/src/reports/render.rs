//! Page layouts for the three printable reports.

use chrono::NaiveDate;

use super::canvas::{line_height, truncate, wrap, Canvas, Weight, MARGIN_LEFT};
use super::ReportError;
use crate::internship::companies::Company;
use crate::internship::dashboard::StatusCounts;
use crate::internship::evaluations::domain::MAX_RATING;
use crate::internship::evaluations::{Criterion, Evaluation};
use crate::internship::interns::Intern;
use crate::internship::logbook::{ActivityLog, HoursSummary};
use crate::internship::programs::Program;

const TITLE: f32 = 16.0;
const HEADING: f32 = 11.0;
const BODY: f32 = 10.0;
const SMALL: f32 = 9.0;

/// Everything printed on an intern's activity report.
pub struct ActivitySheet {
    pub intern: Intern,
    pub program: Option<Program>,
    pub company: Option<Company>,
    pub supervisor: Option<String>,
    pub logs: Vec<ActivityLog>,
    pub hours: HoursSummary,
    pub generated_on: NaiveDate,
}

pub struct EvaluationSheet {
    pub evaluation: Evaluation,
    pub intern: Intern,
    pub company: Option<Company>,
    pub evaluator: Option<String>,
}

pub struct RosterSheet {
    pub program: Program,
    pub interns: Vec<(Intern, Option<String>)>,
    pub generated_on: NaiveDate,
}

const LOG_COLUMNS: [(f32, &str); 5] = [
    (MARGIN_LEFT, "Date"),
    (44.0, "In"),
    (60.0, "Out"),
    (76.0, "Hours"),
    (94.0, "Activities"),
];
const ACTIVITY_WIDTH: usize = 58;

pub fn activity_report(sheet: &ActivitySheet) -> Result<Vec<u8>, ReportError> {
    let intern = &sheet.intern;
    let mut canvas = Canvas::new("Internship Activity Report")?;
    canvas.line(TITLE, Weight::Bold, "Internship Activity Report");
    canvas.line(SMALL, Weight::Regular, &format!("Generated {}", sheet.generated_on));
    canvas.gap(3.0);

    canvas.line(
        HEADING,
        Weight::Bold,
        &format!("{} ({})", intern.full_name(), intern.student_number),
    );
    canvas.line(BODY, Weight::Regular, &program_line(intern, sheet.program.as_ref()));
    canvas.line(
        BODY,
        Weight::Regular,
        &format!(
            "Company: {}",
            sheet
                .company
                .as_ref()
                .map_or("Not yet placed", |company| company.name.as_str())
        ),
    );
    if let Some(supervisor) = &sheet.supervisor {
        canvas.line(BODY, Weight::Regular, &format!("Supervisor: {supervisor}"));
    }
    canvas.line(BODY, Weight::Regular, &period_line(intern));
    canvas.line(
        BODY,
        Weight::Regular,
        &format!("Status: {}", intern.status.label()),
    );
    canvas.gap(2.0);
    canvas.rule();

    if sheet.logs.is_empty() {
        canvas.line(BODY, Weight::Regular, "No approved activity logs yet.");
    } else {
        canvas.row(BODY, Weight::Bold, &LOG_COLUMNS);
        for log in &sheet.logs {
            let date = log.log_date.format("%Y-%m-%d").to_string();
            let time_in = log.time_in.format("%H:%M").to_string();
            let time_out = log.time_out.format("%H:%M").to_string();
            let hours = format!("{:.2}", f64::from(log.worked_minutes) / 60.0);
            let activities = truncate(&log.activities, ACTIVITY_WIDTH);
            if canvas.ensure_room(line_height(SMALL)) {
                canvas.row(BODY, Weight::Bold, &LOG_COLUMNS);
            }
            canvas.row(
                SMALL,
                Weight::Regular,
                &[
                    (LOG_COLUMNS[0].0, date.as_str()),
                    (LOG_COLUMNS[1].0, time_in.as_str()),
                    (LOG_COLUMNS[2].0, time_out.as_str()),
                    (LOG_COLUMNS[3].0, hours.as_str()),
                    (LOG_COLUMNS[4].0, activities.as_str()),
                ],
            );
        }
    }

    let hours = &sheet.hours;
    canvas.ensure_room(30.0);
    canvas.gap(2.0);
    canvas.rule();
    canvas.line(
        HEADING,
        Weight::Bold,
        &format!(
            "Approved hours: {:.2} of {} required ({:.2}%)",
            hours.approved_hours, hours.required_hours, hours.percent_complete
        ),
    );
    canvas.line(
        BODY,
        Weight::Regular,
        &format!("Awaiting review: {:.2} hours", hours.pending_hours),
    );
    canvas.line(
        BODY,
        Weight::Regular,
        &format!("Remaining: {:.2} hours", hours.remaining_hours),
    );
    canvas.line(
        SMALL,
        Weight::Regular,
        &format!("Approved entries: {}", sheet.logs.len()),
    );
    canvas.finish()
}

pub fn evaluation_report(sheet: &EvaluationSheet) -> Result<Vec<u8>, ReportError> {
    let evaluation = &sheet.evaluation;
    let intern = &sheet.intern;
    let title = format!("{} Evaluation", evaluation.period.label());
    let mut canvas = Canvas::new(&title)?;
    canvas.line(TITLE, Weight::Bold, &title);
    canvas.line(
        SMALL,
        Weight::Regular,
        &format!("Submitted {}", evaluation.submitted_at.format("%Y-%m-%d")),
    );
    canvas.gap(3.0);
    canvas.line(
        HEADING,
        Weight::Bold,
        &format!("{} ({})", intern.full_name(), intern.student_number),
    );
    if let Some(company) = &sheet.company {
        canvas.line(BODY, Weight::Regular, &format!("Company: {}", company.name));
    }
    if let Some(evaluator) = &sheet.evaluator {
        canvas.line(BODY, Weight::Regular, &format!("Evaluated by: {evaluator}"));
    }
    canvas.gap(2.0);
    canvas.rule();

    canvas.row(
        BODY,
        Weight::Bold,
        &[(MARGIN_LEFT, "Criterion"), (150.0, "Rating")],
    );
    for criterion in Criterion::ordered() {
        let rating = evaluation
            .ratings
            .get(&criterion)
            .map_or_else(|| "-".to_string(), |value| format!("{value} / {MAX_RATING}"));
        canvas.row(
            BODY,
            Weight::Regular,
            &[(MARGIN_LEFT, criterion.label()), (150.0, rating.as_str())],
        );
    }

    let score = &evaluation.score;
    canvas.gap(2.0);
    canvas.rule();
    canvas.line(
        HEADING,
        Weight::Bold,
        &format!("Average: {:.2}   Percentage: {:.2}%", score.average, score.percentage),
    );
    canvas.line(
        HEADING,
        Weight::Bold,
        &format!("Rating: {}", score.rating_label),
    );

    if let Some(comments) = evaluation.comments.as_deref() {
        canvas.gap(3.0);
        canvas.line(BODY, Weight::Bold, "Comments");
        for line in wrap(comments, 95) {
            canvas.line(BODY, Weight::Regular, &line);
        }
    }
    canvas.finish()
}

const ROSTER_COLUMNS: [(f32, &str); 5] = [
    (MARGIN_LEFT, "Student No."),
    (50.0, "Name"),
    (108.0, "Section"),
    (132.0, "Status"),
    (154.0, "Company"),
];

pub fn roster_report(sheet: &RosterSheet) -> Result<Vec<u8>, ReportError> {
    let program = &sheet.program;
    let mut canvas = Canvas::new("Program Roster")?;
    canvas.line(TITLE, Weight::Bold, "Program Roster");
    canvas.line(
        HEADING,
        Weight::Regular,
        &format!("{} - {}", program.code, program.name),
    );
    canvas.line(SMALL, Weight::Regular, &format!("Generated {}", sheet.generated_on));
    canvas.gap(2.0);
    canvas.rule();

    if sheet.interns.is_empty() {
        canvas.line(BODY, Weight::Regular, "No interns enrolled in this program.");
    } else {
        canvas.row(SMALL, Weight::Bold, &ROSTER_COLUMNS);
    }
    for (intern, company) in &sheet.interns {
        let name = truncate(&intern.full_name(), 32);
        let section = truncate(&intern.section, 12);
        let company = truncate(company.as_deref().unwrap_or(""), 22);
        if canvas.ensure_room(line_height(SMALL)) {
            canvas.row(SMALL, Weight::Bold, &ROSTER_COLUMNS);
        }
        canvas.row(
            SMALL,
            Weight::Regular,
            &[
                (ROSTER_COLUMNS[0].0, intern.student_number.as_str()),
                (ROSTER_COLUMNS[1].0, name.as_str()),
                (ROSTER_COLUMNS[2].0, section.as_str()),
                (ROSTER_COLUMNS[3].0, intern.status.label()),
                (ROSTER_COLUMNS[4].0, company.as_str()),
            ],
        );
    }

    let counts = StatusCounts::tally(sheet.interns.iter().map(|(intern, _)| intern));
    canvas.ensure_room(12.0);
    canvas.gap(2.0);
    canvas.rule();
    canvas.line(
        BODY,
        Weight::Bold,
        &format!(
            "Total: {}   Pending: {}   Deployed: {}   Completed: {}   Dropped: {}",
            counts.total, counts.pending, counts.deployed, counts.completed, counts.dropped
        ),
    );
    canvas.finish()
}

fn program_line(intern: &Intern, program: Option<&Program>) -> String {
    let program = program.map_or_else(String::new, |program| {
        format!("{} - {}   ", program.code, program.name)
    });
    format!(
        "{program}Section: {}   S.Y. {}",
        intern.section, intern.school_year
    )
}

fn period_line(intern: &Intern) -> String {
    match (intern.start_date, intern.end_date) {
        (Some(start), Some(end)) => format!("Period: {start} to {end}"),
        (Some(start), None) => format!("Period: {start} onward"),
        _ => "Period: not yet started".to_string(),
    }
}
