//! Monthly task report rendered as a paginated PDF.

pub mod layout;
pub mod pdf;
pub mod status;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use taskbell_core::task::Task;
use thiserror::Error;

pub use status::ReportStatus;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to render report: {0}")]
    Render(String),
}

/// Attachment name for a month's report, e.g. `report_2025_09.pdf`.
pub fn report_filename(year: i32, month: u32) -> String {
    format!("report_{year}_{month:02}.pdf")
}

/// Render `tasks` (already filtered and ordered) as the report for `year`-`month`.
pub fn render_monthly_report(
    tasks: &[Task],
    year: i32,
    month: u32,
    now: DateTime<Utc>,
    zone: Tz,
) -> Result<Vec<u8>, ReportError> {
    let rows = layout::report_rows(tasks, now, zone);
    let title = layout::report_title(year, month);
    let pages = layout::paginate(&title, &rows);
    pdf::render_pages(&title, &pages)
}
