//! Page layout for the monthly report, in PDF points on US Letter.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use taskbell_core::task::Task;
use taskbell_core::time::{format_local, format_utc_date};

use crate::status::ReportStatus;

pub const PAGE_WIDTH_PT: f32 = 612.0;
pub const PAGE_HEIGHT_PT: f32 = 792.0;

const LEFT_MARGIN: f32 = 40.0;
const TITLE_SIZE: f32 = 16.0;
const BODY_SIZE: f32 = 10.0;
const ROW_STEP: f32 = 14.0;
/// Rows are never placed below this baseline.
const BOTTOM_LIMIT: f32 = 60.0;
/// Longest row, in characters.
pub const MAX_ROW_CHARS: usize = 110;

pub const COLUMN_HEADER: &str = "ID | Title | Status | Due (local time) | Created (UTC)";

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedText {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub bold: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedText>,
}

pub fn report_title(year: i32, month: u32) -> String {
    format!("Task report - {year}-{month:02}")
}

/// One display row per task, in the given order.
pub fn report_rows(tasks: &[Task], now: DateTime<Utc>, zone: Tz) -> Vec<String> {
    tasks
        .iter()
        .map(|t| {
            let row = format!(
                "{} | {} | {} | {} | {}",
                t.id,
                t.title,
                ReportStatus::derive(t, now),
                format_local(t.due, zone),
                format_utc_date(t.created_at),
            );
            truncate_chars(&row, MAX_ROW_CHARS)
        })
        .collect()
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Place the title, column header and rows, breaking pages when the bottom is reached.
///
/// The first page carries the title and header; continuation pages start
/// their rows at the top margin.
pub fn paginate(title: &str, rows: &[String]) -> Vec<Page> {
    let top = PAGE_HEIGHT_PT - 40.0;
    let mut pages = Vec::new();
    let mut page = Page::default();
    page.lines.push(PlacedText {
        text: title.to_string(),
        x: LEFT_MARGIN,
        y: top,
        size: TITLE_SIZE,
        bold: true,
    });
    page.lines.push(PlacedText {
        text: COLUMN_HEADER.to_string(),
        x: LEFT_MARGIN,
        y: PAGE_HEIGHT_PT - 70.0,
        size: BODY_SIZE,
        bold: false,
    });

    let mut y = PAGE_HEIGHT_PT - 70.0 - 18.0;
    for row in rows {
        if y < BOTTOM_LIMIT {
            pages.push(std::mem::take(&mut page));
            y = top;
        }
        page.lines.push(PlacedText {
            text: row.clone(),
            x: LEFT_MARGIN,
            y,
            size: BODY_SIZE,
            bold: false,
        });
        y -= ROW_STEP;
    }
    pages.push(page);
    pages
}
