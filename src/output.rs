//! CLI output formatting.
//!
//! # Entity Display Contract
//!
//! Every listed entity follows the same two-level pattern:
//!
//! 1. **Header line**: positional index + identity (title, file name)
//! 2. **Context lines**: indented `Key: value` details
//!
//! # Output Format
//!
//! ## Vacancies
//!
//! ```text
//! 001 Python developer
//!     Employer: Acme
//!     Place: Москва
//!     Salary: 100 000 – 150 000 RUR
//!     Published: 2016-03-02 12:30 +03:00
//!     Link: https://hh.ru/vacancy/15880433
//!
//! 1 vacancy
//! ```
//!
//! ## Digest
//!
//! ```text
//! 001 [article] Writing a parser in Python
//!     Link: https://example.org/parser
//!     About: A walk through recursive descent…
//!
//! 1 entry
//! ```
//!
//! ## Warm
//!
//! ```text
//! 001 cover.jpg → /media/img/articles/thumbs/200x100/cover.jpg
//! 002 broken.jpg
//!     Error: Image backend error: Processing failed: ...
//!
//! Thumbnails: 1 generated (1 failed)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::cache::CacheStats;
use crate::integrations::digest::DigestEntry;
use crate::integrations::geo::LocationData;
use crate::integrations::hh::Vacancy;
use crate::text::{format_currency, truncate_chars};
use crate::thumbnail::WarmOutcome;
use std::path::Path;

// ============================================================================
// Shared entity display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn detail(key: &str, value: impl std::fmt::Display) -> String {
    format!("{}{}: {}", indent(1), key, value)
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{} {}", n, one)
    } else {
        format!("{} {}", n, many)
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Human-readable salary range.
///
/// ```text
/// 100 000 – 150 000 RUR
/// from 100 000 RUR
/// up to 150 000 RUR
/// not disclosed
/// ```
fn format_salary(from: Option<i64>, till: Option<i64>, currency: &str) -> String {
    let amount = |v: i64| format_currency(v as f64);
    let range = match (from, till) {
        (Some(f), Some(t)) => format!("{} \u{2013} {}", amount(f), amount(t)),
        (Some(f), None) => format!("from {}", amount(f)),
        (None, Some(t)) => format!("up to {}", amount(t)),
        (None, None) => return "not disclosed".to_string(),
    };
    if currency.is_empty() {
        range
    } else {
        format!("{} {}", range, currency)
    }
}

// ============================================================================
// Vacancies
// ============================================================================

pub fn format_vacancies(vacancies: &[Vacancy]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, v) in vacancies.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), v.title));
        lines.push(detail("Employer", &v.employer_name));
        lines.push(detail("Place", &v.src_place_name));
        lines.push(detail(
            "Salary",
            format_salary(v.salary_from, v.salary_till, &v.salary_currency),
        ));
        lines.push(detail(
            "Published",
            v.time_published.format("%Y-%m-%d %H:%M %:z"),
        ));
        lines.push(detail("Link", &v.url_site));
        if v.archived {
            lines.push(detail("Status", "archived"));
        }
    }
    if !vacancies.is_empty() {
        lines.push(String::new());
    }
    lines.push(plural(vacancies.len(), "vacancy", "vacancies"));
    lines
}

pub fn print_vacancies(vacancies: &[Vacancy]) {
    for line in format_vacancies(vacancies) {
        println!("{}", line);
    }
}

pub fn format_vacancy_status(url: &str, archived: Option<bool>) -> String {
    let status = match archived {
        Some(true) => "archived",
        Some(false) => "open",
        None => "unknown",
    };
    format!("{} \u{2192} {}", url, status)
}

// ============================================================================
// Geo
// ============================================================================

pub fn format_location(location: &LocationData) -> Vec<String> {
    vec![
        location.name.clone(),
        detail("Requested", &location.requested_name),
        detail("Kind", &location.kind),
        detail("Country", &location.country),
        detail("Position", &location.pos),
        detail("Bounds", &location.bounds),
    ]
}

pub fn print_location(location: &LocationData) {
    for line in format_location(location) {
        println!("{}", line);
    }
}

// ============================================================================
// Digest
// ============================================================================

/// Longest description shown for a digest entry.
const DIGEST_ABOUT_CHARS: usize = 100;

pub fn format_digest(entries: &[DigestEntry]) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        lines.push(format!(
            "{} [{}] {}",
            format_index(i + 1),
            entry.realm_name,
            entry.title
        ));
        lines.push(detail("Link", &entry.url));
        let about = entry.description.split_whitespace().collect::<Vec<_>>().join(" ");
        if !about.is_empty() {
            lines.push(detail("About", truncate_chars(&about, DIGEST_ABOUT_CHARS)));
        }
    }
    if !entries.is_empty() {
        lines.push(String::new());
    }
    lines.push(plural(entries.len(), "entry", "entries"));
    lines
}

pub fn print_digest(entries: &[DigestEntry]) {
    for line in format_digest(entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Thumbnails
// ============================================================================

/// Format the outcome of warming a batch of thumbnails.
pub fn format_warm_output(outcomes: &[WarmOutcome], stats: &CacheStats) -> Vec<String> {
    let mut lines = Vec::new();
    let mut failed = 0;
    for (i, outcome) in outcomes.iter().enumerate() {
        let header = format!("{} {}", format_index(i + 1), file_label(&outcome.source));
        match &outcome.result {
            Ok(Some(url)) => lines.push(format!("{} \u{2192} {}", header, url)),
            Ok(None) => lines.push(format!("{} (skipped)", header)),
            Err(e) => {
                failed += 1;
                lines.push(header);
                lines.push(detail("Error", e));
            }
        }
    }
    if !outcomes.is_empty() {
        lines.push(String::new());
    }
    if failed > 0 {
        lines.push(format!("Thumbnails: {} ({} failed)", stats, failed));
    } else {
        lines.push(format!("Thumbnails: {}", stats));
    }
    lines
}

pub fn print_warm_output(outcomes: &[WarmOutcome], stats: &CacheStats) {
    for line in format_warm_output(outcomes, stats) {
        println!("{}", line);
    }
}
