//! Text scanning that turns a rendered results page into bin collections.
//!
//! Council result pages list each bin on its own line followed (or preceded on the same
//! line) by a long-form date such as `Tuesday 14 October 2025`. The scan keeps track of
//! the most recent bin heading and pairs every date it finds with it.

use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

use crate::model::BinCollection;

/// `strftime` layout of the dates printed on the results page.
pub const DATE_FORMAT: &str = "%A %d %B %Y";

/// Label used for dates that appear before any bin heading.
pub const UNKNOWN_LABEL: &str = "Unknown Bin";

/// Words marking a line as a bin heading.
const LABEL_MARKERS: [&str; 2] = ["Bin", "Container"];

static RE_LONG_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\w+ \d{1,2} \w+ \d{4})").expect("invalid regex: long date")
});

/// Find the first `<Weekday> <day> <Month> <year>` date in `line`.
///
/// Returns `None` when nothing date-shaped is present or the match is not a real date
/// (unknown month name, weekday that does not agree with the day).
#[must_use]
pub fn parse_line_date(line: &str) -> Option<NaiveDate> {
    let raw = RE_LONG_DATE.captures(line)?.get(1)?.as_str();

    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            log::warn!("Skipping date '{raw}': {err}");
            None
        }
    }
}

/// Whether `line` names a bin rather than carrying only a date.
#[must_use]
pub fn is_label_line(line: &str) -> bool {
    LABEL_MARKERS.iter().any(|marker| line.contains(marker))
}

/// Scan page text line by line and collect every (label, date) pair, deduplicated.
#[must_use]
pub fn extract_collections(text: &str) -> Vec<BinCollection> {
    let mut current_label = UNKNOWN_LABEL;
    let mut found = Vec::new();

    for line in text.lines() {
        if is_label_line(line) {
            current_label = line.trim();
        }

        if let Some(date) = parse_line_date(line) {
            log::info!("Found: {current_label} on {date}");
            found.push(BinCollection::new(current_label, date));
        }
    }

    dedup_collections(found)
}

/// Drop repeated (label, date) pairs, keeping the first occurrence of each.
///
/// Labels are compared as raw strings, so `Grey Bin` and `Grey bin` stay distinct.
#[must_use]
pub fn dedup_collections(collections: Vec<BinCollection>) -> Vec<BinCollection> {
    let mut seen = HashSet::with_capacity(collections.len());

    collections
        .into_iter()
        .filter(|collection| seen.insert((collection.label.clone(), collection.date)))
        .collect()
}
