//! iCalendar rendering for bin collections.

mod zone;

use std::fs;
use std::io;
use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};

use crate::model::BinCollection;

/// Domain part of generated event UIDs.
const UID_DOMAIN: &str = "binday";

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

#[derive(Debug, Clone)]
/// How collections are turned into calendar events.
pub struct CalendarOptions {
    /// Calendar display name (`X-WR-CALNAME`).
    pub name: String,
    /// Local time each event starts at.
    pub start_time: NaiveTime,
    /// Length of each event.
    pub duration: TimeDelta,
    /// Zone the start time is expressed in; `None` writes floating times.
    pub timezone: Option<Tz>,
    /// Text placed before the bin label in the event summary.
    pub summary_prefix: String,
}

impl Default for CalendarOptions {
    fn default() -> Self {
        Self {
            name: "Bin collections".to_owned(),
            start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            duration: TimeDelta::hours(1),
            timezone: Some(Tz::Europe__London),
            summary_prefix: "\u{267b}\u{fe0f} ".to_owned(),
        }
    }
}

/// Build a calendar with one timed event per collection.
///
/// `stamp` becomes every event's `DTSTAMP`; everything else depends only on the input.
/// The result carries no `VTIMEZONE`; [`render_calendar`] adds it.
#[must_use]
pub fn build_calendar(
    collections: &[BinCollection],
    options: &CalendarOptions,
    stamp: DateTime<Utc>,
) -> Calendar {
    let mut calendar = Calendar::new();
    calendar.name(&options.name);
    if let Some(tz) = options.timezone {
        calendar.timezone(tz.name());
    }

    for collection in collections {
        calendar.push(collection_event(collection, options, stamp));
    }

    calendar
}

/// Serialize collections straight to iCalendar text.
///
/// With a time zone set, a `VTIMEZONE` covering every year the events touch is placed
/// ahead of the first event.
#[must_use]
pub fn render_calendar(
    collections: &[BinCollection],
    options: &CalendarOptions,
    stamp: DateTime<Utc>,
) -> String {
    let ics = build_calendar(collections, options, stamp).to_string();

    let (Some(tz), Some((first_year, last_year))) =
        (options.timezone, year_span(collections, options))
    else {
        return ics;
    };
    let Some(position) = ics.find("BEGIN:VEVENT") else {
        return ics;
    };

    let (head, tail) = ics.split_at(position);
    format!("{head}{}{tail}", zone::vtimezone(tz, first_year, last_year))
}

/// Write rendered calendar text to `path`, replacing any previous file.
///
/// # Errors
///
/// Returns the underlying I/O error when the file cannot be written.
pub fn write_calendar<P: AsRef<Path>>(path: P, contents: &str) -> io::Result<()> {
    fs::write(path, contents)
}

/// Stable UID for a collection so re-exports update rather than duplicate events.
///
/// A readable slug of the label is followed by a hash of the raw label, so labels that
/// only differ in case or punctuation still get distinct UIDs.
#[must_use]
pub fn event_uid(collection: &BinCollection) -> String {
    format!(
        "{}-{}-{:016x}@{UID_DOMAIN}",
        collection.date.format("%Y%m%d"),
        slugify(&collection.label),
        fnv1a(collection.label.as_bytes())
    )
}

fn collection_event(
    collection: &BinCollection,
    options: &CalendarOptions,
    stamp: DateTime<Utc>,
) -> Event {
    let start = collection.date.and_time(options.start_time);
    let end = start + options.duration;

    Event::new()
        .uid(&event_uid(collection))
        .timestamp(stamp)
        .summary(&format!("{}{}", options.summary_prefix, collection.label))
        .description(&format!("Put out the {} today.", collection.label))
        .starts(event_time(start, options.timezone))
        .ends(event_time(end, options.timezone))
        .done()
}

fn event_time(date_time: NaiveDateTime, tz: Option<Tz>) -> CalendarDateTime {
    match tz {
        Some(tz) => CalendarDateTime::WithTimezone {
            date_time,
            tzid: tz.name().to_owned(),
        },
        None => CalendarDateTime::Floating(date_time),
    }
}

/// First and last calendar year touched by any event, end times included.
fn year_span(collections: &[BinCollection], options: &CalendarOptions) -> Option<(i32, i32)> {
    let first = collections.iter().map(|collection| collection.date.year()).min()?;
    let last = collections
        .iter()
        .map(|collection| (collection.date.and_time(options.start_time) + options.duration).year())
        .max()?;
    Some((first, last))
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

fn slugify(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("bin");
    }
    slug
}
