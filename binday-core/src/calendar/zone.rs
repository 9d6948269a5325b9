//! `VTIMEZONE` components derived from the tz database.
//!
//! Each offset change inside the covered years becomes its own observance with an explicit
//! `DTSTART`, so no recurrence rules have to be reconstructed.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone};
use chrono_tz::{OffsetComponents, Tz};

const LINE_END: &str = "\r\n";

/// UTC offset in seconds and whether daylight saving is in effect.
type ZoneState = (i32, bool);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observance {
    /// UTC instant the observance starts.
    onset: NaiveDateTime,
    offset_from: i32,
    offset_to: i32,
    daylight: bool,
}

/// Render a `VTIMEZONE` for `tz` covering 1 January `first_year` to 31 December `last_year`.
pub(super) fn vtimezone(tz: Tz, first_year: i32, last_year: i32) -> String {
    let mut lines = vec!["BEGIN:VTIMEZONE".to_owned(), format!("TZID:{}", tz.name())];

    for observance in observances(tz, first_year, last_year) {
        let kind = if observance.daylight { "DAYLIGHT" } else { "STANDARD" };
        // DTSTART is local time under the offset in force before the change
        let local_start = observance.onset + TimeDelta::seconds(i64::from(observance.offset_from));

        lines.push(format!("BEGIN:{kind}"));
        lines.push(format!("DTSTART:{}", local_start.format("%Y%m%dT%H%M%S")));
        lines.push(format!("TZOFFSETFROM:{}", format_offset(observance.offset_from)));
        lines.push(format!("TZOFFSETTO:{}", format_offset(observance.offset_to)));
        lines.push(format!("END:{kind}"));
    }

    lines.push("END:VTIMEZONE".to_owned());

    let mut block = lines.join(LINE_END);
    block.push_str(LINE_END);
    block
}

fn zone_state(tz: Tz, utc: &NaiveDateTime) -> ZoneState {
    let offset = tz.offset_from_utc_datetime(utc);
    (
        offset.fix().local_minus_utc(),
        offset.dst_offset() != TimeDelta::zero(),
    )
}

fn observances(tz: Tz, first_year: i32, last_year: i32) -> Vec<Observance> {
    let (Some(start), Some(end)) = (
        NaiveDate::from_ymd_opt(first_year, 1, 1),
        NaiveDate::from_ymd_opt(last_year.saturating_add(1), 1, 1),
    ) else {
        return Vec::new();
    };
    let mut instant = start.and_time(NaiveTime::MIN);
    let end = end.and_time(NaiveTime::MIN);

    let mut state = zone_state(tz, &instant);
    let mut found = vec![Observance {
        onset: instant,
        offset_from: state.0,
        offset_to: state.0,
        daylight: state.1,
    }];

    while instant < end {
        let next = instant + TimeDelta::days(1);
        let next_state = zone_state(tz, &next);
        if next_state != state {
            found.push(Observance {
                onset: find_change(tz, instant, next, state),
                offset_from: state.0,
                offset_to: next_state.0,
                daylight: next_state.1,
            });
            state = next_state;
        }
        instant = next;
    }

    found
}

/// First whole second in `(before, after]` whose zone state differs from `old`.
fn find_change(tz: Tz, before: NaiveDateTime, after: NaiveDateTime, old: ZoneState) -> NaiveDateTime {
    let mut low = before;
    let mut high = after;
    loop {
        let span = (high - low).num_seconds();
        if span <= 1 {
            return high;
        }
        let mid = low + TimeDelta::seconds(span / 2);
        if zone_state(tz, &mid) == old {
            low = mid;
        } else {
            high = mid;
        }
    }
}

fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let total = seconds.unsigned_abs();
    let (hours, minutes, rest) = (total / 3600, total / 60 % 60, total % 60);
    if rest == 0 {
        format!("{sign}{hours:02}{minutes:02}")
    } else {
        format!("{sign}{hours:02}{minutes:02}{rest:02}")
    }
}
