use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};

use crate::models::{EarningsEvent, EarningsGroup, EarningsTiming};

const UNKNOWN_DAY: &str = "Unknown Date";

/// Bucket upcoming earnings by day and timing slot for the calendar card.
///
/// Groups are keyed by their display label ("Today - Pre-Market",
/// "Thursday - After Close", ...). They come back ordered by the earliest
/// event date in each group, then by timing priority. Events keep their input
/// order inside a group. Dates that fail to parse land in a trailing
/// "Unknown Date - Unknown Time" bucket instead of failing the whole call.
pub fn group(events: &[EarningsEvent], today: NaiveDate) -> Vec<EarningsGroup> {
    let tomorrow = today.succ_opt();
    let mut groups: Vec<EarningsGroup> = Vec::new();
    let mut by_label: HashMap<String, usize> = HashMap::new();

    for ev in events {
        let date = ev.calendar_date();
        let timing = if date.is_some() {
            ev.timing
        } else {
            EarningsTiming::Unknown
        };
        let label = format!("{} - {}", day_label(date, today, tomorrow), timing.phrase());

        match by_label.get(&label) {
            Some(&idx) => {
                let existing = &mut groups[idx];
                existing.sort_date = earliest(existing.sort_date, date);
                existing.events.push(ev.clone());
            }
            None => {
                by_label.insert(label.clone(), groups.len());
                groups.push(EarningsGroup {
                    label,
                    sort_date: date,
                    sort_priority: timing.priority(),
                    timing,
                    events: vec![ev.clone()],
                });
            }
        }
    }

    groups.sort_by(|a, b| {
        cmp_dates(a.sort_date, b.sort_date)
            .then(a.sort_priority.cmp(&b.sort_priority))
            .then_with(|| a.label.cmp(&b.label))
    });

    groups
}

fn day_label(date: Option<NaiveDate>, today: NaiveDate, tomorrow: Option<NaiveDate>) -> &'static str {
    match date {
        None => UNKNOWN_DAY,
        Some(d) if d == today => "Today",
        Some(d) if Some(d) == tomorrow => "Tomorrow",
        Some(d) => weekday_name(d.weekday()),
    }
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn earliest(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Option<NaiveDate> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

// Undated groups sort last.
fn cmp_dates(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
