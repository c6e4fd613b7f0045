use std::collections::{BTreeSet, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};

use crate::{Activity, ActivityPattern, MeetingInfo};

const WEEKDAY_ABBREVIATIONS: [(&str, Weekday); 7] = [
    ("mon", Weekday::Mon),
    ("tue", Weekday::Tue),
    ("wed", Weekday::Wed),
    ("thu", Weekday::Thu),
    ("fri", Weekday::Fri),
    ("sat", Weekday::Sat),
    ("sun", Weekday::Sun),
];

/// Parses the leading `YYYY-MM-DD` of `s`. Anything after the tenth character
/// (a time component, usually) is ignored.
pub fn parse_iso(s: &str) -> Option<NaiveDate> {
    let head = match s.char_indices().nth(10) {
        Some((idx, _)) => &s[..idx],
        None => s,
    };

    let well_formed = head.len() == 10
        && head.bytes().enumerate().all(|(idx, byte)| match idx {
            4 | 7 => byte == b'-',
            _ => byte.is_ascii_digit(),
        });

    if !well_formed {
        return None;
    }

    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Parses a list like `"Mon, Wed, Fri"` by the first three letters of each
/// segment. Unknown segments are skipped.
pub fn parse_weekdays(s: &str) -> Vec<Weekday> {
    s.split(',')
        .filter_map(|part| {
            let key = part.trim().to_lowercase();
            let key = key.get(..3).unwrap_or(&key);
            WEEKDAY_ABBREVIATIONS
                .iter()
                .find(|(abbr, _)| *abbr == key)
                .map(|(_, weekday)| *weekday)
        })
        .collect()
}

/// Returns `None` when no segment is a plain non-negative integer, which
/// disables the filter entirely.
pub fn parse_weeks_of_month(s: &str) -> Option<BTreeSet<u32>> {
    let weeks = s
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|part| part.parse::<u32>().ok())
        .collect::<BTreeSet<_>>();

    (!weeks.is_empty()).then_some(weeks)
}

/// Which occurrence of its weekday `date` is within its month, 1-based.
pub fn week_of_month(date: NaiveDate) -> u32 {
    (date.day() - 1) / 7 + 1
}

/// Expands a pattern into every date on which it meets.
pub fn expand(pattern: &ActivityPattern) -> BTreeSet<NaiveDate> {
    let (Some(start), Some(end)) = (
        parse_iso(&pattern.beginning_date),
        parse_iso(&pattern.ending_date),
    ) else {
        return BTreeSet::new();
    };

    let exceptions = pattern
        .exception_dates
        .iter()
        .filter_map(|exception| exception.as_str().and_then(parse_iso))
        .collect::<HashSet<_>>();

    let weekdays = pattern
        .pattern_dates
        .iter()
        .flat_map(|pattern_date| parse_weekdays(&pattern_date.weekdays))
        .collect::<HashSet<_>>();

    if weekdays.is_empty() {
        return BTreeSet::new();
    }

    let weeks_of_month = parse_weeks_of_month(&pattern.weeks_of_month);

    start
        .iter_days()
        .take_while(|date| *date <= end)
        .filter(|date| weekdays.contains(&date.weekday()))
        .filter(|date| !exceptions.contains(date))
        .filter(|date| {
            weeks_of_month
                .as_ref()
                .map_or(true, |weeks| weeks.contains(&week_of_month(*date)))
        })
        .collect()
}

/// Every date `activity` meets on. Without usable patterns this is the
/// activity's own start date, or nothing if that does not parse either.
pub fn resolve_meeting_dates(
    activity: &Activity,
    meeting_info: Option<&MeetingInfo>,
) -> BTreeSet<NaiveDate> {
    let fallback = || -> BTreeSet<NaiveDate> {
        parse_iso(&activity.date_range_start).into_iter().collect()
    };

    let Some(meeting_info) = meeting_info.filter(|info| !info.no_meeting_dates) else {
        return fallback();
    };

    let dates = meeting_info
        .activity_patterns
        .iter()
        .flat_map(expand)
        .collect::<BTreeSet<_>>();

    if dates.is_empty() {
        return fallback();
    }

    dates
}
