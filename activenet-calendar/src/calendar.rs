use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::recurrence::resolve_meeting_dates;
use crate::{Activity, MeetingInfo};

/// Pill colors, handed out by position in the activity list.
pub const PILL_COLORS: [&str; 20] = [
    "#1a5276", // navy
    "#117a65", // teal
    "#784212", // brown
    "#6c3483", // purple
    "#1a618f", // blue
    "#922b21", // red
    "#7d6608", // olive
    "#1e8449", // green
    "#d35400", // orange
    "#2e4053", // slate
    "#148f77", // cyan
    "#b03a2e", // crimson
    "#1f618d", // steel blue
    "#7b241c", // maroon
    "#196f3d", // forest
    "#a04000", // rust
    "#4a235a", // plum
    "#0e6655", // dark teal
    "#7e5109", // bronze
    "#2874a6", // cobalt
];

const DEFAULT_ACTION_LABEL: &str = "Enroll";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: i64,
    pub name: String,
    pub color: String,
    pub location: String,
    pub ages: String,
    pub total_open: Option<i64>,
    pub action_link_href: String,
    pub action_link_label: String,
    pub date_range_start: String,
    pub date_range_end: String,
    /// `HH:MM`, empty when the activity has no time slot.
    pub starting_time: String,
    pub ending_time: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarDay {
    /// Zero for padding cells outside the month.
    pub day: u32,
    pub in_month: bool,
    pub iso_date: String,
    pub is_today: bool,
    pub events: Vec<CalendarEvent>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    pub name: String,
    /// Monday-first rows of exactly seven days.
    pub weeks: Vec<Vec<CalendarDay>>,
}

impl CalendarDay {
    fn padding() -> Self {
        Self {
            day: 0,
            in_month: false,
            iso_date: String::new(),
            is_today: false,
            events: Vec::new(),
        }
    }

    /// The date of an in-month cell.
    pub fn date(&self) -> Option<NaiveDate> {
        self.in_month
            .then(|| NaiveDate::parse_from_str(&self.iso_date, "%Y-%m-%d").ok())
            .flatten()
    }
}

impl CalendarEvent {
    fn new(activity: &Activity, color: &str, time_slot: Option<&(String, String)>) -> Self {
        let (starting_time, ending_time) = time_slot
            .map(|(start, end)| (truncate(start, 5), truncate(end, 5)))
            .unwrap_or_default();

        Self {
            id: activity.id,
            name: activity.name.clone(),
            color: color.to_string(),
            location: activity
                .location
                .as_ref()
                .map(|location| location.label.clone())
                .unwrap_or_default(),
            ages: activity.ages.clone(),
            total_open: activity.total_open,
            action_link_href: activity
                .action_link
                .as_ref()
                .map(|link| link.href.clone())
                .unwrap_or_default(),
            action_link_label: activity
                .action_link
                .as_ref()
                .map_or_else(|| DEFAULT_ACTION_LABEL.to_string(), |link| link.label.clone()),
            date_range_start: activity.date_range_start.clone(),
            date_range_end: activity.date_range_end.clone(),
            starting_time,
            ending_time,
            number: activity.number.clone(),
        }
    }
}

fn truncate(s: &str, chars: usize) -> String {
    s.chars().take(chars).collect()
}

/// Distinct `(start, end)` time slots of the patterns, first seen first.
/// Pattern dates without a starting time are skipped.
pub fn time_slots(meeting_info: Option<&MeetingInfo>) -> Vec<(String, String)> {
    let mut slots: Vec<(String, String)> = Vec::new();

    let pattern_dates = meeting_info
        .into_iter()
        .flat_map(|info| &info.activity_patterns)
        .flat_map(|pattern| &pattern.pattern_dates)
        .filter(|pattern_date| !pattern_date.starting_time.is_empty());

    for pattern_date in pattern_dates {
        let slot = (
            pattern_date.starting_time.clone(),
            pattern_date.ending_time.clone(),
        );

        if !slots.contains(&slot) {
            slots.push(slot);
        }
    }

    slots
}

pub fn pill_color(index: usize) -> &'static str {
    PILL_COLORS[index % PILL_COLORS.len()]
}

/// First day of the month after the one `date` falls in.
pub fn next_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = match date.month() {
        12 => (date.year() + 1, 1),
        month => (date.year(), month + 1),
    };

    NaiveDate::from_ymd_opt(year, month, 1)
}

fn first_of_month(date: NaiveDate) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
}

fn days_in_month(first: NaiveDate) -> u32 {
    next_month(first)
        .and_then(|next| next.pred_opt())
        .map_or(31, |last| last.day())
}

/// Builds the month grids for `activities`, marking today's cell by the local
/// clock.
pub fn build_calendar(
    activities: &[Activity],
    meeting_info: &HashMap<i64, MeetingInfo>,
) -> Vec<CalendarMonth> {
    build_calendar_on(activities, meeting_info, Local::now().date_naive())
}

/// Same as [`build_calendar`] with an explicit `today`.
pub fn build_calendar_on(
    activities: &[Activity],
    meeting_info: &HashMap<i64, MeetingInfo>,
    today: NaiveDate,
) -> Vec<CalendarMonth> {
    if activities.is_empty() {
        return Vec::new();
    }

    let mut events_by_date: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();

    for (index, activity) in activities.iter().enumerate() {
        let info = meeting_info.get(&activity.id);
        let slots = time_slots(info);
        let event = CalendarEvent::new(activity, pill_color(index), slots.first());

        for date in resolve_meeting_dates(activity, info) {
            events_by_date.entry(date).or_default().push(event.clone());
        }
    }

    let (Some(earliest), Some(latest)) = (
        events_by_date.keys().next().copied(),
        events_by_date.keys().next_back().copied(),
    ) else {
        return Vec::new();
    };

    let (Some(mut current), Some(last)) = (first_of_month(earliest), first_of_month(latest))
    else {
        return Vec::new();
    };

    let mut months = Vec::new();

    while current <= last {
        months.push(build_month(current, &mut events_by_date, today));

        let Some(next) = next_month(current) else {
            break;
        };
        current = next;
    }

    months
}

fn build_month(
    first: NaiveDate,
    events_by_date: &mut BTreeMap<NaiveDate, Vec<CalendarEvent>>,
    today: NaiveDate,
) -> CalendarMonth {
    let leading = first.weekday().num_days_from_monday() as usize;

    let mut cells = Vec::with_capacity(42);
    cells.extend((0..leading).map(|_| CalendarDay::padding()));

    for date in first.iter_days().take(days_in_month(first) as usize) {
        cells.push(CalendarDay {
            day: date.day(),
            in_month: true,
            iso_date: date.format("%Y-%m-%d").to_string(),
            is_today: date == today,
            events: events_by_date.remove(&date).unwrap_or_default(),
        });
    }

    while cells.len() % 7 != 0 {
        cells.push(CalendarDay::padding());
    }

    let weeks = cells.chunks(7).map(<[CalendarDay]>::to_vec).collect();

    CalendarMonth {
        year: first.year(),
        month: first.month(),
        name: first.format("%B %Y").to_string(),
        weeks,
    }
}
