use chrono::{Days, NaiveDate, NaiveTime, Utc};
use ics::{
    components::Parameter,
    escape_text,
    parameters::Value,
    properties::{Description, DtEnd, DtStart, Location, RRule, Summary, TzName},
    Daylight, ICalendar, Standard, TimeZone,
};

use crate::{CalendarEvent, CalendarMonth};

const TIMEZONE: &str = "America/Los_Angeles";

fn pacific_timezone<'a>() -> TimeZone<'a> {
    let mut pst_standard = Standard::new("19701101T020000", "-0700", "-0800");
    pst_standard.push(TzName::new("PST"));
    pst_standard.push(RRule::new("FREQ=YEARLY;BYMONTH=11;BYDAY=1SU"));

    let mut pdt_daylight = Daylight::new("19700308T020000", "-0800", "-0700");
    pdt_daylight.push(TzName::new("PDT"));
    pdt_daylight.push(RRule::new("FREQ=YEARLY;BYMONTH=3;BYDAY=2SU"));

    let mut timezone = TimeZone::daylight(TIMEZONE, pdt_daylight);
    timezone.add_standard(pst_standard);
    timezone
}

/// Renders every event of every in-month day of `months` as a VEVENT.
#[must_use]
pub fn to_ics<'a>(name: &'a str, months: &'a [CalendarMonth]) -> ICalendar<'a> {
    let mut icalendar = ICalendar::new("2.0", name);
    icalendar.add_timezone(pacific_timezone());

    let dtstamp = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();

    for day in months.iter().flat_map(|month| month.weeks.iter().flatten()) {
        let Some(date) = day.date() else {
            continue;
        };

        for event in &day.events {
            icalendar.add_event(event.to_ics(date, &dtstamp));
        }
    }

    icalendar
}

fn parse_time(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, "%H:%M").ok()
}

impl CalendarEvent {
    /// The occurrence of this event on `date`, stamped with the UTC time
    /// `dtstamp`. Events without a time slot become all-day events.
    #[must_use]
    pub fn to_ics(&self, date: NaiveDate, dtstamp: &str) -> ics::Event<'_> {
        let day = date.format("%Y%m%d").to_string();
        let id = format!("{}_{}", day, self.id);

        let mut ics_event = match parse_time(&self.starting_time) {
            Some(start_time) => {
                let end_time = parse_time(&self.ending_time).unwrap_or(start_time);
                let start = format!("{}T{}00", day, start_time.format("%H%M"));
                let end = format!("{}T{}00", day, end_time.format("%H%M"));

                let mut dtstart = DtStart::new(start);
                dtstart.add(Parameter::new("TZID", TIMEZONE));
                let mut dtend = DtEnd::new(end);
                dtend.add(Parameter::new("TZID", TIMEZONE));

                let mut ics_event = ics::Event::new(id, dtstamp.to_string());
                ics_event.push(dtstart);
                ics_event.push(dtend);
                ics_event
            }
            None => {
                let next_day = date
                    .checked_add_days(Days::new(1))
                    .unwrap_or(date)
                    .format("%Y%m%d")
                    .to_string();

                let mut dtstart = DtStart::new(day.clone());
                dtstart.add(Value::new("DATE"));
                let mut dtend = DtEnd::new(next_day);
                dtend.add(Value::new("DATE"));

                let mut ics_event = ics::Event::new(id, dtstamp.to_string());
                ics_event.push(dtstart);
                ics_event.push(dtend);
                ics_event
            }
        };

        ics_event.push(Summary::new(escape_text(self.name.as_str())));

        if !self.location.is_empty() {
            ics_event.push(Location::new(escape_text(self.location.as_str())));
        }

        let mut details = Vec::new();
        if !self.ages.is_empty() {
            details.push(format!("Ages: {}", self.ages));
        }
        if let Some(open) = self.total_open {
            details.push(format!("Open spots: {open}"));
        }
        if !self.action_link_href.is_empty() {
            details.push(format!("{}: {}", self.action_link_label, self.action_link_href));
        }
        if !details.is_empty() {
            ics_event.push(Description::new(escape_text(details.join("\n"))));
        }

        ics_event
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::{build_calendar_on, Activity, ActivityPattern, MeetingInfo, PatternDate};

    fn months(times: (&str, &str)) -> Vec<CalendarMonth> {
        let activities = vec![Activity {
            id: 42,
            name: "Adult Yoga, Level 1".into(),
            date_range_start: "2026-03-16".into(),
            date_range_end: "2026-03-18".into(),
            ages: "18+ years".into(),
            total_open: Some(12),
            ..Default::default()
        }];

        let info = HashMap::from([(
            42,
            MeetingInfo {
                activity_id: 42,
                activity_patterns: vec![ActivityPattern {
                    beginning_date: "2026-03-16".into(),
                    ending_date: "2026-03-18".into(),
                    pattern_dates: vec![PatternDate {
                        weekdays: "Mon, Wed".into(),
                        starting_time: times.0.into(),
                        ending_time: times.1.into(),
                    }],
                    ..Default::default()
                }],
                ..Default::default()
            },
        )]);

        build_calendar_on(
            &activities,
            &info,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
    }

    #[test]
    fn timed_events() {
        let months = months(("18:30:00", "19:45:00"));
        let ics = to_ics("Activities", &months).to_string();

        assert!(ics.contains("BEGIN:VTIMEZONE"));
        assert!(ics.contains("TZID:America/Los_Angeles"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert!(ics.contains("DTSTART;TZID=America/Los_Angeles:20260316T183000"));
        assert!(ics.contains("DTEND;TZID=America/Los_Angeles:20260316T194500"));
        assert!(ics.contains("DTSTART;TZID=America/Los_Angeles:20260318T183000"));
        assert!(ics.contains("UID:20260316_42"));
        assert!(ics.contains("SUMMARY:Adult Yoga\\, Level 1"));
    }

    #[test]
    fn all_day_events() {
        let months = months(("", ""));
        let ics = to_ics("Activities", &months).to_string();

        assert!(ics.contains("DTSTART;VALUE=DATE:20260316"));
        assert!(ics.contains("DTEND;VALUE=DATE:20260317"));
    }

    #[test]
    fn stamps_are_utc() {
        let months = months(("18:30:00", "19:45:00"));
        let ics = to_ics("Activities", &months).to_string();

        let stamps = ics
            .lines()
            .filter_map(|line| line.strip_prefix("DTSTAMP:"))
            .collect::<Vec<_>>();

        assert_eq!(stamps.len(), 2);
        for stamp in stamps {
            assert_eq!(stamp.len(), 16);
            assert!(stamp.ends_with('Z'));
            assert_eq!(&stamp[8..9], "T");
        }
    }

    #[test]
    fn no_events() {
        let ics = to_ics("Activities", &[]).to_string();
        assert!(ics.contains("BEGIN:VCALENDAR"));
        assert!(!ics.contains("BEGIN:VEVENT"));
    }
}
