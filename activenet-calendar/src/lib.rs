mod calendar;
mod query;
mod recurrence;
mod structs;

#[cfg(feature = "ics")]
mod ics;

pub use calendar::{
    build_calendar, build_calendar_on, next_month, pill_color, time_slots, CalendarDay,
    CalendarEvent, CalendarMonth, PILL_COLORS,
};
pub use query::{build_query_string, FilterParams, UnknownView, View};
pub use recurrence::{
    expand, parse_iso, parse_weekdays, parse_weeks_of_month, resolve_meeting_dates,
    week_of_month,
};
pub use structs::{
    ActionLink, Activity, ActivityPattern, EnrollmentDatetimes, ExceptionDate, MeetingInfo,
    PatternDate,
};

#[cfg(feature = "ics")]
pub use crate::ics::to_ics;
