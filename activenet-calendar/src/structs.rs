use serde::{de::IgnoredAny, Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionLink {
    pub href: String,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: i64,
    pub unit: String,
}

/// One row of an upstream activity search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub date_range_start: String,
    #[serde(default)]
    pub date_range_end: String,
    #[serde(default)]
    pub location: Option<ActionLink>,
    #[serde(default)]
    pub ages: String,
    #[serde(default)]
    pub total_open: Option<i64>,
    #[serde(default)]
    pub already_enrolled: Option<i64>,
    #[serde(default)]
    pub fee: Option<ActionLink>,
    #[serde(default)]
    pub action_link: Option<ActionLink>,
    #[serde(default)]
    pub detail_url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternDate {
    /// Comma separated, e.g. `"Mon, Wed"`.
    pub weekdays: String,
    pub starting_time: String,
    pub ending_time: String,
}

/// Upstream sends exception dates either as bare strings or as objects
/// carrying a `date` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExceptionDate {
    Plain(String),
    Record {
        #[serde(default)]
        date: String,
    },
    /// Anything else. Resolves to no date and serializes as `null`.
    #[serde(serialize_with = "serialize_unknown")]
    Other(IgnoredAny),
}

fn serialize_unknown<S: Serializer>(_: &IgnoredAny, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_none()
}

impl ExceptionDate {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ExceptionDate::Plain(date) | ExceptionDate::Record { date } => Some(date),
            ExceptionDate::Other(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityPattern {
    pub beginning_date: String,
    pub ending_date: String,
    /// Comma separated ordinals, e.g. `"1, 3"` for the first and third
    /// occurrence of each weekday in a month.
    pub weeks_of_month: String,
    pub exception_dates: Vec<ExceptionDate>,
    pub pattern_dates: Vec<PatternDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrollmentDatetimes {
    pub first_daytime_internet: Option<String>,
    pub first_daytime_internet_nonresidents: Option<String>,
    pub first_daytime_internet_members: Option<String>,
    pub last_daytime_internet: Option<String>,
    pub for_drop_in_activity: bool,
}

/// Meeting and registration dates of a single activity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingInfo {
    pub activity_id: i64,
    #[serde(default)]
    pub no_meeting_dates: bool,
    #[serde(default)]
    pub activity_patterns: Vec<ActivityPattern>,
    #[serde(default)]
    pub priority_enrollment_datetimes: Option<EnrollmentDatetimes>,
}
