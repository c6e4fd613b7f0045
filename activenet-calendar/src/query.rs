use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Card,
    Calendar,
}

impl View {
    pub fn as_str(self) -> &'static str {
        match self {
            View::Card => "card",
            View::Calendar => "calendar",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownView(pub String);

impl fmt::Display for UnknownView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown view `{}`", self.0)
    }
}

impl std::error::Error for UnknownView {}

impl FromStr for View {
    type Err = UnknownView;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(View::Card),
            "calendar" => Ok(View::Calendar),
            other => Err(UnknownView(other.to_string())),
        }
    }
}

/// Browse filters that survive pagination.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    pub q: String,
    pub date_after: String,
    pub date_before: String,
    pub category_ids: Vec<i64>,
    pub center_ids: Vec<i64>,
    pub show_full_details: bool,
    pub view: View,
}

impl FilterParams {
    /// Reads filters and the page number from a raw `application/x-www-form-urlencoded`
    /// query. Unparsable ids are dropped, an unparsable or missing page is 1.
    pub fn from_query(query: &str) -> (Self, u32) {
        let mut params = FilterParams::default();
        let mut page = 1;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "q" => params.q = value.into_owned(),
                "date_after" => params.date_after = value.into_owned(),
                "date_before" => params.date_before = value.into_owned(),
                "category_ids" => params.category_ids.extend(value.trim().parse::<i64>().ok()),
                "center_ids" => params.center_ids.extend(value.trim().parse::<i64>().ok()),
                "show_full_details" => params.show_full_details = parse_flag(&value),
                "view" => params.view = value.parse().unwrap_or_default(),
                "page" => page = value.trim().parse::<u32>().ok().filter(|p| *p > 0).unwrap_or(1),
                _ => {}
            }
        }

        (params, page)
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "on" | "yes"
    )
}

/// Serializes `params` plus `page` into a query string, leaving out empty
/// filters and default values.
pub fn build_query_string(params: &FilterParams, page: u32) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());

    if !params.q.is_empty() {
        serializer.append_pair("q", &params.q);
    }
    if !params.date_after.is_empty() {
        serializer.append_pair("date_after", &params.date_after);
    }
    if !params.date_before.is_empty() {
        serializer.append_pair("date_before", &params.date_before);
    }
    for id in &params.category_ids {
        serializer.append_pair("category_ids", &id.to_string());
    }
    for id in &params.center_ids {
        serializer.append_pair("center_ids", &id.to_string());
    }
    if params.show_full_details {
        serializer.append_pair("show_full_details", "true");
    }
    if params.view != View::default() {
        serializer.append_pair("view", params.view.as_str());
    }

    serializer.append_pair("page", &page.to_string());
    serializer.finish()
}
