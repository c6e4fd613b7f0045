//! Request and response bodies of the upstream ActiveNet REST API.

use std::fmt;

use activenet_calendar::{ActionLink, FilterParams};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Response codes the upstream uses for success. `0001` means "no results".
pub const SUCCESS_CODES: [&str; 2] = ["0000", "0001"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageInfo {
    pub order_by: String,
    pub order_option: String,
    pub total_page: u32,
    pub total_records_per_page: u32,
    pub total_records: u32,
    pub page_number: u32,
}

impl Default for PageInfo {
    fn default() -> Self {
        Self {
            order_by: String::new(),
            order_option: "ASC".into(),
            total_page: 1,
            total_records_per_page: 20,
            total_records: 0,
            page_number: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResponseHeaders {
    pub response_code: String,
    pub response_message: String,
    pub page_info: PageInfo,
}

impl Default for ResponseHeaders {
    fn default() -> Self {
        Self {
            response_code: SUCCESS_CODES[0].into(),
            response_message: String::new(),
            page_info: PageInfo::default(),
        }
    }
}

impl ResponseHeaders {
    pub fn is_success(&self) -> bool {
        SUCCESS_CODES.contains(&self.response_code.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Envelope {
    pub headers: ResponseHeaders,
    pub body: Value,
}

/// Pagination as sent in the `page_info` request header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub order_by: String,
    pub page_number: u32,
    pub total_records_per_page: u32,
}

impl PageRequest {
    pub fn page(page_number: u32) -> Self {
        Self {
            order_by: String::new(),
            page_number,
            total_records_per_page: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterId {
    Number(i64),
    Text(String),
}

impl fmt::Display for FilterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterId::Number(id) => write!(f, "{id}"),
            FilterId::Text(id) => f.write_str(id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOption {
    pub id: FilterId,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub name: String,
}

impl FilterOption {
    pub fn display_name(&self) -> String {
        if !self.desc.is_empty() {
            return self.desc.clone();
        }
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.id.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActivityFilterOptions {
    pub instructors: Vec<FilterOption>,
    pub centers: Vec<FilterOption>,
    pub seasons: Vec<FilterOption>,
    pub categories: Vec<FilterOption>,
    pub activity_types: Vec<FilterOption>,
    pub sites: Vec<FilterOption>,
    pub geographic_areas: Vec<FilterOption>,
    pub skills: Vec<FilterOption>,
}

/// Body of `POST /activities/list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActivitySearchPattern {
    pub activity_select_param: i64,
    pub activity_keyword: String,
    pub center_ids: Vec<i64>,
    pub activity_category_ids: Vec<i64>,
    pub activity_type_ids: Vec<i64>,
    pub season_ids: Vec<i64>,
    pub instructor_ids: Vec<i64>,
    pub site_ids: Vec<i64>,
    pub geographic_area_ids: Vec<i64>,
    pub activity_department_ids: Vec<i64>,
    pub activity_other_category_ids: Vec<i64>,
    pub child_season_ids: Vec<i64>,
    pub skills: Vec<Value>,
    pub days_of_week: Option<Vec<i64>>,
    pub time_after_str: String,
    pub time_before_str: String,
    pub date_after: String,
    pub date_before: String,
    pub min_age: Option<i64>,
    pub max_age: Option<i64>,
    pub open_spots: Option<i64>,
    pub activity_id: Option<i64>,
    pub for_map: bool,
    pub custom_price_from: String,
    pub custom_price_to: String,
}

impl Default for ActivitySearchPattern {
    fn default() -> Self {
        Self {
            activity_select_param: 2,
            activity_keyword: String::new(),
            center_ids: Vec::new(),
            activity_category_ids: Vec::new(),
            activity_type_ids: Vec::new(),
            season_ids: Vec::new(),
            instructor_ids: Vec::new(),
            site_ids: Vec::new(),
            geographic_area_ids: Vec::new(),
            activity_department_ids: Vec::new(),
            activity_other_category_ids: Vec::new(),
            child_season_ids: Vec::new(),
            skills: Vec::new(),
            days_of_week: None,
            time_after_str: String::new(),
            time_before_str: String::new(),
            date_after: String::new(),
            date_before: String::new(),
            min_age: None,
            max_age: None,
            open_spots: None,
            activity_id: None,
            for_map: false,
            custom_price_from: String::new(),
            custom_price_to: String::new(),
        }
    }
}

impl From<&FilterParams> for ActivitySearchPattern {
    fn from(params: &FilterParams) -> Self {
        Self {
            activity_keyword: params.q.clone(),
            date_after: params.date_after.clone(),
            date_before: params.date_before.clone(),
            activity_category_ids: params.category_ids.clone(),
            center_ids: params.center_ids.clone(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivitySearchRequest {
    pub activity_search_pattern: ActivitySearchPattern,
    pub activity_transfer_pattern: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Instructor {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub is_primary_instructor: bool,
    pub email: String,
    pub bio: String,
    pub notes: String,
    pub avatar: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDetail {
    pub activity_id: i64,
    #[serde(default)]
    pub activity_name: String,
    #[serde(default)]
    pub activity_number: String,
    #[serde(default)]
    pub activity_type: String,
    #[serde(default)]
    pub season_name: String,
    #[serde(default)]
    pub term_name: Option<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub sub_category: String,
    #[serde(default)]
    pub first_date: String,
    #[serde(default)]
    pub last_date: String,
    #[serde(default)]
    pub facilities: Vec<Value>,
    #[serde(default)]
    pub instructors: Vec<Instructor>,
    #[serde(default)]
    pub online_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceDetail {
    pub price: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PriceInfo {
    pub list_name: String,
    pub activity_name: String,
    pub details: Vec<PriceDetail>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatedPrice {
    pub show_price_info_online: bool,
    pub estimate_price: String,
    pub prices: Vec<PriceInfo>,
    pub free: bool,
    pub simple_fee: bool,
    pub is_package: bool,
}

impl Default for EstimatedPrice {
    fn default() -> Self {
        Self {
            show_price_info_online: true,
            estimate_price: String::new(),
            prices: Vec::new(),
            free: false,
            simple_fee: false,
            is_package: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ButtonStatus {
    pub activity_online_start_time: String,
    pub action_link: Option<ActionLink>,
    pub time_remaining: i64,
    pub notification: String,
}

/// Body of `POST /user/signin`. Sent once, never stored.
#[derive(Serialize)]
pub struct SignInRequest<'a> {
    pub login_name: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Customer {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignInResult {
    pub access_token: String,
    pub customer: Option<Customer>,
}
