#![allow(dead_code)]

use activenet_proxy::client::ClientConfig;
use httpmock::MockServer;
use serde_json::{json, Value};

pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::new(server.url("/rest"))
}

pub fn envelope(body: Value) -> Value {
    json!({
        "headers": {
            "response_code": "0000",
            "response_message": "Successful",
            "page_info": {
                "order_by": "",
                "order_option": "ASC",
                "total_page": 3,
                "total_records_per_page": 20,
                "total_records": 45,
                "page_number": 1
            }
        },
        "body": body
    })
}

pub fn failure(code: &str, message: &str) -> Value {
    json!({
        "headers": { "response_code": code, "response_message": message },
        "body": {}
    })
}

pub fn activity(id: i64, name: &str, date_range_start: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "number": format!("{id}.101"),
        "date_range_start": date_range_start,
        "date_range_end": date_range_start,
        "location": { "label": "Swim Center" },
        "ages": "18 and up",
        "total_open": 4,
        "action_link": { "href": format!("/enroll/{id}"), "label": "Enroll Now" },
        "some_field_we_ignore": true
    })
}

/// Mondays in March 2026, first and third week only.
pub fn meeting_dates(activity_id: i64) -> Value {
    json!({
        "meeting_and_registration_dates": {
            "activity_id": activity_id,
            "no_meeting_dates": false,
            "activity_patterns": [{
                "beginning_date": "2026-03-01",
                "ending_date": "2026-03-31",
                "weeks_of_month": "1, 3",
                "exception_dates": [],
                "pattern_dates": [{
                    "weekdays": "Mon",
                    "starting_time": "09:00:00",
                    "ending_time": "10:30:00"
                }]
            }]
        }
    })
}
