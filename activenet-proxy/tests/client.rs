mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use activenet_proxy::api::{ActivitySearchPattern, FilterId};
use activenet_proxy::client::ActiveNetClient;
use activenet_proxy::error::ApiError;
use httpmock::prelude::*;
use serde_json::json;

use common::{activity, config, envelope, failure, meeting_dates};

fn client(server: &MockServer) -> ActiveNetClient {
    ActiveNetClient::new(Arc::new(config(server))).unwrap()
}

#[tokio::test]
async fn search_sends_pattern_and_page() {
    let server = MockServer::start_async().await;

    let list = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/activities/list")
                .query_param("locale", "en-US")
                .header("x-requested-with", "XMLHttpRequest")
                .header(
                    "page_info",
                    r#"{"order_by":"","page_number":2,"total_records_per_page":20}"#,
                )
                .json_body_partial(
                    r#"{"activity_search_pattern":{"activity_keyword":"swim","activity_select_param":2}}"#,
                );
            then.status(200).json_body(envelope(json!({
                "activity_items": [
                    activity(1, "Lap Swim", "2026-03-02"),
                    activity(2, "Water Polo", "2026-03-04")
                ]
            })));
        })
        .await;

    let pattern = ActivitySearchPattern {
        activity_keyword: "swim".into(),
        ..Default::default()
    };

    let (activities, page_info) = client(&server).search(&pattern, 2).await.unwrap();

    list.assert_async().await;
    assert_eq!(activities.len(), 2);
    assert_eq!(activities[0].id, 1);
    assert_eq!(activities[0].name, "Lap Swim");
    assert_eq!(
        activities[0].location.as_ref().map(|link| link.label.as_str()),
        Some("Swim Center")
    );
    assert_eq!(page_info.total_page, 3);
    assert_eq!(page_info.total_records, 45);
}

#[tokio::test]
async fn no_results_code_is_success() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/rest/activities/list");
            then.status(200).json_body(json!({
                "headers": { "response_code": "0001", "response_message": "No results" },
                "body": { "activity_items": [] }
            }));
        })
        .await;

    let (activities, page_info) = client(&server)
        .search(&ActivitySearchPattern::default(), 1)
        .await
        .unwrap();

    assert!(activities.is_empty());
    assert_eq!(page_info.total_page, 1);
}

#[tokio::test]
async fn upstream_error_code() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/activities/filters");
            then.status(200).json_body(failure("9999", "Service unavailable"));
        })
        .await;

    let err = client(&server).filters().await.unwrap_err();

    match err {
        ApiError::Upstream { code, message } => {
            assert_eq!(code, "9999");
            assert_eq!(message, "Service unavailable");
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}

#[tokio::test]
async fn http_and_decode_errors() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/activities/filters");
            then.status(503);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/activity/detail/5");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let client = client(&server);

    assert!(matches!(client.filters().await, Err(ApiError::Http(_))));
    assert!(matches!(client.activity_detail(5).await, Err(ApiError::Decode(_))));
}

#[tokio::test]
async fn filters() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/activities/filters");
            then.status(200).json_body(envelope(json!({
                "centers": [{ "id": 10, "name": "Memorial Park" }],
                "categories": [{ "id": "A", "desc": "Aquatics" }]
            })));
        })
        .await;

    let filters = client(&server).filters().await.unwrap();

    assert_eq!(filters.centers[0].id, FilterId::Number(10));
    assert_eq!(filters.centers[0].display_name(), "Memorial Park");
    assert_eq!(filters.categories[0].display_name(), "Aquatics");
    assert!(filters.instructors.is_empty());
}

#[tokio::test]
async fn meeting_dates_batch_tolerates_failures() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/activity/detail/meetingandregistrationdates/1");
            then.status(200).json_body(envelope(meeting_dates(1)));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/activity/detail/meetingandregistrationdates/2");
            then.status(500);
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/activity/detail/meetingandregistrationdates/3");
            then.status(200)
                .json_body(envelope(json!({ "meeting_and_registration_dates": {} })));
        })
        .await;

    let batch = client(&server).meeting_dates_batch(&[1, 2, 3]).await;

    assert_eq!(batch.len(), 1);
    let info = &batch[&1];
    assert_eq!(info.activity_patterns.len(), 1);
    assert_eq!(info.activity_patterns[0].weeks_of_month, "1, 3");
}

#[tokio::test]
async fn detail_price_and_button_status() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/activity/detail/7");
            then.status(200).json_body(envelope(json!({
                "detail": {
                    "activity_id": 7,
                    "activity_name": "Lap Swim",
                    "first_date": "2026-03-02",
                    "instructors": [{ "first_name": "Ada", "last_name": "Byron" }]
                }
            })));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/activity/detail/estimateprice/7");
            then.status(200).json_body(envelope(json!({
                "estimateprice": { "estimate_price": "$45.00", "free": false }
            })));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/activity/detail/buttonstatus/7");
            then.status(500);
        })
        .await;

    let client = client(&server);

    let detail = client.activity_detail(7).await.unwrap().unwrap();
    assert_eq!(detail.activity_name, "Lap Swim");
    assert_eq!(detail.instructors[0].first_name, "Ada");

    let price = client.activity_price(7).await.unwrap();
    assert_eq!(price.estimate_price, "$45.00");
    assert!(price.show_price_info_online);

    assert_eq!(client.button_status(7).await, None);
}

#[tokio::test]
async fn login_and_logout() {
    let server = MockServer::start_async().await;

    let signin = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/user/signin")
                .json_body(json!({ "login_name": "ada@example.org", "password": "hunter2" }));
            then.status(200).json_body(envelope(json!({
                "result": {
                    "access_token": "token-1",
                    "customer": { "name": "Ada Byron" }
                }
            })));
        })
        .await;

    let client = client(&server);
    assert!(!client.is_authenticated().await);

    client.login("ada@example.org", "hunter2").await.unwrap();

    signin.assert_async().await;
    assert!(client.is_authenticated().await);
    assert_eq!(client.customer_name().await.as_deref(), Some("Ada Byron"));

    client.logout().await;
    assert!(!client.is_authenticated().await);
    assert_eq!(client.customer_name().await, None);
}

#[tokio::test]
async fn login_without_token_fails() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(POST).path("/rest/user/signin");
            then.status(200)
                .json_body(envelope(json!({ "result": { "access_token": "" } })));
        })
        .await;

    let client = client(&server);
    let err = client.login("ada@example.org", "hunter2").await.unwrap_err();

    assert!(matches!(err, ApiError::MissingField("access_token")));
    assert!(!client.is_authenticated().await);
}

#[tokio::test]
async fn bootstrap_carries_cookie_and_csrf_token() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/signin");
            then.status(200)
                .header("set-cookie", "JSESSIONID=upstream-1; Path=/")
                .header("content-type", "text/html")
                .body(r#"<html><head><meta name="csrf-token" content="csrf-1"></head></html>"#);
        })
        .await;

    let list = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/rest/activities/list")
                .header("cookie", "JSESSIONID=upstream-1")
                .header("x-csrf-token", "csrf-1");
            then.status(200)
                .json_body(envelope(json!({ "activity_items": [] })));
        })
        .await;

    let client = client(&server);
    client.bootstrap().await.unwrap();
    client
        .search(&ActivitySearchPattern::default(), 1)
        .await
        .unwrap();

    list.assert_async().await;
}

#[tokio::test]
async fn configured_cookie_is_forwarded() {
    let server = MockServer::start_async().await;

    let filters = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/rest/activities/filters")
                .header("cookie", "JSESSIONID=configured");
            then.status(200).json_body(envelope(json!({})));
        })
        .await;

    let config = config(&server).with_session_cookie(Some("JSESSIONID=configured".into()));
    let client = ActiveNetClient::new(Arc::new(config)).unwrap();

    client.filters().await.unwrap();
    filters.assert_async().await;
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/rest/activities/filters");
            then.status(200)
                .delay(Duration::from_secs(3))
                .json_body(envelope(json!({})));
        })
        .await;

    let config = config(&server).with_timeout(Duration::from_millis(200));
    let client = ActiveNetClient::new(Arc::new(config)).unwrap();

    let started = Instant::now();
    let err = client.filters().await.unwrap_err();

    match err {
        ApiError::Http(err) => assert!(err.is_timeout()),
        other => panic!("expected a timeout, got {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(2));
}
