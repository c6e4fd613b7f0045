use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use activenet_calendar::{Activity, MeetingInfo};
use futures::future;
use once_cell::sync::Lazy;
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE, COOKIE, ORIGIN, REFERER},
    Method, RequestBuilder,
};
use scraper::{Html, Selector};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::{
    ActivityDetail, ActivityFilterOptions, ActivitySearchPattern, ActivitySearchRequest,
    ButtonStatus, Envelope, EstimatedPrice, PageInfo, PageRequest, ResponseHeaders,
    SignInRequest, SignInResult,
};
use crate::error::{ApiError, Result};

macro_rules! selector {
    ($query:expr) => {{
        static SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse($query).unwrap());
        &SELECTOR
    }};
}

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json;charset=utf-8";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and how to reach the upstream API. Shared by every session.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Raw `Cookie` header value sent instead of the per-session cookie store.
    pub session_cookie: Option<String>,
    pub csrf_token: Option<String>,
    /// Per-request limit, connecting included.
    pub timeout: Duration,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("session_cookie", &self.session_cookie.as_ref().map(|_| "<redacted>"))
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_cookie: None,
            csrf_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_session_cookie(mut self, session_cookie: Option<String>) -> Self {
        self.session_cookie = session_cookie;
        self
    }

    pub fn with_csrf_token(mut self, csrf_token: Option<String>) -> Self {
        self.csrf_token = csrf_token;
        self
    }

    /// The public site the REST API lives under.
    pub fn site_url(&self) -> &str {
        self.base_url
            .strip_suffix("/rest")
            .unwrap_or(&self.base_url)
    }

    fn referer(&self) -> String {
        format!(
            "{}/activity/search?onlineSiteId=0&activity_select_param=2&viewMode=list",
            self.site_url()
        )
    }

    fn signin_url(&self) -> String {
        format!("{}/signin?onlineSiteId=0", self.site_url())
    }
}

#[derive(Debug, Default, Clone)]
struct AuthState {
    csrf_token: Option<String>,
    access_token: Option<String>,
    customer_name: Option<String>,
}

/// Upstream client of a single visitor. Owns that visitor's cookie store and
/// sign-in state.
pub struct ActiveNetClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    auth: RwLock<AuthState>,
}

impl ActiveNetClient {
    pub fn new(config: Arc<ClientConfig>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            auth: RwLock::new(AuthState {
                csrf_token: config.csrf_token.clone(),
                ..Default::default()
            }),
            config,
        })
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth.read().await.access_token.is_some()
    }

    pub async fn customer_name(&self) -> Option<String> {
        self.auth.read().await.customer_name.clone()
    }

    /// Loads the upstream sign-in page, picking up its session cookies and
    /// CSRF token.
    pub async fn bootstrap(&self) -> Result<()> {
        let html = self
            .http
            .get(self.config.signin_url())
            .header(REFERER, self.config.referer())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        match extract_csrf_token(&html) {
            Some(token) => {
                debug!("picked up csrf token from sign-in page");
                self.auth.write().await.csrf_token = Some(token);
            }
            None => debug!("sign-in page carries no csrf token"),
        }

        Ok(())
    }

    /// Signs in upstream. The credentials are forwarded once and not kept.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let request = SignInRequest {
            login_name: username,
            password,
        };

        let (_, mut body) = self
            .send(self.post("/user/signin", &request, None).await)
            .await?;

        let result: SignInResult =
            take_field(&mut body, "result")?.ok_or(ApiError::MissingField("result"))?;

        if result.access_token.is_empty() {
            return Err(ApiError::MissingField("access_token"));
        }

        let mut auth = self.auth.write().await;
        auth.access_token = Some(result.access_token);
        auth.customer_name = result.customer.map(|customer| customer.name);

        info!("signed in upstream");
        Ok(())
    }

    pub async fn logout(&self) {
        let mut auth = self.auth.write().await;
        auth.access_token = None;
        auth.customer_name = None;
        auth.csrf_token = self.config.csrf_token.clone();
    }

    pub async fn filters(&self) -> Result<ActivityFilterOptions> {
        let (_, body) = self.send(self.get("/activities/filters")).await?;

        if body.is_null() {
            return Ok(ActivityFilterOptions::default());
        }

        Ok(serde_json::from_value(body)?)
    }

    pub async fn search(
        &self,
        pattern: &ActivitySearchPattern,
        page: u32,
    ) -> Result<(Vec<Activity>, PageInfo)> {
        let request = ActivitySearchRequest {
            activity_search_pattern: pattern.clone(),
            ..Default::default()
        };

        let (headers, mut body) = self
            .send(
                self.post("/activities/list", &request, Some(PageRequest::page(page)))
                    .await,
            )
            .await?;

        let activities = take_field(&mut body, "activity_items")?.unwrap_or_default();

        Ok((activities, headers.page_info))
    }

    /// Meeting dates of one activity. Any failure is logged and reads as
    /// "no meeting information".
    pub async fn meeting_dates(&self, activity_id: i64) -> Option<MeetingInfo> {
        let path = format!("/activity/detail/meetingandregistrationdates/{activity_id}");

        let meeting_info = self
            .detail_field::<Value>(&path, "meeting_and_registration_dates")
            .await
            .and_then(|value| match value {
                Some(Value::Object(map)) if map.is_empty() => Ok(None),
                Some(value) => Ok(Some(serde_json::from_value(value)?)),
                None => Ok(None),
            });

        match meeting_info {
            Ok(meeting_info) => meeting_info,
            Err(err) => {
                warn!(activity_id, error = %err, "failed to fetch meeting dates");
                None
            }
        }
    }

    /// Fetches meeting dates for every id concurrently. Ids whose fetch
    /// failed are absent from the result.
    pub async fn meeting_dates_batch(&self, activity_ids: &[i64]) -> HashMap<i64, MeetingInfo> {
        future::join_all(
            activity_ids
                .iter()
                .map(|&id| async move { (id, self.meeting_dates(id).await) }),
        )
        .await
        .into_iter()
        .filter_map(|(id, meeting_info)| meeting_info.map(|info| (id, info)))
        .collect()
    }

    pub async fn activity_detail(&self, activity_id: i64) -> Result<Option<ActivityDetail>> {
        self.detail_field(&format!("/activity/detail/{activity_id}"), "detail")
            .await
    }

    pub async fn activity_price(&self, activity_id: i64) -> Option<EstimatedPrice> {
        let path = format!("/activity/detail/estimateprice/{activity_id}");

        self.detail_field(&path, "estimateprice")
            .await
            .unwrap_or_else(|err| {
                warn!(activity_id, error = %err, "failed to fetch price");
                None
            })
    }

    pub async fn prices_batch(&self, activity_ids: &[i64]) -> HashMap<i64, EstimatedPrice> {
        future::join_all(
            activity_ids
                .iter()
                .map(|&id| async move { (id, self.activity_price(id).await) }),
        )
        .await
        .into_iter()
        .filter_map(|(id, price)| price.map(|price| (id, price)))
        .collect()
    }

    pub async fn button_status(&self, activity_id: i64) -> Option<ButtonStatus> {
        let path = format!("/activity/detail/buttonstatus/{activity_id}");

        self.detail_field(&path, "button_status")
            .await
            .unwrap_or_else(|err| {
                warn!(activity_id, error = %err, "failed to fetch button status");
                None
            })
    }

    async fn detail_field<T: DeserializeOwned>(&self, path: &str, key: &str) -> Result<Option<T>> {
        let (_, mut body) = self.send(self.get(path)).await?;
        take_field(&mut body, key)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.config.base_url, path))
            .query(&[("locale", "en-US")])
            .header("X-Requested-With", "XMLHttpRequest")
            .header(ACCEPT, "*/*")
            .header(ORIGIN, self.config.site_url())
            .header(REFERER, self.config.referer());

        if let Some(cookie) = &self.config.session_cookie {
            builder = builder.header(COOKIE, cookie);
        }

        builder
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
    }

    async fn post<B: serde::Serialize>(
        &self,
        path: &str,
        body: &B,
        page: Option<PageRequest>,
    ) -> RequestBuilder {
        let mut builder = self
            .request(Method::POST, path)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .json(body);

        if let Some(token) = &self.auth.read().await.csrf_token {
            builder = builder.header("X-CSRF-Token", token);
        }

        if let Some(page) = page {
            if let Ok(page_info) = serde_json::to_string(&page) {
                builder = builder.header("page_info", page_info);
            }
        }

        builder
    }

    async fn send(&self, builder: RequestBuilder) -> Result<(ResponseHeaders, Value)> {
        let bytes = builder
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        let envelope: Envelope = serde_json::from_slice(&bytes)?;

        if !envelope.headers.is_success() {
            return Err(ApiError::Upstream {
                code: envelope.headers.response_code,
                message: envelope.headers.response_message,
            });
        }

        Ok((envelope.headers, envelope.body))
    }
}

/// Moves `key` out of a response body. Missing and `null` both read as `None`.
fn take_field<T: DeserializeOwned>(body: &mut Value, key: &str) -> Result<Option<T>> {
    match body.get_mut(key).map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

pub fn extract_csrf_token(html: &str) -> Option<String> {
    let html = Html::parse_document(html);

    let from_meta = html
        .select(selector!("meta[name=csrf-token]"))
        .find_map(|meta| meta.value().attr("content"));

    let from_input = || {
        html.select(selector!("input[name=_csrf]"))
            .find_map(|input| input.value().attr("value"))
    };

    from_meta
        .or_else(from_input)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}
