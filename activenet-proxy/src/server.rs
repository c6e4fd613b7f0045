use std::collections::HashMap;
use std::sync::Arc;

use activenet_calendar::{
    build_calendar, build_query_string, resolve_meeting_dates, to_ics, Activity, CalendarMonth,
    FilterParams, MeetingInfo, View,
};
use axum::{
    extract::{Path, RawQuery, Request, State},
    http::{
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
        HeaderMap, HeaderValue, StatusCode,
    },
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Extension, Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::api::{
    ActivityDetail, ActivityFilterOptions, ActivitySearchPattern, ButtonStatus, EstimatedPrice,
    FilterOption, PageInfo,
};
use crate::client::ActiveNetClient;
use crate::error::{ApiError, AppError};
use crate::sessions::SessionManager;

pub const SESSION_COOKIE: &str = "samo_session";

const CALENDAR_NAME: &str = "Activities";
const LOGIN_FAILED: &str = "Login failed. Please try again.";

type Sessions = Arc<SessionManager>;

/// The visitor session a request runs in, resolved by the session middleware.
#[derive(Clone)]
pub struct Session {
    pub id: String,
    pub client: Arc<ActiveNetClient>,
}

pub fn router(sessions: Sessions) -> Router {
    Router::new()
        .route("/", get(handle_browse))
        .route("/calendar.ics", get(handle_calendar_ics))
        .route("/activity/:id", get(handle_activity))
        .route("/login", get(handle_login_page).post(handle_login))
        .route("/logout", get(handle_logout))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&sessions),
            session_layer,
        ))
        .with_state(sessions)
}

async fn session_layer(State(sessions): State<Sessions>, mut request: Request, next: Next) -> Response {
    let existing = session_id(request.headers())
        .and_then(|id| sessions.client(&id).map(|client| Session { id, client }));

    let (session, created) = match existing {
        Some(session) => (session, false),
        None => match sessions.create_session().await {
            Ok((id, client)) => (Session { id, client }, true),
            Err(err) => return AppError::from(err).into_response(),
        },
    };

    let cookie = created.then(|| session_cookie(&session.id));
    request.extensions_mut().insert(session);

    let mut response = next.run(request).await;

    if let Some(cookie) = cookie.and_then(|cookie| HeaderValue::from_str(&cookie).ok()) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }

    response
}

/// The session id from the request's `Cookie` headers, if any.
pub fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn session_cookie(id: &str) -> String {
    format!("{SESSION_COOKIE}={id}; HttpOnly; SameSite=Lax; Path=/")
}

fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Max-Age=0; HttpOnly; SameSite=Lax; Path=/")
}

/// A selectable filter value with its display label.
#[derive(Serialize)]
struct FilterChoice {
    id: String,
    label: String,
}

impl From<&FilterOption> for FilterChoice {
    fn from(option: &FilterOption) -> Self {
        Self {
            id: option.id.to_string(),
            label: option.display_name(),
        }
    }
}

fn choices(options: &[FilterOption]) -> Vec<FilterChoice> {
    options.iter().map(FilterChoice::from).collect()
}

#[derive(Serialize)]
struct BrowsePage {
    authenticated: bool,
    customer_name: Option<String>,
    activities: Vec<Activity>,
    centers: Vec<FilterChoice>,
    categories: Vec<FilterChoice>,
    filters: ActivityFilterOptions,
    page_info: PageInfo,
    params: FilterParams,
    current_page: u32,
    previous_query: Option<String>,
    next_query: Option<String>,
    meeting_dates: HashMap<i64, MeetingInfo>,
    prices: HashMap<i64, EstimatedPrice>,
    calendar_months: Vec<CalendarMonth>,
}

async fn handle_browse(
    Extension(session): Extension<Session>,
    RawQuery(query): RawQuery,
) -> Result<Json<BrowsePage>, AppError> {
    let (params, page) = FilterParams::from_query(query.as_deref().unwrap_or_default());
    let client = &session.client;

    let pattern = ActivitySearchPattern::from(&params);
    let (filters, search) = tokio::join!(client.filters(), client.search(&pattern, page));
    let filters = filters?;
    let (activities, page_info) = search?;

    let ids = activities.iter().map(|activity| activity.id).collect::<Vec<_>>();
    let need_meeting_dates = params.show_full_details || params.view == View::Calendar;

    let (meeting_dates, prices) = tokio::join!(
        async {
            if need_meeting_dates && !ids.is_empty() {
                client.meeting_dates_batch(&ids).await
            } else {
                HashMap::new()
            }
        },
        async {
            if params.show_full_details && !ids.is_empty() {
                client.prices_batch(&ids).await
            } else {
                HashMap::new()
            }
        },
    );

    let calendar_months = match params.view {
        View::Calendar => build_calendar(&activities, &meeting_dates),
        View::Card => Vec::new(),
    };

    debug!(
        activities = activities.len(),
        page,
        view = %params.view,
        "browsed activities"
    );

    Ok(Json(BrowsePage {
        authenticated: client.is_authenticated().await,
        customer_name: client.customer_name().await,
        centers: choices(&filters.centers),
        categories: choices(&filters.categories),
        previous_query: (page > 1).then(|| build_query_string(&params, page - 1)),
        next_query: (page < page_info.total_page).then(|| build_query_string(&params, page + 1)),
        activities,
        filters,
        page_info,
        params,
        current_page: page,
        meeting_dates,
        prices,
        calendar_months,
    }))
}

async fn handle_calendar_ics(
    Extension(session): Extension<Session>,
    RawQuery(query): RawQuery,
) -> Result<Response, AppError> {
    let (params, page) = FilterParams::from_query(query.as_deref().unwrap_or_default());
    let client = &session.client;

    let (activities, _) = client
        .search(&ActivitySearchPattern::from(&params), page)
        .await?;

    let ids = activities.iter().map(|activity| activity.id).collect::<Vec<_>>();
    let meeting_dates = client.meeting_dates_batch(&ids).await;
    let months = build_calendar(&activities, &meeting_dates);

    Ok((
        [(CONTENT_TYPE, "text/calendar")],
        to_ics(CALENDAR_NAME, &months).to_string(),
    )
        .into_response())
}

#[derive(Serialize)]
struct ActivityPage {
    detail: ActivityDetail,
    meeting_info: Option<MeetingInfo>,
    meeting_dates: Vec<String>,
    price: Option<EstimatedPrice>,
    button_status: Option<ButtonStatus>,
}

async fn handle_activity(
    Extension(session): Extension<Session>,
    Path(id): Path<i64>,
) -> Result<Json<ActivityPage>, AppError> {
    let client = &session.client;

    let (detail, meeting_info, price, button_status) = tokio::join!(
        client.activity_detail(id),
        client.meeting_dates(id),
        client.activity_price(id),
        client.button_status(id),
    );

    let detail = match detail {
        Ok(Some(detail)) => detail,
        Ok(None) => return Err(AppError::NotFound(id)),
        Err(err @ ApiError::Upstream { .. }) => {
            debug!(activity_id = id, error = %err, "upstream has no such activity");
            return Err(AppError::NotFound(id));
        }
        Err(err) => return Err(err.into()),
    };

    let activity = Activity {
        id: detail.activity_id,
        name: detail.activity_name.clone(),
        number: detail.activity_number.clone(),
        date_range_start: detail.first_date.clone(),
        date_range_end: detail.last_date.clone(),
        ..Default::default()
    };

    let meeting_dates = resolve_meeting_dates(&activity, meeting_info.as_ref())
        .into_iter()
        .map(|date| date.to_string())
        .collect();

    Ok(Json(ActivityPage {
        detail,
        meeting_info,
        meeting_dates,
        price,
        button_status,
    }))
}

#[derive(Serialize)]
struct LoginState {
    authenticated: bool,
    error: Option<String>,
}

impl LoginState {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            authenticated: false,
            error: Some(error.into()),
        }
    }
}

async fn handle_login_page(Extension(session): Extension<Session>) -> Response {
    if session.client.is_authenticated().await {
        return Redirect::to("/").into_response();
    }

    Json(LoginState {
        authenticated: false,
        error: None,
    })
    .into_response()
}

#[derive(Deserialize)]
struct LoginForm {
    username: String,
    password: String,
}

async fn handle_login(
    Extension(session): Extension<Session>,
    Form(form): Form<LoginForm>,
) -> Response {
    let LoginForm { username, password } = form;

    match session.client.login(&username, &password).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(ApiError::Upstream { message, .. }) => {
            warn!(username = %username, %message, "login rejected");
            (StatusCode::UNAUTHORIZED, Json(LoginState::failed(message))).into_response()
        }
        Err(err) => {
            error!(username = %username, error = %err, "login failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(LoginState::failed(LOGIN_FAILED)),
            )
                .into_response()
        }
    }
}

async fn handle_logout(
    State(sessions): State<Sessions>,
    Extension(session): Extension<Session>,
) -> Response {
    sessions.destroy_session(&session.id).await;

    (
        [(SET_COOKIE, expired_session_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}
