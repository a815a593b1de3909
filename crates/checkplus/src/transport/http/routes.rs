//! HTTP route handlers.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Form, Router,
    extract::{
        Query, State,
        rejection::{FormRejection, QueryRejection},
    },
    http::{HeaderValue, Method, StatusCode, header, header::InvalidHeaderValue},
    response::{Html, IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::error::Error;
use crate::session::{Customize, SessionCodec, SessionOptions};
use crate::version::VersionInfo;

use super::pages::{self, CHECKPLUS_FORM_URL};

/// Everything the handlers share.
pub struct AppState {
    codec: SessionCodec,
    /// Fallback for missing `success-url` / `fail-url`.
    public_url: Option<String>,
    cors_origin: Option<HeaderValue>,
    checkplus_url: String,
    version: VersionInfo,
}

impl AppState {
    pub fn new(codec: SessionCodec) -> Self {
        Self {
            codec,
            public_url: None,
            cors_origin: None,
            checkplus_url: CHECKPLUS_FORM_URL.to_string(),
            version: VersionInfo::new(),
        }
    }

    pub fn with_public_url(mut self, url: impl Into<String>) -> Self {
        self.public_url = Some(url.into());
        self
    }

    pub fn with_cors_origin(mut self, origin: &str) -> Result<Self, InvalidHeaderValue> {
        self.cors_origin = Some(HeaderValue::from_str(origin)?);
        Ok(self)
    }

    pub fn with_checkplus_url(mut self, url: impl Into<String>) -> Self {
        self.checkplus_url = url.into();
        self
    }

    pub fn with_version(mut self, version: VersionInfo) -> Self {
        self.version = version;
        self
    }

    fn redirect_url<'a>(&'a self, param: &'a Option<String>) -> Option<&'a str> {
        param
            .as_deref()
            .filter(|url| !url.is_empty())
            .or(self.public_url.as_deref())
    }

    fn session_options(&self, params: &SessionParams) -> Result<SessionOptions, ApiError> {
        match (
            self.redirect_url(&params.success_url),
            self.redirect_url(&params.fail_url),
        ) {
            (Some(success), Some(fail)) => Ok(SessionOptions::new(success, fail)),
            _ => Err(ApiError::MissingRedirectUrl),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: &'static str,
    pub version: VersionInfo,
}

#[derive(Debug, Deserialize)]
struct SessionParams {
    #[serde(rename = "success-url")]
    success_url: Option<String>,
    #[serde(rename = "fail-url")]
    fail_url: Option<String>,
    /// Presence flag.
    popup: Option<String>,
    /// Presence flag.
    mobile: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EncodeDataParams {
    #[serde(rename = "EncodeData")]
    encode_data: Option<String>,
}

impl EncodeDataParams {
    /// `EncodeData` lands in the agent's argv; only base64 text is accepted.
    fn validated(self) -> Result<String, ApiError> {
        match self.encode_data {
            Some(data) if is_base64(&data) => Ok(data),
            _ => Err(ApiError::InvalidEncodeData),
        }
    }
}

fn is_base64(data: &str) -> bool {
    !data.is_empty()
        && data
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
}

enum ApiError {
    Codec(Error),
    InvalidEncodeData,
    MissingRedirectUrl,
}

impl ApiError {
    /// Extractor failures on `EncodeData` routes: wrong content type, no body,
    /// undecodable query or form.
    fn rejected(rejection: impl fmt::Display) -> Self {
        tracing::debug!(%rejection, "Rejected EncodeData request");
        Self::InvalidEncodeData
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Codec(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Codec(err) => {
                let status = match &err {
                    Error::AgentSignal { .. } => StatusCode::BAD_REQUEST,
                    Error::TextDecode { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                    Error::MalformedWireFormat { .. } | Error::OddTokenCount { .. } => {
                        StatusCode::BAD_GATEWAY
                    }
                    Error::AgentUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                };
                tracing::warn!(kind = err.kind(), error = %err, "Request failed");

                let mut body = serde_json::json!({
                    "error": err.to_string(),
                    "kind": err.kind(),
                });
                if let Error::AgentSignal { signal, .. } = &err {
                    body["code"] = serde_json::json!(signal.code());
                    body["category"] = serde_json::json!(signal.category());
                }
                (status, body)
            }
            Self::InvalidEncodeData => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({
                    "error": "EncodeData must be a non-empty base64 string",
                    "kind": "invalid_encode_data",
                }),
            ),
            Self::MissingRedirectUrl => (
                StatusCode::INTERNAL_SERVER_ERROR,
                serde_json::json!({
                    "error": "success-url and fail-url are required when no public URL is configured",
                    "kind": "missing_redirect_url",
                }),
            ),
        };
        (status, Json(body)).into_response()
    }
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "READY",
        version: state.version.clone(),
    })
}

async fn create_session(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionParams>,
) -> Result<String, ApiError> {
    let options = state
        .session_options(&params)?
        .with_popup(false)
        .with_customize(Customize::Mobile);
    let request = state.codec.build_session(&options).await?;
    Ok(request.encoded)
}

async fn user_info_query(
    State(state): State<Arc<AppState>>,
    query: Result<Query<EncodeDataParams>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(params) = query.map_err(ApiError::rejected)?;
    user_info(&state, params).await
}

async fn user_info_form(
    State(state): State<Arc<AppState>>,
    form: Result<Form<EncodeDataParams>, FormRejection>,
) -> Result<Response, ApiError> {
    let Form(params) = form.map_err(ApiError::rejected)?;
    user_info(&state, params).await
}

async fn user_info(state: &AppState, params: EncodeDataParams) -> Result<Response, ApiError> {
    let encode_data = params.validated()?;
    let record = state.codec.resolve_session(&encode_data).await?;
    Ok(Json(record).into_response())
}

async fn checkplus_page(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SessionParams>,
) -> Result<Html<String>, ApiError> {
    let mut options = state
        .session_options(&params)?
        .with_popup(params.popup.is_some());
    if params.mobile.is_some() {
        options = options.with_customize(Customize::Mobile);
    }
    let request = state.codec.build_session(&options).await?;
    Ok(Html(pages::checkplus_form(
        &state.checkplus_url,
        &request.encoded,
    )))
}

async fn landing_query(
    query: Result<Query<EncodeDataParams>, QueryRejection>,
) -> Result<Html<String>, ApiError> {
    let Query(params) = query.map_err(ApiError::rejected)?;
    Ok(Html(pages::landing(&params.validated()?)))
}

async fn landing_form(
    form: Result<Form<EncodeDataParams>, FormRejection>,
) -> Result<Html<String>, ApiError> {
    let Form(params) = form.map_err(ApiError::rejected)?;
    Ok(Html(pages::landing(&params.validated()?)))
}

async fn method_not_allowed() -> StatusCode {
    StatusCode::METHOD_NOT_ALLOWED
}

fn cors_layer(origin: HeaderValue) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE])
        .max_age(Duration::ZERO)
}

pub fn routes(state: Arc<AppState>) -> Router {
    let cors = state.cors_origin.clone().map(cors_layer);

    let router = Router::new()
        .route("/health-check", get(health_check))
        .route("/api/nice-auth/session", get(create_session))
        .route(
            "/api/nice-auth/user-info",
            get(user_info_query).post(user_info_form),
        )
        .route("/nice", get(checkplus_page))
        .route("/user", get(landing_query).post(landing_form))
        .fallback(method_not_allowed)
        .with_state(state);

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}
