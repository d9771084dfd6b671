use std::collections::HashSet;

use axum::{
    Json,
    extract::{Request, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cookie::{Cookie, SameSite};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::AppConfig;

/// Single shared-secret gate. A correct password yields an opaque session
/// token carried in a cookie; without a configured password every request
/// passes.
#[derive(Debug)]
pub struct SessionGate {
    password: Option<String>,
    cookie_name: String,
    sessions: RwLock<HashSet<String>>,
}

impl SessionGate {
    pub fn open() -> Self {
        Self {
            password: None,
            cookie_name: AppConfig::default().session_cookie,
            sessions: RwLock::new(HashSet::new()),
        }
    }

    pub fn with_password(password: impl Into<String>, cookie_name: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            cookie_name: cookie_name.into(),
            sessions: RwLock::new(HashSet::new()),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        match &config.app_password {
            Some(password) => Self::with_password(password.clone(), config.session_cookie.clone()),
            None => Self {
                cookie_name: config.session_cookie.clone(),
                ..Self::open()
            },
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.password.is_some()
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Returns a fresh session token when `password` matches.
    pub fn login(&self, password: &str) -> Option<String> {
        let expected = self.password.as_deref()?;
        if password != expected {
            return None;
        }
        let token = Uuid::new_v4().simple().to_string();
        self.sessions.write().insert(token.clone());
        Some(token)
    }

    pub fn is_authorized(&self, headers: &HeaderMap) -> bool {
        if !self.is_enabled() {
            return true;
        }
        match self.session_token(headers) {
            Some(token) => self.sessions.read().contains(&token),
            None => false,
        }
    }

    pub fn logout(&self, headers: &HeaderMap) {
        if let Some(token) = self.session_token(headers) {
            self.sessions.write().remove(&token);
        }
    }

    fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == self.cookie_name)
            .map(|cookie| cookie.value().to_string())
    }

    fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build((self.cookie_name.clone(), token))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .build()
    }

    fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build((self.cookie_name.clone(), String::new()))
            .path("/")
            .build();
        cookie.make_removal();
        cookie
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginPayload {
    #[serde(default)]
    password: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginBody {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'static str>,
}

pub(crate) async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let gate = state.sessions();
    if !gate.is_enabled() {
        return Ok(Json(LoginBody {
            success: true,
            message: Some("no password configured"),
            error: None,
        })
        .into_response());
    }

    let Json(payload) = payload.map_err(|err| ApiError::invalid(err.body_text()))?;
    let password = payload.password.unwrap_or_default();
    match gate.login(&password) {
        Some(token) => {
            info!("session opened");
            let cookie = gate.session_cookie(token);
            Ok((
                StatusCode::OK,
                [(header::SET_COOKIE, cookie.to_string())],
                Json(LoginBody {
                    success: true,
                    message: Some("logged in"),
                    error: None,
                }),
            )
                .into_response())
        }
        None => {
            warn!("rejected login attempt");
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(LoginBody {
                    success: false,
                    message: None,
                    error: Some("wrong password"),
                }),
            )
                .into_response())
        }
    }
}

pub(crate) async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let gate = state.sessions();
    gate.logout(&headers);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, gate.removal_cookie().to_string())],
        Json(serde_json::json!({ "message": "logged out" })),
    )
        .into_response()
}

pub(crate) async fn require_session(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if state.sessions().is_authorized(request.headers()) {
        return next.run(request).await;
    }
    ApiError::Unauthorized("login required".to_string()).into_response()
}
