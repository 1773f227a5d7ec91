//! Session client: authenticated requests and the login/profile facade.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::refresh::{self, RefreshCoordinator, RefreshOutcome, Ticket};
use super::tokens::{build_headers, TokenStore};
use crate::api::envelope::{read_data, read_envelope};
use crate::api::ApiRequest;
use crate::config::Config;
use crate::error::SessionError;
use crate::models::{AuthData, LoginCredentials, ProfileUpdate, RegisterData, User};
use crate::storage::KeyValueStore;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const PROFILE_PATH: &str = "/auth/profile";
const REFRESH_PATH: &str = "/auth/refresh-token";

/// Client-side view of the session, rebuilt from server responses.
///
/// `is_authenticated` means the server accepted our access token at the last
/// check; expiry is never evaluated locally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub current_user: Option<User>,
    pub is_authenticated: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

struct Inner {
    http: Client,
    base_url: String,
    tokens: TokenStore,
    refresh: RefreshCoordinator,
    state: watch::Sender<SessionState>,
}

/// Entry point for everything that talks to the API.
///
/// Clone is cheap; clones share the connection pool, the token store, the
/// refresh coordinator and the session state.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<Inner>,
}

impl SessionClient {
    pub fn new(base_url: &str, storage: Arc<dyn KeyValueStore>) -> Result<Self, SessionError> {
        Self::with_timeout(base_url, storage, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        storage: Arc<dyn KeyValueStore>,
        timeout: Duration,
    ) -> Result<Self, SessionError> {
        let http = Client::builder().timeout(timeout).build()?;
        let (state, _) = watch::channel(SessionState::default());

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                tokens: TokenStore::new(storage),
                refresh: RefreshCoordinator::new(),
                state,
            }),
        })
    }

    /// Build a client from the configured API URL, timeout and storage backend
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage = config.open_storage()?;
        Ok(Self::with_timeout(&config.api_url(), storage, config.request_timeout())?)
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    /// Watch session changes (login, logout, refresh failure).
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().current_user.clone()
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.inner.base_url, path)
        }
    }

    /// Issue one HTTP request with the given bearer token, no recovery.
    async fn dispatch(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response, SessionError> {
        let mut headers = build_headers(token);
        headers.extend(request.headers.clone());

        let url = self.url(&request.path);
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &url)
            .headers(headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        debug!(
            method = %request.method,
            url = %url,
            status = response.status().as_u16(),
            "API request"
        );
        Ok(response)
    }

    // ===== Authenticated Fetch =====

    /// Send `request` with the stored access token.
    ///
    /// On a 401 with a refresh token available, refreshes (sharing any
    /// refresh already in flight) and replays the request exactly once with
    /// the new token. Any other status, or a 401 without a refresh token, is
    /// returned unchanged for the caller to interpret.
    pub async fn send(&self, request: ApiRequest) -> Result<Response, SessionError> {
        let token = self.inner.tokens.access_token();
        let response = self.dispatch(&request, token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        if self.inner.tokens.refresh_token().is_none() {
            debug!(path = %request.path, "Unauthorized and no refresh token, returning response");
            return Ok(response);
        }

        debug!(path = %request.path, "Access token rejected, refreshing");
        let fresh = self.coordinate_refresh(token.as_deref()).await?;
        self.dispatch(&request, Some(&fresh)).await
    }

    /// Force a token refresh now. Joins a refresh already in flight.
    pub async fn refresh(&self) -> Result<String, SessionError> {
        self.coordinate_refresh(None).await
    }

    /// `stale` is the access token the server just rejected, if any.
    async fn coordinate_refresh(&self, stale: Option<&str>) -> RefreshOutcome {
        match self.inner.refresh.join() {
            Ticket::Waiter(rx) => refresh::wait(rx).await,
            Ticket::Leader(guard) => {
                let outcome = self.lead_refresh(stale).await;
                guard.complete(&outcome);
                outcome
            }
        }
    }

    async fn lead_refresh(&self, stale: Option<&str>) -> RefreshOutcome {
        // Another process sharing the storage may have rotated the pair
        // already; reuse its token instead of spending our refresh token.
        if let (Some(stale), Some(current)) = (stale, self.inner.tokens.access_token()) {
            if current != stale {
                debug!("Stored access token changed since the request, skipping refresh");
                self.inner.state.send_modify(|s| s.is_authenticated = true);
                return Ok(current);
            }
        }

        let refresh_token = self
            .inner
            .tokens
            .refresh_token()
            .ok_or(SessionError::NoRefreshToken)?;

        match self.request_new_tokens(&refresh_token).await {
            Ok((access, rotated)) => {
                self.inner.tokens.set_tokens(&access, rotated.as_deref());
                self.inner.state.send_modify(|s| s.is_authenticated = true);
                info!(rotated = rotated.is_some(), "Access token refreshed");
                Ok(access)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, ending session");
                self.end_session();
                Err(e)
            }
        }
    }

    async fn request_new_tokens(
        &self,
        refresh_token: &str,
    ) -> Result<(String, Option<String>), SessionError> {
        let request = ApiRequest::post(REFRESH_PATH).json(&RefreshBody { refresh_token })?;
        let response = self.dispatch(&request, None).await?;
        let data: AuthData = read_data(response, "Token refresh failed").await?;

        let access = data
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SessionError::MalformedResponse("refresh response has no access token".to_string())
            })?;
        Ok((access, data.refresh_token.filter(|t| !t.is_empty())))
    }

    fn end_session(&self) {
        self.inner.tokens.clear();
        self.inner.state.send_replace(SessionState::default());
    }

    // ===== Session Facade =====

    /// Log in with email and password.
    ///
    /// On failure the existing session (tokens and state) is left untouched.
    pub async fn login(&self, credentials: &LoginCredentials) -> Result<AuthData, SessionError> {
        let request = ApiRequest::post(LOGIN_PATH).json(credentials)?;
        let response = self.dispatch(&request, None).await?;
        let data: AuthData = read_data(response, "Login failed")
            .await
            .inspect_err(|e| warn!(email = %credentials.email, error = %e, "Login failed"))?;

        let access = data
            .access_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SessionError::MalformedResponse("login response has no access token".to_string())
            })?;

        self.start_session(access, &data);
        info!(email = %credentials.email, "Logged in");
        Ok(data)
    }

    /// Create an account. When the server also issues tokens the new
    /// account is logged in straight away.
    pub async fn register(&self, registration: &RegisterData) -> Result<AuthData, SessionError> {
        let request = ApiRequest::post(REGISTER_PATH).json(registration)?;
        let response = self.dispatch(&request, None).await?;
        let data: AuthData = read_data(response, "Registration failed")
            .await
            .inspect_err(|e| warn!(email = %registration.email, error = %e, "Registration failed"))?;

        if let Some(access) = data.access_token.as_deref().filter(|t| !t.is_empty()) {
            self.start_session(access, &data);
        }
        info!(email = %registration.email, "Registered");
        Ok(data)
    }

    fn start_session(&self, access: &str, data: &AuthData) {
        self.inner
            .tokens
            .set_tokens(access, data.refresh_token.as_deref().filter(|t| !t.is_empty()));
        self.inner.state.send_replace(SessionState {
            current_user: data.user.clone(),
            is_authenticated: true,
        });
    }

    /// Drop local credentials and session state. The server is not notified.
    pub fn logout(&self) {
        self.end_session();
        info!("Logged out");
    }

    /// Fetch the logged-in user's profile through the authenticated path.
    pub async fn get_profile(&self) -> Result<User, SessionError> {
        let response = self.send(ApiRequest::get(PROFILE_PATH)).await?;
        let data: AuthData = read_data(response, "Failed to fetch profile").await?;
        let user = data.user.ok_or_else(|| {
            SessionError::MalformedResponse("profile response has no user".to_string())
        })?;

        self.inner.state.send_replace(SessionState {
            current_user: Some(user.clone()),
            is_authenticated: true,
        });
        Ok(user)
    }

    /// Probe whether the stored credentials still work.
    ///
    /// Never fails: any error ends the local session and yields `false`.
    /// Without an access token no request is made.
    pub async fn check_auth(&self) -> bool {
        if self.inner.tokens.access_token().is_none() {
            self.inner.state.send_replace(SessionState::default());
            return false;
        }

        match self.get_profile().await {
            Ok(_) => true,
            Err(e) => {
                warn!(error = %e, "Session check failed, clearing credentials");
                self.end_session();
                false
            }
        }
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<Option<User>, SessionError> {
        let request = ApiRequest::put(PROFILE_PATH).json(update)?;
        let response = self.send(request).await?;
        let data: AuthData = read_data(response, "Failed to update profile").await?;

        if let Some(ref user) = data.user {
            self.inner
                .state
                .send_modify(|s| s.current_user = Some(user.clone()));
        }
        Ok(data.user)
    }

    // ===== Typed helpers =====

    /// Send through the authenticated path and decode the envelope `data`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        context: &str,
    ) -> Result<T, SessionError> {
        let response = self.send(request).await?;
        read_data(response, context).await
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, context: &str) -> Result<T, SessionError> {
        self.request_json(ApiRequest::get(path), context).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B, context: &str) -> Result<T, SessionError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(ApiRequest::post(path).json(body)?, context).await
    }

    pub async fn put_json<T, B>(&self, path: &str, body: &B, context: &str) -> Result<T, SessionError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(ApiRequest::put(path).json(body)?, context).await
    }

    pub async fn patch_json<T, B>(&self, path: &str, body: &B, context: &str) -> Result<T, SessionError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(ApiRequest::patch(path).json(body)?, context).await
    }

    /// DELETE `path`; whatever `data` the server returns is passed through.
    pub async fn delete_json(&self, path: &str, context: &str) -> Result<Option<Value>, SessionError> {
        let response = self.send(ApiRequest::delete(path)).await?;
        read_envelope(response, context).await
    }
}
