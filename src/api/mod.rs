//! Authenticated client for the Cousins Vault REST backend.
//!
//! Every call goes to a fixed host-relative path with the operation selected by
//! an `action` query parameter, and carries `Authorization: Bearer <token>`
//! when a token is cached. The client owns the token lifecycle end to end:
//! login and signup store it, logout is the only path that clears it. A
//! negative auth check, a network failure or a 401 never clears local
//! credentials; the backend may be partially available and the user keeps
//! their session until they sign out.

mod auth;
pub mod error;
mod events;
mod gallery;
pub mod request;
pub mod types;

pub use error::ApiError;
pub use events::DEFAULT_UPCOMING_LIMIT;
pub use request::{ApiRequest, RequestBody};
pub use types::{EventDraft, RsvpRequest, SignupRequest};

use crate::{
    config::ClientConfig,
    display::AuthDisplay,
    session::{SessionResolver, SessionStore, TokenPersistence, UserProfile},
    APP_USER_AGENT,
};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, StatusCode,
};
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, error, info_span, instrument, warn, Instrument};

pub const AUTH_PATH: &str = "/api/v1/auth";
pub const GALLERY_PATH: &str = "/api/v1/gallery";
pub const EVENTS_PATH: &str = "/api/v1/events";
pub const EVENTS_SIMPLE_PATH: &str = "/api/v1/events_simple.php";

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// In-memory, non-authoritative copy of the session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClientState {
    pub token: Option<String>,
    pub current_user: Option<UserProfile>,
}

pub struct ApiClient {
    config: ClientConfig,
    http: Client,
    resolver: SessionResolver,
    state: RwLock<ClientState>,
    display: Option<Arc<dyn AuthDisplay>>,
}

/// Builds the HTTP client shared by the API and events clients.
pub(crate) fn http_client(config: &ClientConfig) -> Result<Client, ApiError> {
    Ok(Client::builder()
        .user_agent(APP_USER_AGENT)
        .timeout(config.timeout)
        .build()?)
}

/// Trims and truncates a non-JSON error body.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}

impl ApiClient {
    /// Builds a client and picks up whatever token is already stored. The user
    /// is not hydrated until [`ApiClient::init`] runs.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        store: SessionStore,
        display: Option<Arc<dyn AuthDisplay>>,
    ) -> Result<Self, ApiError> {
        let http = http_client(&config)?;
        let resolver = SessionResolver::new(store);
        let token = resolver.resolve().token;

        debug!("API client for {} (token found: {})", config.base_url(), token.is_some());

        Ok(Self {
            config,
            http,
            resolver,
            state: RwLock::new(ClientState {
                token,
                current_user: None,
            }),
            display,
        })
    }

    fn state(&self) -> RwLockReadGuard<'_, ClientState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&self) -> RwLockWriteGuard<'_, ClientState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        self.resolver.store()
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.state().token.clone()
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.state().current_user.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> ClientState {
        self.state().clone()
    }

    pub(crate) fn set_current_user(&self, user: Option<UserProfile>) {
        self.state_mut().current_user = user;
    }

    /// Hydrates the client from storage and confirms the token with the server.
    ///
    /// A valid stored session shows the user immediately; the server check then
    /// refreshes the profile if the token is still accepted. Returns the state
    /// other components should start from.
    #[instrument(skip(self))]
    pub async fn init(&self) -> ClientState {
        let resolved = self.resolver.resolve();

        {
            let mut state = self.state_mut();
            state.token = resolved.token;
            if resolved.is_valid {
                if let Some(user) = resolved.user {
                    debug!(
                        "hydrated user {} from stored session",
                        user.display_name().unwrap_or("(no name)")
                    );
                    state.current_user = Some(user);
                }
            }
        }

        if self.current_user().is_some() {
            self.update_auth_display();
        }

        self.check_auth_status().await;
        self.sync_display();

        debug!("API client initialization complete");

        self.snapshot()
    }

    /// Caches a token and persists it, falling back to the cookie when
    /// storage refuses the write.
    pub fn set_token(&self, token: &str) -> TokenPersistence {
        self.state_mut().token = Some(token.to_string()).filter(|t| !t.is_empty());
        self.store().persist_token(token, chrono::Utc::now())
    }

    /// Forgets the token everywhere: memory, both storage keys and the cookie.
    pub fn clear_token(&self) {
        self.state_mut().token = None;
        self.store().clear_credentials();
    }

    /// Re-derives all in-memory state from storage, as a page reload would.
    #[instrument(skip(self))]
    pub fn reload(&self) -> ClientState {
        let resolved = self.resolver.resolve();
        {
            let mut state = self.state_mut();
            state.token = resolved.token;
            state.current_user = resolved.user.filter(|_| resolved.is_valid);
        }
        self.sync_display();
        self.snapshot()
    }

    /// Replaces the display manager's user with the cached one and renders.
    pub(crate) fn sync_display(&self) {
        if let Some(display) = &self.display {
            display.set_current_user(self.current_user());
        }
        self.update_auth_display();
    }

    /// Hands the current user to the display manager and asks it to render.
    /// Without a display manager this does nothing.
    pub fn update_auth_display(&self) {
        let Some(display) = &self.display else {
            debug!("auth display update skipped (no display manager)");
            return;
        };

        if let Some(user) = self.current_user() {
            if display.current_user().is_none() {
                display.set_current_user(Some(user));
            }
        }
        display.update_auth_display();
    }

    /// Sends a request and returns the parsed JSON body unchanged.
    ///
    /// The bearer token is attached when cached, JSON `Content-Type` is set
    /// unless suppressed or the body is multipart, and caller headers override
    /// both. A 401 whose error mentions "token" becomes
    /// [`ApiError::SessionExpired`]; nothing local is cleared.
    ///
    /// # Errors
    /// Returns an error on transport failure, a non-JSON body, or a rejected token.
    pub async fn make_request(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let url = self.config.endpoint(&request.path, &request.query)?;
        let headers = self.build_headers(&request)?;

        let span = info_span!(
            "api.request",
            http.method = %request.method,
            url = %url.path(),
            action = request
                .query
                .iter()
                .find(|(key, _)| key == "action")
                .map_or("", |(_, value)| value.as_str())
        );

        let mut builder = self.http.request(request.method, url).headers(headers);
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.body(body.to_string()),
            RequestBody::Multipart(form) => builder.multipart(form),
        };

        let response = builder.send().instrument(span).await.map_err(|err| {
            error!("API request failed: {}", err);
            ApiError::from(err)
        })?;

        let status = response.status();
        let text = response.text().await?;

        let data: Value = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(err) if status.is_success() => {
                error!("API response is not JSON: {}", err);
                return Err(ApiError::Parse(format!("Failed to decode response: {err}")));
            }
            Err(_) => {
                error!("API request failed with status {}", status);
                return Err(ApiError::Http {
                    status,
                    message: sanitize_body(&text),
                });
            }
        };

        if status == StatusCode::UNAUTHORIZED
            && data
                .get("error")
                .and_then(Value::as_str)
                .is_some_and(|message| message.to_lowercase().contains("token"))
        {
            warn!("API rejected the token; leaving local session in place");
            return Err(ApiError::SessionExpired);
        }

        Ok(data)
    }

    fn build_headers(&self, request: &ApiRequest) -> Result<HeaderMap, ApiError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = self.token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| ApiError::InvalidInput("token is not a valid header value".into()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        if request.wants_json_content_type() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        for (name, value) in &request.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ApiError::InvalidInput(format!("header name {name}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| ApiError::InvalidInput(format!("header {name}: {err}")))?;
            headers.insert(name, value);
        }

        Ok(headers)
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("ApiClient")
            .field("base_url", &self.config.base_url().as_str())
            .field("token", &state.token.as_ref().map(|_| "***"))
            .field("current_user", &state.current_user)
            .field("display", &self.display.is_some())
            .finish_non_exhaustive()
    }
}
