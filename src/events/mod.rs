//! Lightweight events client with graceful degradation.
//!
//! Shares the session with [`crate::api::ApiClient`] through storage. The full
//! events API is only tried while a token is cached; when it fails (or there
//! is no token) the unauthenticated simple endpoint answers instead, and RSVPs
//! land in the local side-map. A watcher task keeps the cached token and user
//! in step with writes made by other clients of the same store.

pub mod envelope;

use crate::{
    api::{
        http_client,
        types::{error_message, EventDraft, RsvpRequest},
        ApiError, ClientState, DEFAULT_UPCOMING_LIMIT, EVENTS_PATH, EVENTS_SIMPLE_PATH,
    },
    config::ClientConfig,
    session::{SessionRecord, SessionResolver, SessionStore, UserProfile},
    storage::{StorageEvent, SESSION_KEY, TOKEN_KEY},
};
use reqwest::{
    header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde_json::{json, Map, Value};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};
use tracing::{debug, error, info_span, instrument, warn, Instrument};

const ANONYMOUS_CREATOR: &str = "Anonymous";

pub struct EventsClient {
    config: ClientConfig,
    http: Client,
    store: SessionStore,
    cache: Arc<RwLock<ClientState>>,
}

/// Folds one storage change into the cached token and user.
fn apply_storage_event(cache: &RwLock<ClientState>, event: &StorageEvent) {
    let mut state = cache.write().unwrap_or_else(PoisonError::into_inner);

    if event.key == TOKEN_KEY {
        state.token = event.new_value.clone().filter(|token| !token.is_empty());
        debug!("events client token updated (present: {})", state.token.is_some());
    } else if event.key == SESSION_KEY {
        let Some(raw) = event.new_value.as_deref() else {
            state.current_user = None;
            return;
        };
        match serde_json::from_str::<SessionRecord>(raw) {
            Ok(record) => {
                state.current_user = record.user;
                if state.token.is_none() {
                    state.token = record.token.filter(|token| !token.is_empty());
                }
            }
            Err(err) => debug!("ignoring unreadable session update: {}", err),
        }
    }
}

impl EventsClient {
    /// Builds the client from the state the API client settled on. Whatever
    /// that state lacks is read from storage.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        config: ClientConfig,
        store: SessionStore,
        initial: &ClientState,
    ) -> Result<Self, ApiError> {
        let http = http_client(&config)?;

        let mut state = initial.clone();
        if state.token.is_none() || state.current_user.is_none() {
            let stored = SessionResolver::new(store.clone()).resolve();
            if state.token.is_none() {
                state.token = stored.token;
            }
            if state.current_user.is_none() {
                state.current_user = stored.user.filter(|_| stored.is_valid);
            }
        }

        Ok(Self {
            config,
            http,
            store,
            cache: Arc::new(RwLock::new(state)),
        })
    }

    /// Starts following storage changes. The task runs until the storage is
    /// dropped or the handle is aborted.
    #[must_use]
    pub fn watch(&self) -> JoinHandle<()> {
        let mut events = self.store.subscribe();
        let cache = Arc::clone(&self.cache);

        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => apply_storage_event(&cache, &event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("events client missed {} storage updates", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
            debug!("events client storage watcher stopped");
        })
    }

    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.snapshot().token
    }

    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.snapshot().current_user
    }

    #[must_use]
    pub fn snapshot(&self) -> ClientState {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// RSVPs saved locally while the full API was out of reach.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read.
    pub fn local_rsvps(&self) -> Result<Map<String, Value>, ApiError> {
        Ok(self.store.read_rsvps()?)
    }

    async fn fetch_json(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<Value>,
        authenticated: bool,
    ) -> Result<Value, ApiError> {
        let url = self.config.endpoint(path, query)?;
        let span = info_span!("events.request", http.method = %method, url = %url.path());

        let mut builder = self.http.request(method, url);
        if authenticated {
            if let Some(token) = self.token() {
                let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|_| ApiError::InvalidInput("token is not a valid header value".into()))?;
                value.set_sensitive(true);
                builder = builder.header(AUTHORIZATION, value);
            }
        }
        if let Some(body) = body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body.to_string());
        }

        let response = builder.send().instrument(span).await?;
        let status = response.status();
        let text = response.text().await?;

        let data: Option<Value> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let message = data
                .as_ref()
                .and_then(error_message)
                .map_or_else(|| format!("HTTP {}", status.as_u16()), str::to_string);
            return Err(ApiError::Http { status, message });
        }

        data.ok_or_else(|| ApiError::Parse("events response is not JSON".to_string()))
    }

    async fn fetch_simple_list(&self) -> Result<Value, ApiError> {
        self.fetch_json(Method::GET, EVENTS_SIMPLE_PATH, &[], None, false)
            .await
            .inspect_err(|err| error!("simple events endpoint failed: {}", err))
    }

    /// Lists events as `{success: true, data: {events}}`.
    ///
    /// # Errors
    /// Returns an error only when the simple endpoint fails too.
    #[instrument(skip(self))]
    pub async fn get_events(&self, filters: &[(String, String)]) -> Result<Value, ApiError> {
        if self.token().is_some() {
            let mut query = vec![("action".to_string(), "list".to_string())];
            query.extend_from_slice(filters);

            match self
                .fetch_json(Method::GET, EVENTS_PATH, &query, None, true)
                .await
            {
                Ok(response) => match envelope::normalize_full(response) {
                    Some(events) => return Ok(events),
                    None => warn!("full events API returned no event list, falling back to simple"),
                },
                Err(err) => warn!("full events API failed, falling back to simple: {}", err),
            }
        }

        Ok(envelope::normalize_simple(self.fetch_simple_list().await?))
    }

    /// Lists upcoming events, soonest first. Without the full API the simple
    /// list is filtered, sorted and truncated here.
    ///
    /// # Errors
    /// Returns an error only when the simple endpoint fails too.
    #[instrument(skip(self))]
    pub async fn get_upcoming(&self, limit: usize) -> Result<Value, ApiError> {
        if self.token().is_some() {
            let query = [
                ("action".to_string(), "upcoming".to_string()),
                ("limit".to_string(), limit.to_string()),
            ];

            match self
                .fetch_json(Method::GET, EVENTS_PATH, &query, None, true)
                .await
            {
                Ok(response) => {
                    if let Some(events) = envelope::normalize_full(response) {
                        return Ok(events);
                    }
                }
                Err(err) => warn!("full upcoming API failed, falling back to simple: {}", err),
            }
        }

        let response = self.fetch_simple_list().await?;
        let Some(events) = envelope::simple_events(&response) else {
            return Ok(response);
        };

        Ok(envelope::events_envelope(envelope::upcoming(
            events,
            chrono::Utc::now(),
            limit,
        )))
    }

    /// [`EventsClient::get_upcoming`] with the default limit.
    ///
    /// # Errors
    /// Returns an error only when the simple endpoint fails too.
    pub async fn get_upcoming_default(&self) -> Result<Value, ApiError> {
        self.get_upcoming(DEFAULT_UPCOMING_LIMIT).await
    }

    /// Creates an event. The simple endpoint receives a reduced field set and
    /// a creator name taken from the cached user when there is one.
    ///
    /// # Errors
    /// Returns an error only when the simple endpoint fails too.
    #[instrument(skip(self, draft), fields(title = draft.title.as_deref().unwrap_or("")))]
    pub async fn create_event(&self, draft: &EventDraft) -> Result<Value, ApiError> {
        if self.token().is_some() {
            let body = serde_json::to_value(draft)
                .map_err(|err| ApiError::InvalidInput(format!("Failed to encode event: {err}")))?;
            let query = [("action".to_string(), "create".to_string())];

            match self
                .fetch_json(Method::POST, EVENTS_PATH, &query, Some(body), true)
                .await
            {
                Ok(response) => return Ok(response),
                Err(err) => warn!("full create API failed, falling back to simple: {}", err),
            }
        }

        let body = json!({
            "title": draft.title,
            "description": draft.description,
            "event_date": draft.event_date,
            "event_time": draft.event_time,
            "event_type": draft.event_type,
            "location": draft.location,
            "creator_name": self.creator_name(draft),
        });

        self.fetch_json(Method::POST, EVENTS_SIMPLE_PATH, &[], Some(body), false)
            .await
    }

    fn creator_name(&self, draft: &EventDraft) -> String {
        self.current_user()
            .as_ref()
            .and_then(UserProfile::display_name)
            .map(str::to_string)
            .or_else(|| draft.creator_name.clone().filter(|name| !name.is_empty()))
            .unwrap_or_else(|| ANONYMOUS_CREATOR.to_string())
    }

    /// Submits an RSVP. If the full API is unavailable the answer is kept in
    /// the local side-map and reported as saved locally.
    ///
    /// # Errors
    /// Returns an error only if the local fallback cannot be written.
    #[instrument(skip(self))]
    pub async fn submit_rsvp(&self, rsvp: &RsvpRequest) -> Result<Value, ApiError> {
        if self.token().is_some() {
            let body = json!({ "event_id": rsvp.event_id, "rsvp_status": rsvp.rsvp_status });
            let query = [("action".to_string(), "rsvp".to_string())];

            match self
                .fetch_json(Method::POST, EVENTS_PATH, &query, Some(body), true)
                .await
            {
                Ok(response) => return Ok(response),
                Err(err) => warn!("full RSVP API failed, saving locally: {}", err),
            }
        }

        self.store
            .record_rsvp(&rsvp.event_id, Value::String(rsvp.rsvp_status.clone()))?;

        Ok(json!({
            "success": true,
            "data": { "event_id": rsvp.event_id, "rsvp_status": rsvp.rsvp_status },
            "message": "Saved locally",
        }))
    }
}

impl std::fmt::Debug for EventsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.snapshot();
        f.debug_struct("EventsClient")
            .field("base_url", &self.config.base_url().as_str())
            .field("token", &state.token.as_ref().map(|_| "***"))
            .field("current_user", &state.current_user)
            .finish_non_exhaustive()
    }
}
