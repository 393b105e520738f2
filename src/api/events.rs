use super::{ApiClient, ApiError, ApiRequest, EventDraft, RsvpRequest, EVENTS_PATH};
use serde_json::Value;

/// Number of upcoming events requested when the caller has no preference.
pub const DEFAULT_UPCOMING_LIMIT: usize = 5;

fn to_json<T: serde::Serialize>(payload: &T) -> Result<Value, ApiError> {
    serde_json::to_value(payload)
        .map_err(|err| ApiError::InvalidInput(format!("Failed to encode request: {err}")))
}

impl ApiClient {
    /// Lists events; `filters` become extra query parameters.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_events(&self, filters: &[(String, String)]) -> Result<Value, ApiError> {
        self.make_request(ApiRequest::get(EVENTS_PATH).action("list").filters(filters))
            .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_event(&self, id: &str) -> Result<Value, ApiError> {
        self.make_request(ApiRequest::get(EVENTS_PATH).action("event").query("id", id))
            .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn create_event(&self, event: &EventDraft) -> Result<Value, ApiError> {
        self.make_request(
            ApiRequest::post(EVENTS_PATH)
                .action("create")
                .json(to_json(event)?),
        )
        .await
    }

    /// Updates an event; the draft must carry the event `id`.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn update_event(&self, event: &EventDraft) -> Result<Value, ApiError> {
        if event.id.is_none() {
            return Err(ApiError::InvalidInput(
                "event update requires an id".to_string(),
            ));
        }
        self.make_request(ApiRequest::put(EVENTS_PATH).json(to_json(event)?))
            .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn delete_event(&self, id: &str) -> Result<Value, ApiError> {
        self.make_request(ApiRequest::delete(EVENTS_PATH).query("id", id))
            .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn submit_rsvp(&self, rsvp: &RsvpRequest) -> Result<Value, ApiError> {
        self.make_request(
            ApiRequest::post(EVENTS_PATH)
                .action("rsvp")
                .json(to_json(rsvp)?),
        )
        .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_calendar_events(&self, month: u32, year: i32) -> Result<Value, ApiError> {
        self.make_request(
            ApiRequest::get(EVENTS_PATH)
                .action("calendar")
                .query("month", month)
                .query("year", year),
        )
        .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_upcoming_events(&self, limit: usize) -> Result<Value, ApiError> {
        self.make_request(
            ApiRequest::get(EVENTS_PATH)
                .action("upcoming")
                .query("limit", limit),
        )
        .await
    }
}
