//! Loaders that page-level consumers depend on instead of a concrete client.
//!
//! Consumers take an implementation at construction, so swapping the full API
//! for the events client (or a test double) never touches their code. Loaders
//! never fail: a failed or unsuccessful response yields an empty list.

use crate::{
    api::{types::is_success, ApiClient},
    events::EventsClient,
};
use serde_json::Value;
use tracing::warn;

pub trait EventSource {
    fn load_events(&self) -> impl std::future::Future<Output = Vec<Value>> + Send;
}

pub trait GallerySource {
    fn load_gallery_items(&self) -> impl std::future::Future<Output = Vec<Value>> + Send;
}

/// The array at `data.<field>` of a successful envelope.
fn listed(response: &Value, field: &str) -> Vec<Value> {
    if !is_success(response) {
        return Vec::new();
    }
    response
        .get("data")
        .and_then(|data| data.get(field))
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

impl EventSource for ApiClient {
    async fn load_events(&self) -> Vec<Value> {
        match self.get_events(&[]).await {
            Ok(response) => listed(&response, "events"),
            Err(err) => {
                warn!("failed to load events: {}", err);
                Vec::new()
            }
        }
    }
}

impl GallerySource for ApiClient {
    async fn load_gallery_items(&self) -> Vec<Value> {
        match self.get_gallery_items(&[]).await {
            Ok(response) => listed(&response, "items"),
            Err(err) => {
                warn!("failed to load gallery items: {}", err);
                Vec::new()
            }
        }
    }
}

impl EventSource for EventsClient {
    async fn load_events(&self) -> Vec<Value> {
        match self.get_events(&[]).await {
            Ok(response) => listed(&response, "events"),
            Err(err) => {
                warn!("failed to load events: {}", err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn listed_reads_successful_envelopes_only() {
        let ok = json!({"success": true, "data": {"items": [{"id": 1}, {"id": 2}]}});
        assert_eq!(listed(&ok, "items").len(), 2);
        assert!(listed(&ok, "events").is_empty());

        let rejected = json!({"success": false, "data": {"items": [{"id": 1}]}});
        assert!(listed(&rejected, "items").is_empty());

        let malformed = json!({"success": true, "data": {"items": "none"}});
        assert!(listed(&malformed, "items").is_empty());
    }

    struct Fixed(Vec<Value>);

    impl EventSource for Fixed {
        async fn load_events(&self) -> Vec<Value> {
            self.0.clone()
        }
    }

    async fn count_events(source: &impl EventSource) -> usize {
        source.load_events().await.len()
    }

    #[tokio::test]
    async fn consumers_accept_any_source() {
        let source = Fixed(vec![json!({"id": "E1"})]);
        assert_eq!(count_events(&source).await, 1);
    }
}
