#![allow(clippy::unwrap_used)]

use anyhow::Result;
use chrono::{Duration, Utc};
use cousinsvault::{
    api::{ApiError, ClientState, EventDraft, RsvpRequest, EVENTS_PATH, EVENTS_SIMPLE_PATH},
    config::ClientConfig,
    events::EventsClient,
    session::{SessionStore, UserProfile},
    sources::EventSource,
    storage::{CookieJar, MemoryStorage, Storage, RSVP_KEY},
};
use serde_json::{json, Value};
use std::{net::TcpListener, sync::Arc};
use wiremock::{
    matchers::{body_json, header, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn client(server: &MockServer, state: &ClientState) -> (Arc<MemoryStorage>, EventsClient) {
    let storage = Arc::new(MemoryStorage::new());
    let store = SessionStore::new(storage.clone(), CookieJar::new(Arc::new(MemoryStorage::new())));
    let events = EventsClient::new(ClientConfig::new(&server.uri()).unwrap(), store, state).unwrap();
    (storage, events)
}

fn signed_in() -> ClientState {
    ClientState {
        token: Some("T1".to_string()),
        current_user: Some(UserProfile {
            name: Some("Abir Rahman".to_string()),
            ..UserProfile::default()
        }),
    }
}

fn ids(response: &Value) -> Vec<String> {
    response["data"]["events"]
        .as_array()
        .unwrap()
        .iter()
        .map(|event| event["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn anonymous_list_uses_simple_endpoint() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EVENTS_SIMPLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": "E1", "title": "Picnic"}]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"events": []})))
        .expect(0)
        .mount(&server)
        .await;

    let (_, events) = client(&server, &ClientState::default());
    let response = events.get_events(&[]).await?;

    assert_eq!(
        response,
        json!({"success": true, "data": {"events": [{"id": "E1", "title": "Picnic"}]}})
    );
    Ok(())
}

#[tokio::test]
async fn full_list_is_preferred_and_normalized() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .and(query_param("action", "list"))
        .and(query_param("type", "birthday"))
        .and(header("authorization", "Bearer T1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "events": [{"id": "E7"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_, events) = client(&server, &signed_in());
    let response = events
        .get_events(&[("type".to_string(), "birthday".to_string())])
        .await?;

    assert_eq!(response["success"], true);
    assert_eq!(ids(&response), vec!["E7"]);
    Ok(())
}

#[tokio::test]
async fn failing_full_list_falls_back() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EVENTS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "db down"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(EVENTS_SIMPLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [{"id": "E2"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (_, events) = client(&server, &signed_in());
    assert_eq!(ids(&events.get_events(&[]).await?), vec!["E2"]);
    Ok(())
}

#[tokio::test]
async fn simple_failure_carries_server_error() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EVENTS_SIMPLE_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"error": "maintenance"})))
        .mount(&server)
        .await;

    let (_, events) = client(&server, &ClientState::default());
    match events.get_events(&[]).await {
        Err(ApiError::Http { status, message }) => {
            assert_eq!(status.as_u16(), 503);
            assert_eq!(message, "maintenance");
        }
        other => panic!("expected HTTP error, got {other:?}"),
    }

    server.reset().await;
    Mock::given(method("GET"))
        .and(path(EVENTS_SIMPLE_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
        .mount(&server)
        .await;

    match events.get_events(&[]).await {
        Err(ApiError::Http { message, .. }) => assert_eq!(message, "HTTP 404"),
        other => panic!("expected HTTP error, got {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn upcoming_fallback_filters_and_sorts() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;
    let day = |offset: i64| (Utc::now() + Duration::days(offset)).format("%Y-%m-%d").to_string();

    Mock::given(method("GET"))
        .and(path(EVENTS_SIMPLE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": "past", "event_date": day(-3)},
                {"id": "third", "event_date": day(30)},
                {"id": "first", "event_date": day(2)},
                {"id": "second", "event_date": day(9)},
                {"id": "undated", "event_date": "soon"},
            ]
        })))
        .mount(&server)
        .await;

    let (_, events) = client(&server, &ClientState::default());

    assert_eq!(
        ids(&events.get_upcoming(5).await?),
        vec!["first", "second", "third"]
    );
    assert_eq!(ids(&events.get_upcoming(2).await?), vec!["first", "second"]);
    Ok(())
}

#[tokio::test]
async fn create_fallback_posts_reduced_fields() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .and(query_param("action", "create"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "forbidden"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(EVENTS_SIMPLE_PATH))
        .and(body_json(json!({
            "title": "Picnic",
            "description": null,
            "event_date": "2030-06-01",
            "event_time": null,
            "event_type": "gathering",
            "location": "Lakeside",
            "creator_name": "Abir Rahman"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "id": 9})))
        .expect(1)
        .mount(&server)
        .await;

    let (_, events) = client(&server, &signed_in());
    let mut extra = serde_json::Map::new();
    extra.insert("visibility".to_string(), json!("family"));
    let response = events
        .create_event(&EventDraft {
            title: Some("Picnic".to_string()),
            event_date: Some("2030-06-01".to_string()),
            event_type: Some("gathering".to_string()),
            location: Some("Lakeside".to_string()),
            creator_name: Some("Someone Else".to_string()),
            extra,
            ..EventDraft::default()
        })
        .await?;

    assert_eq!(response["id"], 9);
    Ok(())
}

#[tokio::test]
async fn rsvp_fallback_saves_locally() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .and(query_param("action", "rsvp"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, events) = client(&server, &signed_in());
    let response = events
        .submit_rsvp(&RsvpRequest {
            event_id: "E1".to_string(),
            rsvp_status: "yes".to_string(),
        })
        .await?;

    assert_eq!(response["message"], "Saved locally");
    assert_eq!(response["data"], json!({"event_id": "E1", "rsvp_status": "yes"}));

    let stored: Value = serde_json::from_str(&storage.get(RSVP_KEY)?.unwrap())?;
    assert_eq!(stored, json!({"E1": "yes"}));
    Ok(())
}

#[tokio::test]
async fn rsvp_confirmed_by_server_is_not_stored() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(EVENTS_PATH))
        .and(query_param("action", "rsvp"))
        .and(body_json(json!({"event_id": "E1", "rsvp_status": "maybe"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, events) = client(&server, &signed_in());
    let response = events
        .submit_rsvp(&RsvpRequest {
            event_id: "E1".to_string(),
            rsvp_status: "maybe".to_string(),
        })
        .await?;

    assert_eq!(response, json!({"success": true}));
    assert!(storage.get(RSVP_KEY)?.is_none());
    Ok(())
}

#[tokio::test]
async fn event_source_yields_empty_list_on_failure() -> Result<()> {
    if !can_bind_localhost() {
        eprintln!("Skipping test: cannot bind localhost");
        return Ok(());
    }
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(EVENTS_SIMPLE_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("down"))
        .mount(&server)
        .await;

    let (_, events) = client(&server, &ClientState::default());
    assert!(events.load_events().await.is_empty());
    Ok(())
}
