//! Response envelopes of the two events endpoints. The full API answers
//! `{success, data: {events: [...]}}` (some versions put `events` at the top
//! level); the simple endpoint answers `{success, data: [...]}`. Callers always
//! see the first shape.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::{json, Value};

/// Wraps an event list in the canonical envelope.
#[must_use]
pub fn events_envelope(events: Vec<Value>) -> Value {
    json!({ "success": true, "data": { "events": events } })
}

/// Canonical form of a full-API list response, or `None` if it carries no
/// event list and the caller should fall back.
#[must_use]
pub fn normalize_full(response: Value) -> Option<Value> {
    if let Some(events) = response.get("events").and_then(Value::as_array) {
        return Some(events_envelope(events.clone()));
    }

    let nested = response
        .get("data")
        .and_then(|data| data.get("events"))
        .is_some_and(Value::is_array);

    nested.then_some(response)
}

/// Event list of a successful simple-endpoint response.
#[must_use]
pub fn simple_events(response: &Value) -> Option<&Vec<Value>> {
    let success = response
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if !success {
        return None;
    }
    response.get("data").and_then(Value::as_array)
}

/// Canonical form of a simple-endpoint response; unexpected shapes pass through.
#[must_use]
pub fn normalize_simple(response: Value) -> Value {
    match simple_events(&response) {
        Some(events) => events_envelope(events.clone()),
        None => response,
    }
}

/// Start of an event from its `event_date`, which is a plain date, a SQL
/// datetime or RFC 3339 text. Plain dates start at midnight UTC.
#[must_use]
pub fn event_start(event: &Value) -> Option<DateTime<Utc>> {
    let raw = event.get("event_date")?.as_str()?.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

/// Events starting at or after `now`, soonest first, at most `limit` of them.
/// Events without a readable date are left out.
#[must_use]
pub fn upcoming(events: &[Value], now: DateTime<Utc>, limit: usize) -> Vec<Value> {
    let mut dated: Vec<(DateTime<Utc>, &Value)> = events
        .iter()
        .filter_map(|event| event_start(event).map(|start| (start, event)))
        .filter(|(start, _)| *start >= now)
        .collect();

    // stable, so same-day events keep server order
    dated.sort_by_key(|(start, _)| *start);

    dated
        .into_iter()
        .take(limit)
        .map(|(_, event)| event.clone())
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn full_top_level_events_are_wrapped() {
        let normalized = normalize_full(json!({"events": [{"id": 1}]})).unwrap();
        assert_eq!(normalized, json!({"success": true, "data": {"events": [{"id": 1}]}}));
    }

    #[test]
    fn full_nested_events_pass_through() {
        let response = json!({"success": true, "data": {"events": [], "total": 0}});
        assert_eq!(normalize_full(response.clone()), Some(response));
    }

    #[test]
    fn full_without_events_asks_for_fallback() {
        assert_eq!(normalize_full(json!({"success": false, "error": "db down"})), None);
        assert_eq!(normalize_full(json!({"data": {"events": "nope"}})), None);
    }

    #[test]
    fn simple_list_is_reshaped() {
        assert_eq!(
            normalize_simple(json!({"success": true, "data": [{"id": "E1"}]})),
            json!({"success": true, "data": {"events": [{"id": "E1"}]}})
        );

        let odd = json!({"success": false, "error": "nope"});
        assert_eq!(normalize_simple(odd.clone()), odd);
    }

    #[test]
    fn upcoming_filters_sorts_and_truncates() {
        let now = Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap();
        let events = vec![
            json!({"id": "past", "event_date": "2025-10-01"}),
            json!({"id": "late", "event_date": "2025-12-24"}),
            json!({"id": "soon", "event_date": "2025-10-21"}),
            json!({"id": "undated"}),
            json!({"id": "mid", "event_date": "2025-11-05 18:30:00"}),
            json!({"id": "garbage", "event_date": "someday"}),
        ];

        let ids = |list: Vec<Value>| -> Vec<String> {
            list.iter()
                .map(|e| e["id"].as_str().unwrap().to_string())
                .collect()
        };

        assert_eq!(ids(upcoming(&events, now, 5)), vec!["soon", "mid", "late"]);
        assert_eq!(ids(upcoming(&events, now, 2)), vec!["soon", "mid"]);
        assert!(upcoming(&events, now, 0).is_empty());
    }

    #[test]
    fn event_today_at_midnight_has_started() {
        let now = Utc.with_ymd_and_hms(2025, 10, 20, 0, 0, 0).unwrap();
        let events = vec![json!({"event_date": "2025-10-20"})];
        assert_eq!(upcoming(&events, now, 5).len(), 1);

        let later = now + chrono::Duration::seconds(1);
        assert!(upcoming(&events, later, 5).is_empty());
    }
}
