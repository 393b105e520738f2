//! Request descriptions: every typed operation becomes a path, a verb, query
//! pairs and an optional body before [`super::ApiClient::make_request`] sends it.

use reqwest::{multipart::Form, Method};
use serde_json::Value;

#[derive(Debug, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    /// Multipart upload; the transport writes its own `Content-Type` boundary.
    Multipart(Form),
}

#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
    pub set_content_type: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: &str) -> Self {
        Self {
            method,
            path: path.to_string(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: Vec::new(),
            set_content_type: true,
        }
    }

    #[must_use]
    pub fn get(path: &str) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: &str) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: &str) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: &str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Sets the `action` query parameter.
    #[must_use]
    pub fn action(self, action: &str) -> Self {
        self.query("action", action)
    }

    /// Adds or replaces a query parameter.
    #[must_use]
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if let Some(existing) = self.query.iter_mut().find(|(k, _)| k == key) {
            existing.1 = value;
        } else {
            self.query.push((key.to_string(), value));
        }
        self
    }

    /// Adds every pair in `filters`, replacing parameters already set.
    #[must_use]
    pub fn filters(self, filters: &[(String, String)]) -> Self {
        filters
            .iter()
            .fold(self, |request, (key, value)| request.query(key, value))
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    #[must_use]
    pub fn multipart(mut self, form: Form) -> Self {
        self.body = RequestBody::Multipart(form);
        self
    }

    /// Adds a header that overrides any default of the same name.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Suppresses the default JSON `Content-Type`.
    #[must_use]
    pub fn without_content_type(mut self) -> Self {
        self.set_content_type = false;
        self
    }

    /// Whether the default JSON `Content-Type` applies to this request.
    #[must_use]
    pub fn wants_json_content_type(&self) -> bool {
        self.set_content_type && !matches!(self.body, RequestBody::Multipart(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filters_override_action() {
        let request = ApiRequest::get("/api/v1/gallery").action("list").filters(&[
            ("category".to_string(), "wedding".to_string()),
            ("action".to_string(), "mine".to_string()),
        ]);

        assert_eq!(
            request.query,
            vec![
                ("action".to_string(), "mine".to_string()),
                ("category".to_string(), "wedding".to_string()),
            ]
        );
    }

    #[test]
    fn content_type_rules() {
        assert!(ApiRequest::post("/x").json(json!({})).wants_json_content_type());
        assert!(!ApiRequest::post("/x")
            .json(json!({}))
            .without_content_type()
            .wants_json_content_type());
        assert!(!ApiRequest::post("/x")
            .multipart(Form::new().text("caption", "hi"))
            .wants_json_content_type());
    }
}
