use super::{ApiClient, ApiError, ApiRequest, GALLERY_PATH};
use reqwest::multipart::Form;
use serde_json::{json, Value};

impl ApiClient {
    /// Lists gallery items; `filters` become extra query parameters.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_gallery_items(&self, filters: &[(String, String)]) -> Result<Value, ApiError> {
        self.make_request(ApiRequest::get(GALLERY_PATH).action("list").filters(filters))
            .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_gallery_item(&self, id: &str) -> Result<Value, ApiError> {
        self.make_request(ApiRequest::get(GALLERY_PATH).action("item").query("id", id))
            .await
    }

    /// Uploads a file as multipart form data. No `Content-Type` is set here so
    /// the transport can add the multipart boundary.
    ///
    /// # Errors
    /// Returns an error if the request fails.
    pub async fn upload_file(&self, form: Form) -> Result<Value, ApiError> {
        self.make_request(
            ApiRequest::post(GALLERY_PATH)
                .action("upload")
                .multipart(form)
                .without_content_type(),
        )
        .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn toggle_like(&self, item_id: impl Into<Value>) -> Result<Value, ApiError> {
        self.make_request(
            ApiRequest::post(GALLERY_PATH)
                .action("like")
                .json(json!({ "item_id": item_id.into() })),
        )
        .await
    }

    /// # Errors
    /// Returns an error if the request fails.
    pub async fn get_gallery_stats(&self) -> Result<Value, ApiError> {
        self.make_request(ApiRequest::get(GALLERY_PATH).action("stats"))
            .await
    }
}
