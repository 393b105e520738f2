use crate::cli::{
    actions::{open_context, print_json},
    globals::GlobalArgs,
};
use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum Command {
    List { filters: Vec<(String, String)> },
    Item { id: String },
    Stats,
    Like { id: String },
    Upload {
        file: PathBuf,
        fields: Vec<(String, String)>,
    },
}

#[derive(Debug)]
pub struct Args {
    pub globals: GlobalArgs,
    pub command: Command,
}

/// Numeric ids go out as JSON numbers, anything else as text.
fn item_id(id: &str) -> Value {
    id.parse::<i64>().map_or_else(|_| Value::from(id), Value::from)
}

/// Multipart form with the file under `file` plus any extra text fields.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub async fn upload_form(file: &Path, fields: &[(String, String)]) -> Result<Form> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map_or_else(|| "upload".to_string(), |name| name.to_string_lossy().into_owned());

    let form = fields.iter().fold(
        Form::new().part("file", Part::bytes(bytes).file_name(file_name)),
        |form, (key, value)| form.text(key.clone(), value.clone()),
    );

    Ok(form)
}

/// # Errors
/// Returns an error if the backend rejects the request or is unreachable.
pub async fn execute(args: Args) -> Result<()> {
    let context = open_context(&args.globals).await?;
    let api = &context.api;

    let response = match args.command {
        Command::List { filters } => api.get_gallery_items(&filters).await?,
        Command::Item { id } => api.get_gallery_item(&id).await?,
        Command::Stats => api.get_gallery_stats().await?,
        Command::Like { id } => api.toggle_like(item_id(&id)).await?,
        Command::Upload { file, fields } => api.upload_file(upload_form(&file, &fields).await?).await?,
    };

    print_json(&response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_ids_stay_numeric() {
        assert_eq!(item_id("42"), Value::from(42));
        assert_eq!(item_id("photo-42"), Value::from("photo-42"));
    }

    #[tokio::test]
    async fn upload_form_requires_a_readable_file() {
        let missing = std::env::temp_dir().join(format!("cousinsvault-{}.jpg", ulid::Ulid::new()));
        assert!(upload_form(&missing, &[]).await.is_err());
    }
}
