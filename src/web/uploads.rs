use std::path::Path;

use axum::extract::Multipart;
use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::web::error::AppError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ImagePathError {
    #[error("empty image path")]
    Empty,
    #[error("image path has no file name: {0}")]
    NoFileName(String),
}

/// Derives the display file name from a stored image path by taking its
/// final `/`-separated segment. Malformed paths (empty, no directory part,
/// or a trailing slash) are an explicit error rather than a panic.
pub fn display_name(stored: &str) -> Result<&str, ImagePathError> {
    if stored.is_empty() {
        return Err(ImagePathError::Empty);
    }
    match stored.rsplit_once('/') {
        Some((_, name)) if !name.is_empty() => Ok(name),
        _ => Err(ImagePathError::NoFileName(stored.to_string())),
    }
}

/// An uploaded file pulled out of a multipart form.
pub struct UploadedImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Raw field values of the event form, before validation.
#[derive(Default)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub date: String,
    pub tag_ids: Vec<i32>,
    pub image: Option<UploadedImage>,
}

/// Validated event fields, ready for the services layer.
#[derive(Debug)]
pub struct ValidatedEvent {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub tag_ids: Vec<i32>,
}

/// Drains the multipart stream of the add/edit event form. Unknown fields
/// are skipped; a file part with an empty file name counts as "no upload".
pub async fn read_event_form(mut multipart: Multipart) -> Result<EventForm, AppError> {
    let mut form = EventForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::Media(err.to_string()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "title" => {
                form.title = field
                    .text()
                    .await
                    .map_err(|err| AppError::Media(err.to_string()))?;
            }
            "description" => {
                form.description = field
                    .text()
                    .await
                    .map_err(|err| AppError::Media(err.to_string()))?;
            }
            "date" => {
                form.date = field
                    .text()
                    .await
                    .map_err(|err| AppError::Media(err.to_string()))?;
            }
            "tags" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|err| AppError::Media(err.to_string()))?;
                if let Ok(id) = raw.trim().parse::<i32>() {
                    form.tag_ids.push(id);
                }
            }
            "image" => {
                let file_name = field.file_name().map(str::to_owned).unwrap_or_default();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::Media(err.to_string()))?;
                if !file_name.is_empty() && !bytes.is_empty() {
                    form.image = Some(UploadedImage {
                        file_name,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Checks the submitted field values; `require_image` is true on add, where
/// an event without a picture is not accepted.
pub fn validate_event_form(
    form: &EventForm,
    require_image: bool,
) -> Result<ValidatedEvent, Vec<String>> {
    let mut errors = Vec::new();

    let title = form.title.trim();
    if title.is_empty() {
        errors.push("Title is required.".to_string());
    }

    let date = parse_form_date(&form.date);
    if date.is_none() {
        errors.push("A valid date is required.".to_string());
    }

    if form.tag_ids.is_empty() {
        errors.push("Pick at least one tag.".to_string());
    }

    if require_image && form.image.is_none() {
        errors.push("An image is required.".to_string());
    }

    match (errors.is_empty(), date) {
        (true, Some(date)) => Ok(ValidatedEvent {
            title: title.to_string(),
            description: form.description.trim().to_string(),
            date,
            tag_ids: form.tag_ids.clone(),
        }),
        _ => Err(errors),
    }
}

/// Accepts the `datetime-local` wire format, with or without seconds.
pub fn parse_form_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Writes the uploaded image under `<media_root>/events/<token>/` and
/// returns the path stored on the event (relative, served under `/media`).
/// Any path components a client smuggles into the file name are dropped.
pub async fn store_image(media_root: &Path, image: &UploadedImage) -> Result<String, AppError> {
    let file_name = Path::new(&image.file_name)
        .file_name()
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::Media(format!("unusable file name: {}", image.file_name)))?
        .to_owned();

    let token = Uuid::new_v4().to_string();
    let dir = media_root.join("events").join(&token);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|err| AppError::Media(err.to_string()))?;
    tokio::fs::write(dir.join(&file_name), &image.bytes)
        .await
        .map_err(|err| AppError::Media(err.to_string()))?;

    Ok(format!("media/events/{token}/{file_name}"))
}
