//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, multipart uploads)
//! 2. Calls into `services` for the business logic
//! 3. Returns HTTP response (JSON, CSV download, redirect or image)

use axum::{
    extract::Multipart,
    http::header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{error::AppError, services::export_service::CSV_CONTENT_TYPE};

/// Admin dashboard, users, subscriptions and investor management
pub mod admin;
/// Signup, login and logout
pub mod auth;
/// Mailbox connection, sending and open tracking
pub mod email;
/// Founder-facing read endpoints
pub mod founder;
/// Liveness probe
pub mod health;
/// Razorpay checkout
pub mod payments;

/// `{message, data}` body returned by mutating endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse<T> {
    pub message: &'static str,
    pub data: T,
}

impl<T> MessageResponse<T> {
    pub fn new(message: &'static str, data: T) -> Self {
        Self { message, data }
    }
}

/// Attachment response for a generated CSV file.
pub fn csv_download(filename: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (CONTENT_TYPE, CSV_CONTENT_TYPE.to_string()),
            (
                CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// Uploaded spreadsheet: original filename and raw bytes.
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Read the multipart field named `file`.
pub async fn read_upload(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::InvalidRequest(format!("Malformed upload: {err}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| AppError::InvalidRequest(format!("Malformed upload: {err}")))?;
        if bytes.is_empty() {
            break;
        }
        return Ok(Upload {
            filename,
            bytes: bytes.to_vec(),
        });
    }

    Err(AppError::InvalidRequest("No file uploaded".to_string()))
}
