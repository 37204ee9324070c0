// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Submission encoder: picks JSON or multipart from the image state and sends the update.

use crate::api::{FieldApi, MultipartFile, MultipartForm};
use crate::error::{ApiError, ApiResult};
use crate::models::field::Field;
use crate::models::form::UpdatePayload;
use crate::models::image::{ImageState, SelectedImage};

/// Multipart part carrying the new image.
pub const IMAGE_FIELD: &str = "imageUrl";
/// JSON flag asking the API to delete the current image.
pub const REMOVE_IMAGE_KEY: &str = "removeImage";

/// Update body, decided before any I/O happens.
#[derive(Clone, Debug, PartialEq)]
pub enum UpdateRequest {
    Json(serde_json::Value),
    Multipart {
        text: Vec<(String, String)>,
        image: SelectedImage,
    },
}

impl UpdateRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            UpdateRequest::Json(_) => "json",
            UpdateRequest::Multipart { .. } => "multipart",
        }
    }
}

/// Choose the body shape.
///
/// - removed and no file: JSON with `removeImage: true`
/// - file selected: multipart with every payload entry stringified plus the file
/// - otherwise: plain JSON
///
/// # Errors
///
/// Only fails if the payload cannot be represented as JSON.
pub fn encode<P>(payload: &UpdatePayload, image: &ImageState<P>) -> ApiResult<UpdateRequest> {
    let file = image.selected_file();

    if image.is_removed() && file.is_none() {
        let mut body = to_json(payload)?;
        if let Some(map) = body.as_object_mut() {
            map.insert(REMOVE_IMAGE_KEY.to_string(), serde_json::Value::Bool(true));
        }
        return Ok(UpdateRequest::Json(body));
    }

    if let Some(file) = file {
        let text = payload
            .string_entries()
            .into_iter()
            .map(|(key, value)| (key.to_string(), value))
            .collect();
        return Ok(UpdateRequest::Multipart {
            text,
            image: file.clone(),
        });
    }

    Ok(UpdateRequest::Json(to_json(payload)?))
}

fn to_json(payload: &UpdatePayload) -> ApiResult<serde_json::Value> {
    serde_json::to_value(payload).map_err(|err| ApiError::Decode(err.to_string()))
}

/// Perform the single outbound update call for an encoded request.
///
/// # Errors
///
/// Propagates API failures and failures to read the selected image.
pub fn dispatch(api: &dyn FieldApi, field_id: i64, request: UpdateRequest) -> ApiResult<Field> {
    tracing::info!(field_id, kind = request.kind(), "submitting field update");
    match request {
        UpdateRequest::Json(body) => api.update_field(field_id, &body),
        UpdateRequest::Multipart { text, image } => {
            let bytes = std::fs::read(&image.path).map_err(|source| ApiError::Io {
                path: image.path.display().to_string(),
                source,
            })?;
            let form = MultipartForm {
                text,
                file: MultipartFile {
                    name: IMAGE_FIELD.to_string(),
                    file_name: image.file_name,
                    mime: image.mime,
                    bytes,
                },
            };
            api.update_field_with_image(field_id, form)
        }
    }
}
