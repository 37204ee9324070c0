// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Blocking HTTP implementation of the booking API, run from command workers.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, multipart};
use serde::de::DeserializeOwned;
use url::Url;

use crate::api::{BranchApi, Envelope, FieldApi, MaybeWrapped, MultipartForm};
use crate::config::AppConfig;
use crate::error::{ApiError, ApiResult};
use crate::models::field::{Branch, Field, FieldType};

/// REST client bound to one API base URL.
pub struct HttpApi {
    client: Client,
    base: Url,
    token: Option<String>,
}

impl HttpApi {
    /// Build a client from the application settings.
    ///
    /// # Errors
    ///
    /// Fails when the base URL is invalid or the TLS backend cannot start.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base: config.api_base()?,
            token: config.api_token.clone(),
        })
    }

    fn url(&self, path: &str) -> ApiResult<Url> {
        self.base
            .join(path)
            .map_err(|err| ApiError::Network(format!("invalid request path {path}: {err}")))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn send<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        entity: &'static str,
        id: i64,
    ) -> ApiResult<T> {
        let response = self.authorized(request).send()?;
        let status = response.status();
        let body = response.text()?;
        decode_body(status, &body, entity, id)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, entity: &'static str, id: i64) -> ApiResult<T> {
        tracing::debug!(path, "GET");
        self.send(self.client.get(self.url(path)?), entity, id)
    }
}

impl FieldApi for HttpApi {
    fn get_field_by_id(&self, field_id: i64) -> ApiResult<Field> {
        let body: MaybeWrapped<Field> = self.get(&format!("fields/{field_id}"), "field", field_id)?;
        Ok(body.into_inner())
    }

    fn get_field_types(&self) -> ApiResult<Vec<FieldType>> {
        let body: Option<MaybeWrapped<Option<Vec<FieldType>>>> =
            self.get("field-types", "field types", 0)?;
        Ok(body.and_then(MaybeWrapped::into_inner).unwrap_or_default())
    }

    fn update_field(&self, field_id: i64, payload: &serde_json::Value) -> ApiResult<Field> {
        tracing::debug!(field_id, "PUT json");
        let request = self
            .client
            .put(self.url(&format!("fields/{field_id}"))?)
            .json(payload);
        let body: MaybeWrapped<Field> = self.send(request, "field", field_id)?;
        Ok(body.into_inner())
    }

    fn update_field_with_image(&self, field_id: i64, form: MultipartForm) -> ApiResult<Field> {
        tracing::debug!(field_id, file = %form.file.file_name, "PUT multipart");
        let mut body = multipart::Form::new();
        for (key, value) in form.text {
            body = body.text(key, value);
        }
        let part = multipart::Part::bytes(form.file.bytes)
            .file_name(form.file.file_name)
            .mime_str(&form.file.mime)?;
        body = body.part(form.file.name, part);

        let request = self
            .client
            .put(self.url(&format!("fields/{field_id}"))?)
            .multipart(body);
        let body: MaybeWrapped<Field> = self.send(request, "field", field_id)?;
        Ok(body.into_inner())
    }
}

impl BranchApi for HttpApi {
    fn get_branch_by_id(&self, branch_id: i64) -> ApiResult<Option<Branch>> {
        let body: Envelope<Branch> =
            self.get(&format!("branches/{branch_id}"), "branch", branch_id)?;
        Ok(body.data)
    }

    fn get_user_branches(&self) -> ApiResult<Vec<Branch>> {
        let body: Envelope<Vec<Branch>> = self.get("branches/user", "branches", 0)?;
        Ok(body.data.unwrap_or_default())
    }
}

/// Map an HTTP status and body onto the API error taxonomy.
fn decode_body<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
    entity: &'static str,
    id: i64,
) -> ApiResult<T> {
    if status == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound { entity, id });
    }
    if !status.is_success() {
        let snippet: String = body.chars().take(200).collect();
        return Err(ApiError::Network(format!("HTTP {status}: {snippet}")));
    }
    let body = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(body).map_err(|err| ApiError::Decode(err.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_status_maps_to_not_found() {
        let result: ApiResult<Field> = decode_body(StatusCode::NOT_FOUND, "", "field", 42);
        assert!(matches!(
            result,
            Err(ApiError::NotFound {
                entity: "field",
                id: 42
            })
        ));
    }

    #[test]
    fn server_error_maps_to_network() {
        let result: ApiResult<Field> =
            decode_body(StatusCode::INTERNAL_SERVER_ERROR, "boom", "field", 42);
        match result {
            Err(ApiError::Network(msg)) => assert!(msg.contains("500")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn field_body_may_be_wrapped_or_bare() {
        let bare: MaybeWrapped<Field> =
            decode_body(StatusCode::OK, r#"{"id":42,"name":"Court A"}"#, "field", 42).unwrap();
        let wrapped: MaybeWrapped<Field> = decode_body(
            StatusCode::OK,
            r#"{"data":{"id":42,"name":"Court A"}}"#,
            "field",
            42,
        )
        .unwrap();

        assert_eq!(bare.into_inner().name, "Court A");
        assert_eq!(wrapped.into_inner().id, 42);
    }

    #[test]
    fn branch_envelope_with_or_without_data() {
        let found: Envelope<Branch> = decode_body(
            StatusCode::OK,
            r#"{"data":{"id":5,"name":"Main Branch"}}"#,
            "branch",
            5,
        )
        .unwrap();
        let empty: Envelope<Branch> = decode_body(StatusCode::OK, "{}", "branch", 5).unwrap();

        assert_eq!(found.data.map(|b| b.name), Some("Main Branch".to_string()));
        assert!(empty.data.is_none());
    }

    #[test]
    fn branch_list_without_data_is_empty() {
        let body: Envelope<Vec<Branch>> =
            decode_body(StatusCode::OK, r#"{"message":"ok"}"#, "branches", 0).unwrap();
        assert!(body.data.unwrap_or_default().is_empty());
    }

    #[test]
    fn empty_field_type_body_decodes_to_none() {
        let body: Option<MaybeWrapped<Option<Vec<FieldType>>>> =
            decode_body(StatusCode::OK, "", "field types", 0).unwrap();
        assert!(body.and_then(MaybeWrapped::into_inner).is_none());
    }

    #[test]
    fn invalid_json_maps_to_decode() {
        let result: ApiResult<Branch> = decode_body(StatusCode::OK, "<html>", "branch", 1);
        assert!(matches!(result, Err(ApiError::Decode(_))));
    }
}
