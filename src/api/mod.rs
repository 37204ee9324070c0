// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Contracts of the booking API collaborators used by the edit session.

pub mod http;

use serde::Deserialize;

use crate::error::ApiResult;
use crate::models::field::{Branch, Field, FieldType};

pub use http::HttpApi;

/// Field endpoints.
pub trait FieldApi: Send + Sync {
    fn get_field_by_id(&self, field_id: i64) -> ApiResult<Field>;
    fn get_field_types(&self) -> ApiResult<Vec<FieldType>>;
    /// Partial update with a JSON body.
    fn update_field(&self, field_id: i64, payload: &serde_json::Value) -> ApiResult<Field>;
    /// Partial update with a multipart body carrying the image.
    fn update_field_with_image(&self, field_id: i64, form: MultipartForm) -> ApiResult<Field>;
}

/// Branch endpoints.
pub trait BranchApi: Send + Sync {
    /// `Ok(None)` when the lookup succeeded but carried no branch.
    fn get_branch_by_id(&self, branch_id: i64) -> ApiResult<Option<Branch>>;
    /// Branches the signed-in operator may manage.
    fn get_user_branches(&self) -> ApiResult<Vec<Branch>>;
}

/// Multipart body independent of the HTTP client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartForm {
    pub text: Vec<(String, String)>,
    pub file: MultipartFile,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartFile {
    /// Form part name.
    pub name: String,
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// `{ "data": ... }` wrapper used by the branch endpoints.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub data: Option<T>,
}

/// Body that may or may not be wrapped in an [`Envelope`].
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum MaybeWrapped<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> MaybeWrapped<T> {
    pub fn into_inner(self) -> T {
        match self {
            MaybeWrapped::Wrapped { data } | MaybeWrapped::Bare(data) => data,
        }
    }
}

#[cfg(test)]
pub(crate) mod fake;
