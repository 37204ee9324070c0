// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Scripted in-memory API used by unit tests; records every call in order.

use std::sync::Mutex;

use crate::api::{BranchApi, FieldApi, MultipartForm};
use crate::error::{ApiError, ApiResult};
use crate::models::field::{Branch, Field, FieldType};

#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    GetField(i64),
    GetFieldTypes,
    GetBranch(i64),
    GetUserBranches,
    UpdateJson(i64, serde_json::Value),
    UpdateMultipart(i64, MultipartForm),
}

#[derive(Default)]
pub struct FakeApi {
    pub field: Option<Field>,
    pub branch: Option<Branch>,
    /// Branch lookup succeeds but carries no branch.
    pub branch_without_data: bool,
    pub user_branches: Option<Vec<Branch>>,
    pub field_types: Vec<FieldType>,
    pub fail_update: bool,
    pub calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    /// Field 42 "Court A" in branch 5 with a remote image, branch 5 resolvable.
    pub fn court_a() -> Self {
        Self {
            field: Some(court_a()),
            branch: Some(branch(5, "Main Branch")),
            user_branches: Some(vec![branch(5, "Main Branch"), branch(7, "North")]),
            field_types: vec![
                FieldType {
                    id: 1,
                    name: "Futsal".into(),
                },
                FieldType {
                    id: 2,
                    name: "Badminton".into(),
                },
            ],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: Call) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }
}

pub fn branch(id: i64, name: &str) -> Branch {
    Branch {
        id,
        name: name.to_string(),
    }
}

pub fn court_a() -> Field {
    serde_json::from_value(serde_json::json!({
        "id": 42,
        "name": "Court A",
        "typeId": 1,
        "branchId": 5,
        "priceDay": "100000",
        "priceNight": "150000",
        "status": "available",
        "imageUrl": "http://x/img.png"
    }))
    .expect("fixture field")
}

impl FieldApi for FakeApi {
    fn get_field_by_id(&self, field_id: i64) -> ApiResult<Field> {
        self.record(Call::GetField(field_id));
        self.field
            .clone()
            .filter(|f| f.id == field_id)
            .ok_or(ApiError::NotFound {
                entity: "field",
                id: field_id,
            })
    }

    fn get_field_types(&self) -> ApiResult<Vec<FieldType>> {
        self.record(Call::GetFieldTypes);
        Ok(self.field_types.clone())
    }

    fn update_field(&self, field_id: i64, payload: &serde_json::Value) -> ApiResult<Field> {
        self.record(Call::UpdateJson(field_id, payload.clone()));
        if self.fail_update {
            return Err(ApiError::Network("connection reset".into()));
        }
        Ok(self.field.clone().unwrap_or_default())
    }

    fn update_field_with_image(&self, field_id: i64, form: MultipartForm) -> ApiResult<Field> {
        self.record(Call::UpdateMultipart(field_id, form));
        if self.fail_update {
            return Err(ApiError::Network("connection reset".into()));
        }
        Ok(self.field.clone().unwrap_or_default())
    }
}

impl BranchApi for FakeApi {
    fn get_branch_by_id(&self, branch_id: i64) -> ApiResult<Option<Branch>> {
        self.record(Call::GetBranch(branch_id));
        if self.branch_without_data {
            return Ok(None);
        }
        self.branch
            .clone()
            .filter(|b| b.id == branch_id)
            .map(Some)
            .ok_or(ApiError::Network("branch service unavailable".into()))
    }

    fn get_user_branches(&self) -> ApiResult<Vec<Branch>> {
        self.record(Call::GetUserBranches);
        self.user_branches
            .clone()
            .ok_or(ApiError::Network("branch list unavailable".into()))
    }
}
