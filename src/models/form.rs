// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Editable form state, its validation schema, and the coerced update payload.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::models::field::{Field, FieldStatus};

/// Minimum number of characters for a field name.
pub const NAME_MIN_LEN: usize = 3;

/// String mirror of the editable subset of a [`Field`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FormValues {
    pub name: String,
    pub type_id: String,
    pub branch_id: String,
    pub price_day: String,
    pub price_night: String,
    pub status: String,
}

impl FormValues {
    /// Mirror a remote field; absent attributes become empty, status defaults to `available`.
    pub fn from_field(field: &Field) -> Self {
        Self {
            name: field.name.clone(),
            type_id: field.type_id.map(|id| id.to_string()).unwrap_or_default(),
            branch_id: field.branch_id.map(|id| id.to_string()).unwrap_or_default(),
            price_day: field.price_day.clone().unwrap_or_default(),
            price_night: field.price_night.clone().unwrap_or_default(),
            status: field
                .status
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| FieldStatus::default().as_str().to_string()),
        }
    }

    /// Current value of one input.
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::TypeId => &self.type_id,
            FormField::BranchId => &self.branch_id,
            FormField::PriceDay => &self.price_day,
            FormField::PriceNight => &self.price_night,
            FormField::Status => &self.status,
        }
    }
}

/// Inputs of the edit form, in display order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    TypeId,
    BranchId,
    PriceDay,
    PriceNight,
    Status,
}

impl FormField {
    /// Key used for the field in update payloads.
    pub fn key(&self) -> &'static str {
        match self {
            FormField::Name => "name",
            FormField::TypeId => "typeId",
            FormField::BranchId => "branchId",
            FormField::PriceDay => "priceDay",
            FormField::PriceNight => "priceNight",
            FormField::Status => "status",
        }
    }
}

/// Per-input validation messages.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<FormField, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn clear(&mut self, field: FormField) {
        self.errors.remove(&field);
    }

    pub fn iter(&self) -> impl Iterator<Item = (FormField, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }

    fn insert(&mut self, field: FormField, message: &str) {
        self.errors.entry(field).or_insert_with(|| message.to_string());
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined: Vec<&str> = self.iter().map(|(_, message)| message).collect();
        write!(f, "{}", joined.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

/// Coerced payload sent to the update endpoints.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePayload {
    pub name: String,
    pub type_id: i64,
    pub branch_id: i64,
    pub price_day: f64,
    pub price_night: f64,
    pub status: FieldStatus,
}

impl UpdatePayload {
    /// Each payload entry in its string form, in payload order (used for multipart bodies).
    pub fn string_entries(&self) -> Vec<(&'static str, String)> {
        vec![
            (FormField::Name.key(), self.name.clone()),
            (FormField::TypeId.key(), self.type_id.to_string()),
            (FormField::BranchId.key(), self.branch_id.to_string()),
            (FormField::PriceDay.key(), self.price_day.to_string()),
            (FormField::PriceNight.key(), self.price_night.to_string()),
            (FormField::Status.key(), self.status.as_str().to_string()),
        ]
    }
}

/// Run the validation schema against the raw strings, then coerce.
///
/// # Errors
///
/// Returns every failing input with its message; nothing is coerced in that case.
pub fn validate(values: &FormValues) -> Result<UpdatePayload, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if values.name.chars().count() < NAME_MIN_LEN {
        errors.insert(FormField::Name, "Field name must be at least 3 characters.");
    }

    let type_id = required_id(values, FormField::TypeId, "Please choose a field type.", &mut errors);
    let branch_id = required_id(values, FormField::BranchId, "Please choose a branch.", &mut errors);

    let price_day = required_price(values, FormField::PriceDay, "Day price is required.", &mut errors);
    let price_night =
        required_price(values, FormField::PriceNight, "Night price is required.", &mut errors);

    let status = if values.status.is_empty() {
        errors.insert(FormField::Status, "Please choose a status.");
        None
    } else {
        let parsed = FieldStatus::parse(&values.status);
        if parsed.is_none() {
            errors.insert(FormField::Status, "Unknown status.");
        }
        parsed
    };

    match (type_id, branch_id, price_day, price_night, status) {
        (Some(type_id), Some(branch_id), Some(price_day), Some(price_night), Some(status))
            if errors.is_empty() =>
        {
            Ok(UpdatePayload {
                name: values.name.clone(),
                type_id,
                branch_id,
                price_day,
                price_night,
                status,
            })
        }
        _ => Err(errors),
    }
}

fn required_id(
    values: &FormValues,
    field: FormField,
    missing: &str,
    errors: &mut ValidationErrors,
) -> Option<i64> {
    let raw = values.get(field);
    if raw.is_empty() {
        errors.insert(field, missing);
        return None;
    }
    match raw.parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.insert(field, "Invalid selection.");
            None
        }
    }
}

fn required_price(
    values: &FormValues,
    field: FormField,
    missing: &str,
    errors: &mut ValidationErrors,
) -> Option<f64> {
    let raw = values.get(field);
    if raw.is_empty() {
        errors.insert(field, missing);
        return None;
    }
    if !raw.chars().all(|c| c.is_ascii_digit()) {
        errors.insert(field, "Price must be a number.");
        return None;
    }
    raw.parse::<f64>().ok()
}
