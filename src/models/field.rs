// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Remote entities read by the edit session: the field under edit and its reference catalogs.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Bookable venue (court) as returned by the booking API.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub type_id: Option<i64>,
    #[serde(default)]
    pub branch_id: Option<i64>,
    /// Day price in its textual form; the API sends either a number or a numeric string.
    #[serde(default, deserialize_with = "price_text")]
    pub price_day: Option<String>,
    #[serde(default, deserialize_with = "price_text")]
    pub price_night: Option<String>,
    /// Raw status string; unknown values are kept so validation can flag them.
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Branch (venue location) that owns fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Branch {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Entry of the read-only field type catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldType {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}

/// Booking status of a field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldStatus {
    #[default]
    Available,
    Booked,
    Maintenance,
    Closed,
}

impl FieldStatus {
    pub const ALL: [FieldStatus; 4] = [
        FieldStatus::Available,
        FieldStatus::Booked,
        FieldStatus::Maintenance,
        FieldStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldStatus::Available => "available",
            FieldStatus::Booked => "booked",
            FieldStatus::Maintenance => "maintenance",
            FieldStatus::Closed => "closed",
        }
    }

    /// Parse the wire representation; exact, lowercase match only.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == raw)
    }
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accept `100000`, `100000.5`, `"100000"` or `null` and keep the text.
fn price_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        Some(serde_json::Value::String(s)) => Some(s),
        _ => None,
    })
}
