// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Reference data loader: field, owning branch (or the fallback list), and field types.
//!
//! The pipeline runs in a fixed order and stops at the first fatal step:
//! 1. parse the route identifiers,
//! 2. fetch the field,
//! 3. resolve the route's branch, falling back to the operator's branch list,
//! 4. fetch the field type catalog.
//!
//! Results of steps that completed before a failure are kept in the report.

use std::fmt;

use crate::api::{BranchApi, FieldApi};
use crate::error::{ApiError, ApiResult};
use crate::models::field::{Branch, Field, FieldType};

/// Raw path segments of `/branches/{branch_id}/fields/{field_id}/edit`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RouteParams {
    pub branch_id: String,
    pub field_id: String,
}

/// Parsed route identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteIds {
    pub branch_id: i64,
    pub field_id: i64,
}

/// Pipeline stage, used for logging and error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStep {
    Route,
    Field,
    Branches,
    FieldTypes,
}

impl fmt::Display for LoadStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LoadStep::Route => "route",
            LoadStep::Field => "field",
            LoadStep::Branches => "branches",
            LoadStep::FieldTypes => "field types",
        })
    }
}

/// Branch options offered to the operator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BranchCatalog {
    pub branches: Vec<Branch>,
    /// Set when the route's branch was resolved; the selector is then disabled.
    pub locked: bool,
}

/// Everything the loader learned, step by step.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub ids: Option<RouteIds>,
    pub field: Option<Field>,
    pub branches: Option<BranchCatalog>,
    pub field_types: Option<Vec<FieldType>>,
    /// Recovered problems the operator should still hear about.
    pub notices: Vec<String>,
    pub error: Option<(LoadStep, ApiError)>,
}

impl LoadReport {
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }
}

/// Parse both route identifiers as non-negative integers.
///
/// # Errors
///
/// Returns [`ApiError::InvalidIdentifier`] naming the offending segment.
pub fn parse_route(route: &RouteParams) -> ApiResult<RouteIds> {
    Ok(RouteIds {
        branch_id: parse_id(&route.branch_id)?,
        field_id: parse_id(&route.field_id)?,
    })
}

fn parse_id(raw: &str) -> ApiResult<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id >= 0)
        .ok_or_else(|| ApiError::InvalidIdentifier(raw.to_string()))
}

/// Run the whole pipeline. Never panics; failures end up in [`LoadReport::error`].
pub fn load(route: &RouteParams, fields: &dyn FieldApi, branches: &dyn BranchApi) -> LoadReport {
    let mut report = LoadReport::default();
    if let Err((step, err)) = run_pipeline(route, fields, branches, &mut report) {
        tracing::error!(%step, error = %err, "loading field failed");
        report.error = Some((step, err));
    }
    report
}

fn run_pipeline(
    route: &RouteParams,
    fields: &dyn FieldApi,
    branches: &dyn BranchApi,
    report: &mut LoadReport,
) -> Result<(), (LoadStep, ApiError)> {
    let ids = parse_route(route).map_err(|e| (LoadStep::Route, e))?;
    report.ids = Some(ids);

    tracing::debug!(field_id = ids.field_id, "fetching field");
    let field = fields
        .get_field_by_id(ids.field_id)
        .map_err(|e| (LoadStep::Field, e))?;
    report.field = Some(field);

    let catalog = resolve_branches(branches, ids.branch_id, &mut report.notices)
        .map_err(|e| (LoadStep::Branches, e))?;
    report.branches = Some(catalog);

    tracing::debug!("fetching field types");
    let field_types = fields
        .get_field_types()
        .map_err(|e| (LoadStep::FieldTypes, e))?;
    report.field_types = Some(field_types);

    Ok(())
}

/// The route's branch when it resolves, else every branch the operator may use.
/// A lookup that succeeds without a branch leaves the catalog empty and unlocked.
fn resolve_branches(
    api: &dyn BranchApi,
    branch_id: i64,
    notices: &mut Vec<String>,
) -> ApiResult<BranchCatalog> {
    tracing::debug!(branch_id, "fetching branch");
    match api.get_branch_by_id(branch_id) {
        Ok(Some(branch)) => Ok(BranchCatalog {
            branches: vec![branch],
            locked: true,
        }),
        Ok(None) => {
            tracing::debug!(branch_id, "branch lookup returned no branch");
            Ok(BranchCatalog::default())
        }
        Err(err) => {
            tracing::warn!(branch_id, error = %err, "branch lookup failed; using branch list");
            notices.push(format!(
                "Failed to load branch {branch_id}: {err}. Choose the branch from your list."
            ));
            let branches = api.get_user_branches()?;
            Ok(BranchCatalog {
                branches,
                locked: false,
            })
        }
    }
}
