// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Root Model-View-Update kernel for the field edit session.
//!
//! The model owns the form values, reference catalogs, image state and the
//! loading/submitting flags. Network work and dialogs are issued as
//! [`Command`]s and come back as [`Msg`]s tagged with the session generation;
//! results from an older generation (a page that was left) are dropped.

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{BranchApi, FieldApi};
use crate::logic::loader::{self, LoadReport, RouteIds, RouteParams};
use crate::logic::submit::{self, UpdateRequest};
use crate::models::field::{Branch, Field, FieldType};
use crate::models::form::{self, FormField, FormValues, ValidationErrors};
use crate::models::image::ACCEPTED_EXTENSIONS;
use crate::ui::components::image::{self, ImageCommand, ImageModel, ImageMsg};

/// Where the operator goes after leaving the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    BranchDetail { branch_id: i64 },
    /// Route branch id was unusable; fall back to the branch overview.
    Branches,
}

impl Route {
    /// Dashboard path of the route.
    pub fn page_path(&self) -> String {
        match self {
            Route::BranchDetail { branch_id } => format!("dashboard/branches/{branch_id}"),
            Route::Branches => "dashboard/branches".to_string(),
        }
    }
}

/// Top-level session state.
#[derive(Default)]
pub struct AppModel {
    /// Path segments the session was opened with.
    pub route: RouteParams,
    /// Parsed identifiers once the loader accepted the route.
    pub ids: Option<RouteIds>,
    /// Field as last loaded from the API.
    pub field: Option<Field>,
    pub form: FormValues,
    pub errors: ValidationErrors,
    pub branches: Vec<Branch>,
    /// Branch selector disabled because the route's branch was resolved.
    pub branch_locked: bool,
    pub field_types: Vec<FieldType>,
    pub image: ImageModel,
    pub loading: bool,
    pub submitting: bool,
    /// Last load stopped on a fatal error; a reload is offered.
    pub load_failed: bool,
    /// Latest status message to display.
    pub status: Option<String>,
    /// Latest error message to display in modal.
    pub error: Option<String>,
    /// Count of queued background commands.
    pub pending_commands: usize,
    /// Set once the session hands off to navigation.
    pub navigation: Option<Route>,
    generation: u64,
}

impl AppModel {
    pub fn new(route: RouteParams) -> Self {
        Self {
            route,
            ..Default::default()
        }
    }

    /// Loading or submitting; new loads and submits are refused meanwhile.
    pub fn is_busy(&self) -> bool {
        self.loading || self.submitting
    }

    /// Display name of the branch currently chosen in the form.
    pub fn branch_name(&self) -> Option<&str> {
        self.branches
            .iter()
            .find(|b| b.id.to_string() == self.form.branch_id)
            .map(|b| b.name.as_str())
    }
}

/// Application messages routed through the update function.
pub enum Msg {
    NameChanged(String),
    TypeSelected(String),
    BranchSelected(String),
    PriceDayChanged(String),
    PriceNightChanged(String),
    StatusSelected(String),
    Image(ImageMsg),
    /// Decoded pixels; the UI turns them into a texture and sends `ImageMsg::PreviewReady`.
    PreviewDecoded {
        path: PathBuf,
        image: eframe::egui::ColorImage,
    },
    LoadRequested,
    /// Operator asked to retry after a failed load.
    ReloadRequested,
    LoadCompleted {
        generation: u64,
        report: LoadReport,
    },
    SubmitRequested,
    SubmitCompleted {
        generation: u64,
        result: Result<Field, String>,
    },
    BackRequested,
    DismissError,
}

/// Commands represent side-effects executed between frames.
#[derive(Debug)]
pub enum Command {
    Load {
        generation: u64,
        route: RouteParams,
    },
    PickImage,
    LoadPreview {
        path: PathBuf,
    },
    SubmitUpdate {
        generation: u64,
        field_id: i64,
        request: UpdateRequest,
    },
}

/// API collaborators shared by the command workers.
#[derive(Clone)]
pub struct Services {
    pub fields: Arc<dyn FieldApi>,
    pub branches: Arc<dyn BranchApi>,
}

/// Update the application model and enqueue commands.
pub fn update(model: &mut AppModel, msg: Msg, cmds: &mut Vec<Command>) {
    match msg {
        Msg::NameChanged(text) => edit(model, FormField::Name, text),
        Msg::TypeSelected(id) => edit(model, FormField::TypeId, id),
        Msg::BranchSelected(id) => {
            if model.branch_locked {
                tracing::debug!("branch selection ignored while locked");
            } else {
                edit(model, FormField::BranchId, id);
            }
        }
        Msg::PriceDayChanged(text) => edit(model, FormField::PriceDay, text),
        Msg::PriceNightChanged(text) => edit(model, FormField::PriceNight, text),
        Msg::StatusSelected(status) => edit(model, FormField::Status, status),
        Msg::DismissError => model.error = None,
        Msg::Image(m) => update_image(model, m, cmds),
        // Texture creation needs the egui context; the app shell converts this message.
        Msg::PreviewDecoded { .. } => {}
        Msg::LoadRequested | Msg::ReloadRequested => {
            if model.is_busy() {
                tracing::debug!("load ignored while busy");
                return;
            }
            model.generation += 1;
            model.loading = true;
            model.load_failed = false;
            model.status = Some("Loading field...".into());
            cmds.push(Command::Load {
                generation: model.generation,
                route: model.route.clone(),
            });
        }
        Msg::LoadCompleted { generation, report } => {
            if generation != model.generation {
                tracing::debug!(generation, "dropping stale load result");
                return;
            }
            apply_report(model, report);
        }
        Msg::SubmitRequested => request_submit(model, cmds),
        Msg::SubmitCompleted { generation, result } => {
            if generation != model.generation {
                tracing::debug!(generation, "dropping stale submit result");
                return;
            }
            model.submitting = false;
            match result {
                Ok(field) => {
                    tracing::info!(field_id = field.id, "field updated");
                    surface_event(model, "Field saved.".to_string(), false);
                    navigate_back(model);
                }
                Err(err) => {
                    surface_event(model, format!("Failed to update field:\n\n{err}"), true);
                }
            }
        }
        Msg::BackRequested => navigate_back(model),
    }
}

/// Execute a command (blocking, on a worker) and return the resulting message.
pub fn run_command(services: &Services, cmd: Command) -> Msg {
    match cmd {
        Command::Load { generation, route } => {
            let report = loader::load(&route, services.fields.as_ref(), services.branches.as_ref());
            Msg::LoadCompleted { generation, report }
        }
        Command::PickImage => {
            let file = rfd::FileDialog::new()
                .set_title("Select field image")
                .add_filter("Image", &ACCEPTED_EXTENSIONS)
                .pick_file();
            Msg::Image(ImageMsg::FilePicked(file))
        }
        Command::LoadPreview { path } => match image::load_preview(&path) {
            Ok(image) => Msg::PreviewDecoded { path, image },
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "preview decode failed");
                Msg::Image(ImageMsg::PreviewFailed { path })
            }
        },
        Command::SubmitUpdate {
            generation,
            field_id,
            request,
        } => {
            let result = submit::dispatch(services.fields.as_ref(), field_id, request)
                .map_err(|err| err.to_string());
            Msg::SubmitCompleted { generation, result }
        }
    }
}

/// Store an edited value and clear its stale validation message.
fn edit(model: &mut AppModel, field: FormField, value: String) {
    let slot = match field {
        FormField::Name => &mut model.form.name,
        FormField::TypeId => &mut model.form.type_id,
        FormField::BranchId => &mut model.form.branch_id,
        FormField::PriceDay => &mut model.form.price_day,
        FormField::PriceNight => &mut model.form.price_night,
        FormField::Status => &mut model.form.status,
    };
    *slot = value;
    model.errors.clear(field);
}

fn update_image(model: &mut AppModel, msg: ImageMsg, cmds: &mut Vec<Command>) {
    let mut image_cmds = Vec::new();
    if let Some(event) = image::update(&mut model.image, msg, &mut image_cmds) {
        surface_event(model, event.message, event.is_error);
    }
    for c in image_cmds {
        match c {
            ImageCommand::PickFile => cmds.push(Command::PickImage),
            ImageCommand::LoadPreview { path } => cmds.push(Command::LoadPreview { path }),
        }
    }
}

/// Merge whatever the loader produced; earlier steps stay applied after a failure.
fn apply_report(model: &mut AppModel, report: LoadReport) {
    model.loading = false;
    model.load_failed = !report.is_complete();

    if let Some(ids) = report.ids {
        model.ids = Some(ids);
    }
    if let Some(field) = report.field {
        model.form = FormValues::from_field(&field);
        model.image = ImageModel::from_remote(field.image_url.clone());
        model.errors = ValidationErrors::default();
        model.field = Some(field);
    }
    if let Some(catalog) = report.branches {
        if catalog.locked
            && let Some(branch) = catalog.branches.first()
        {
            model.form.branch_id = branch.id.to_string();
        }
        model.branches = catalog.branches;
        model.branch_locked = catalog.locked;
    }
    if let Some(types) = report.field_types {
        model.field_types = types;
    }

    match report.error {
        Some((step, err)) => {
            surface_event(model, format!("Failed to load {step}:\n\n{err}"), true);
        }
        None => {
            let notice = report.notices.join("\n");
            if notice.is_empty() {
                model.status = Some("Field loaded.".into());
            } else {
                surface_event(model, notice, false);
            }
        }
    }
}

fn request_submit(model: &mut AppModel, cmds: &mut Vec<Command>) {
    if model.is_busy() {
        tracing::debug!("submit ignored while busy");
        return;
    }
    let Some(ids) = model.ids else {
        surface_event(model, "The field has not been loaded.".to_string(), true);
        return;
    };

    let payload = match form::validate(&model.form) {
        Ok(payload) => payload,
        Err(errors) => {
            model.errors = errors;
            surface_event(model, "Please fix the highlighted fields.".to_string(), false);
            return;
        }
    };
    model.errors = ValidationErrors::default();

    match submit::encode(&payload, model.image.state()) {
        Ok(request) => {
            model.submitting = true;
            model.status = Some("Saving...".into());
            cmds.push(Command::SubmitUpdate {
                generation: model.generation,
                field_id: ids.field_id,
                request,
            });
        }
        Err(err) => surface_event(model, format!("Failed to prepare update: {err}"), true),
    }
}

/// Hand off to the branch detail page and retire the session's in-flight work.
fn navigate_back(model: &mut AppModel) {
    let route = match model.ids {
        Some(ids) => Route::BranchDetail {
            branch_id: ids.branch_id,
        },
        None => match model.route.branch_id.trim().parse::<i64>() {
            Ok(branch_id) if branch_id >= 0 => Route::BranchDetail { branch_id },
            _ => Route::Branches,
        },
    };
    model.generation += 1;
    model.navigation = Some(route);
}

/// Update status/error fields consistently for user feedback.
fn surface_event(model: &mut AppModel, message: String, is_error: bool) {
    if is_error {
        model.error = Some(message.clone());
    }
    model.status = Some(message);
}

#[cfg(test)]
mod tests {
    #![allow(clippy::field_reassign_with_default)]

    use std::fs;
    use std::path::Path;

    use ::image::{ImageBuffer, Rgba};
    use tempfile::TempDir;

    use super::*;
    use crate::api::fake::{Call, FakeApi};
    use crate::logic::submit::REMOVE_IMAGE_KEY;

    fn services(api: FakeApi) -> (Arc<FakeApi>, Services) {
        let api = Arc::new(api);
        let services = Services {
            fields: api.clone(),
            branches: api.clone(),
        };
        (api, services)
    }

    fn route(branch_id: &str, field_id: &str) -> RouteParams {
        RouteParams {
            branch_id: branch_id.into(),
            field_id: field_id.into(),
        }
    }

    /// Apply a message and run the network commands it produced, like the worker pool would.
    fn drive(model: &mut AppModel, services: &Services, msg: Msg) {
        let mut queue = vec![msg];
        while let Some(msg) = queue.pop() {
            let mut cmds = Vec::new();
            update(model, msg, &mut cmds);
            for cmd in cmds {
                match cmd {
                    Command::Load { .. } | Command::SubmitUpdate { .. } => {
                        queue.push(run_command(services, cmd));
                    }
                    Command::PickImage | Command::LoadPreview { .. } => {}
                }
            }
        }
    }

    fn loaded(api: FakeApi) -> (AppModel, Arc<FakeApi>, Services) {
        let (api, services) = services(api);
        let mut model = AppModel::new(route("5", "42"));
        drive(&mut model, &services, Msg::LoadRequested);
        (model, api, services)
    }

    fn write_png(dir: &Path) -> PathBuf {
        let path = dir.join("new.png");
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> =
            ImageBuffer::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        img.save(&path).expect("png saved");
        path
    }

    #[test]
    fn loading_flag_is_set_until_the_load_completes() {
        let (_, services) = services(FakeApi::court_a());
        let mut model = AppModel::new(route("5", "42"));
        let mut cmds = Vec::new();

        update(&mut model, Msg::LoadRequested, &mut cmds);
        assert!(model.loading && model.is_busy());
        assert!(matches!(cmds.as_slice(), [Command::Load { .. }]));

        let completed = run_command(&services, cmds.remove(0));
        update(&mut model, completed, &mut cmds);
        assert!(!model.loading && !model.is_busy());
    }

    #[test]
    fn load_with_resolved_branch_locks_and_populates_form() {
        let (model, _, _) = loaded(FakeApi::court_a());

        assert!(!model.loading);
        assert!(model.error.is_none());
        assert_eq!(model.form.name, "Court A");
        assert_eq!(model.form.branch_id, "5");
        assert_eq!(model.form.status, "available");
        assert_eq!(model.form.price_day, "100000");
        assert!(model.branch_locked);
        assert_eq!(model.branch_name(), Some("Main Branch"));
        assert_eq!(model.image.state().tracked_url(), Some("http://x/img.png"));
        assert_eq!(model.field_types.len(), 2);
    }

    #[test]
    fn load_with_failed_branch_uses_fallback_list() {
        let (model, _, _) = loaded(FakeApi {
            branch: None,
            ..FakeApi::court_a()
        });

        assert_eq!(model.branches.len(), 2);
        assert!(!model.branch_locked);
        assert!(model.error.is_none());
        assert!(model.status.as_deref().is_some_and(|s| s.contains("branch 5")));
        assert_eq!(model.field_types.len(), 2);
    }

    #[test]
    fn invalid_route_reports_and_clears_loading() {
        let (api, services) = services(FakeApi::court_a());
        let mut model = AppModel::new(route("main", "42"));

        drive(&mut model, &services, Msg::LoadRequested);

        assert!(!model.loading);
        assert!(model.load_failed);
        assert!(model.error.is_some());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn failed_fallback_keeps_field_values() {
        let (model, _, _) = loaded(FakeApi {
            branch: None,
            user_branches: None,
            ..FakeApi::court_a()
        });

        assert!(model.load_failed);
        assert_eq!(model.form.name, "Court A");
        assert!(model.branches.is_empty());
        assert!(model.field_types.is_empty());
    }

    #[test]
    fn locked_branch_ignores_selection_but_unlocked_takes_last_choice() {
        let (mut locked, _, services) = loaded(FakeApi::court_a());
        drive(&mut locked, &services, Msg::BranchSelected("7".into()));
        assert_eq!(locked.form.branch_id, "5");

        let (mut unlocked, _, services) = loaded(FakeApi {
            branch: None,
            ..FakeApi::court_a()
        });
        drive(&mut unlocked, &services, Msg::BranchSelected("7".into()));
        assert_eq!(unlocked.form.branch_id, "7");
    }

    #[test]
    fn submit_success_sends_json_and_navigates_to_branch() {
        let (mut model, api, services) = loaded(FakeApi::court_a());

        drive(&mut model, &services, Msg::NameChanged("Court A+".into()));
        drive(&mut model, &services, Msg::SubmitRequested);

        assert!(!model.submitting);
        assert_eq!(model.navigation, Some(Route::BranchDetail { branch_id: 5 }));
        match api.calls().last() {
            Some(Call::UpdateJson(42, body)) => {
                assert_eq!(body["name"], serde_json::json!("Court A+"));
                assert!(body.get(REMOVE_IMAGE_KEY).is_none());
            }
            other => panic!("unexpected last call: {other:?}"),
        }
    }

    #[test]
    fn invalid_form_reports_inline_and_calls_nothing() {
        let (mut model, api, services) = loaded(FakeApi::court_a());
        let calls_before = api.calls().len();

        drive(&mut model, &services, Msg::NameChanged("ab".into()));
        drive(&mut model, &services, Msg::PriceDayChanged("abc".into()));
        drive(&mut model, &services, Msg::SubmitRequested);

        assert!(model.errors.get(FormField::Name).is_some());
        assert!(model.errors.get(FormField::PriceDay).is_some());
        assert_eq!(api.calls().len(), calls_before);
        assert!(model.navigation.is_none());

        drive(&mut model, &services, Msg::NameChanged("abc".into()));
        assert!(model.errors.get(FormField::Name).is_none());
    }

    #[test]
    fn pick_then_remove_then_submit_sends_remove_flag() {
        let tmp = TempDir::new().unwrap();
        let png = write_png(tmp.path());
        let (mut model, api, services) = loaded(FakeApi::court_a());

        drive(&mut model, &services, Msg::Image(ImageMsg::FilePicked(Some(png))));
        drive(&mut model, &services, Msg::Image(ImageMsg::Remove));
        drive(&mut model, &services, Msg::SubmitRequested);

        match api.calls().last() {
            Some(Call::UpdateJson(42, body)) => {
                assert_eq!(body[REMOVE_IMAGE_KEY], serde_json::json!(true));
            }
            other => panic!("expected json update, got {other:?}"),
        }
    }

    #[test]
    fn pick_and_submit_sends_multipart() {
        let tmp = TempDir::new().unwrap();
        let png = write_png(tmp.path());
        let (mut model, api, services) = loaded(FakeApi::court_a());

        let mut cmds = Vec::new();
        update(
            &mut model,
            Msg::Image(ImageMsg::FilePicked(Some(png.clone()))),
            &mut cmds,
        );
        assert!(matches!(cmds.as_slice(), [Command::LoadPreview { path }] if *path == png));

        drive(&mut model, &services, Msg::SubmitRequested);

        match api.calls().last() {
            Some(Call::UpdateMultipart(42, form)) => {
                assert_eq!(form.file.name, "imageUrl");
                assert_eq!(form.file.mime, "image/png");
                assert!(form.text.contains(&("name".into(), "Court A".into())));
                assert!(form.text.contains(&("priceNight".into(), "150000".into())));
            }
            other => panic!("expected multipart update, got {other:?}"),
        }
    }

    #[test]
    fn failed_submit_keeps_form_and_allows_retry() {
        let (mut model, api, services) = loaded(FakeApi {
            fail_update: true,
            ..FakeApi::court_a()
        });
        drive(&mut model, &services, Msg::NameChanged("Court Z".into()));
        drive(&mut model, &services, Msg::SubmitRequested);

        assert!(!model.submitting);
        assert!(model.error.as_deref().is_some_and(|e| e.contains("connection reset")));
        assert_eq!(model.form.name, "Court Z");
        assert!(model.navigation.is_none());

        drive(&mut model, &services, Msg::SubmitRequested);
        let updates = api
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::UpdateJson(..)))
            .count();
        assert_eq!(updates, 2);
    }

    #[test]
    fn second_submit_is_ignored_while_submitting() {
        let (mut model, _, _) = loaded(FakeApi::court_a());
        let mut cmds = Vec::new();

        update(&mut model, Msg::SubmitRequested, &mut cmds);
        update(&mut model, Msg::SubmitRequested, &mut cmds);
        update(&mut model, Msg::LoadRequested, &mut cmds);

        assert!(model.submitting);
        assert_eq!(cmds.len(), 1);
    }

    #[test]
    fn back_navigates_without_saving() {
        let (mut model, api, services) = loaded(FakeApi::court_a());
        let calls_before = api.calls().len();

        drive(&mut model, &services, Msg::BackRequested);

        assert_eq!(model.navigation, Some(Route::BranchDetail { branch_id: 5 }));
        assert_eq!(api.calls().len(), calls_before);
    }

    #[test]
    fn back_with_unusable_route_goes_to_branch_list() {
        let mut model = AppModel::new(route("x", "y"));
        let mut cmds = Vec::new();
        update(&mut model, Msg::BackRequested, &mut cmds);
        assert_eq!(model.navigation, Some(Route::Branches));
    }

    #[test]
    fn late_results_after_leaving_are_dropped() {
        let (api, services) = services(FakeApi::court_a());
        let mut model = AppModel::new(route("5", "42"));
        let mut cmds = Vec::new();

        update(&mut model, Msg::LoadRequested, &mut cmds);
        update(&mut model, Msg::BackRequested, &mut cmds);
        let late = run_command(&services, cmds.remove(0));
        update(&mut model, late, &mut cmds);

        assert!(model.form.name.is_empty());
        assert!(!api.calls().is_empty());
    }

    #[test]
    fn reload_after_failure_recovers() {
        let (api, failing) = services(FakeApi {
            branch: None,
            user_branches: None,
            ..FakeApi::court_a()
        });
        let (_, recovered) = services(FakeApi::court_a());
        let mut model = AppModel::new(route("5", "42"));
        drive(&mut model, &failing, Msg::LoadRequested);
        assert!(model.load_failed);

        drive(&mut model, &recovered, Msg::ReloadRequested);

        assert!(!model.load_failed);
        assert!(model.branch_locked);
        assert_eq!(model.field_types.len(), 2);
        assert!(!api.calls().is_empty());
    }

    #[test]
    fn submit_before_load_is_refused() {
        let mut model = AppModel::new(route("5", "42"));
        let mut cmds = Vec::new();

        update(&mut model, Msg::SubmitRequested, &mut cmds);

        assert!(cmds.is_empty());
        assert!(model.error.is_some());
    }

    #[test]
    fn unsupported_image_is_rejected_with_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("court.gif");
        fs::write(&path, b"GIF89a").unwrap();
        let (mut model, _, services) = loaded(FakeApi::court_a());

        drive(&mut model, &services, Msg::Image(ImageMsg::FilePicked(Some(path))));

        assert!(model.error.is_some());
        assert!(model.image.state().selected_file().is_none());
    }
}
