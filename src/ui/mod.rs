// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Top-level egui application shell for editing one field.
//! Handles layout, form controls, and wiring to the command workers.

pub mod components;

use eframe::egui;

use crate::config::AppConfig;
use crate::logic::loader::RouteParams;
use crate::models::field::FieldStatus;
use crate::models::form::FormField;
use crate::mvu::{self, AppModel, Command, Msg, Route, Services};
use crate::ui::components::image::{self, ImageMsg};

/// Stateful egui application for editing a field.
pub struct FieldDeskApp {
    model: AppModel,
    inbox: Vec<Msg>,
    config: AppConfig,
    cmd_tx: crossbeam_channel::Sender<Command>,
    msg_rx: crossbeam_channel::Receiver<Msg>,
}

impl FieldDeskApp {
    /// Start the worker pool and queue the initial load.
    pub fn new(route: RouteParams, services: Services, config: AppConfig) -> Self {
        let (cmd_tx, cmd_rx) = crossbeam_channel::unbounded::<Command>();
        let (msg_tx, msg_rx) = crossbeam_channel::unbounded::<Msg>();

        let threads = std::thread::available_parallelism()
            .map(|n| n.get().clamp(2, 4))
            .unwrap_or(2);
        for _ in 0..threads {
            let cmd_rx = cmd_rx.clone();
            let msg_tx = msg_tx.clone();
            let services = services.clone();
            std::thread::spawn(move || {
                for cmd in cmd_rx.iter() {
                    let msg = mvu::run_command(&services, cmd);
                    let _ = msg_tx.send(msg);
                }
            });
        }

        Self {
            model: AppModel::new(route),
            inbox: vec![Msg::LoadRequested],
            config,
            cmd_tx,
            msg_rx,
        }
    }
}

impl eframe::App for FieldDeskApp {
    /// Drains worker results, applies messages to the model, dispatches new
    /// commands, and performs navigation. Runs before every [`Self::ui`] call.
    fn logic(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Pull messages produced by the command workers.
        while let Ok(msg) = self.msg_rx.try_recv() {
            self.model.pending_commands = self.model.pending_commands.saturating_sub(1);
            self.inbox.push(msg);
        }

        // Process pending messages until exhausted.
        let mut msgs = std::mem::take(&mut self.inbox);
        msgs.reverse();
        while let Some(msg) = msgs.pop() {
            match msg {
                Msg::PreviewDecoded { path, image } => {
                    let texture = ctx.load_texture(
                        format!("preview-{}", path.display()),
                        image,
                        egui::TextureOptions::default(),
                    );
                    msgs.push(Msg::Image(ImageMsg::PreviewReady { path, texture }));
                }
                other => {
                    let mut commands = Vec::new();
                    mvu::update(&mut self.model, other, &mut commands);
                    for cmd in commands {
                        if self.cmd_tx.send(cmd).is_ok() {
                            self.model.pending_commands += 1;
                        }
                    }
                }
            }
        }

        if let Some(route) = self.model.navigation.take() {
            self.navigate(ctx, route);
            return;
        }

        if self.model.pending_commands > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }

    /// Renders the top bar, error modal, status bar and the form.
    fn ui(&mut self, ui: &mut egui::Ui, _frame: &mut eframe::Frame) {
        egui::Panel::top("top_bar").show_inside(ui, |ui| {
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.heading("Field details & edit");
                ui.separator();
                let branch = match self.model.branch_name() {
                    Some(name) => name,
                    None if self.model.loading => "Loading...",
                    None => "not selected",
                };
                ui.label(format!("Branch: {branch}"));
            });
            ui.add_space(4.0);
        });

        self.render_error_modal(ui.ctx());

        egui::Panel::bottom("status_panel")
            .resizable(false)
            .show_inside(ui, |ui| {
                self.render_status(ui);
            });

        egui::CentralPanel::default().show_inside(ui, |ui| {
            ui.add_space(8.0);
            if self.model.loading {
                ui.centered_and_justified(|ui| {
                    ui.add(egui::Spinner::new().size(28.0));
                });
                return;
            }
            if self.model.load_failed && self.model.field.is_none() {
                self.render_load_failure(ui);
                return;
            }

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.render_form(ui);
                ui.add_space(12.0);
                self.render_image_section(ui);
                ui.add_space(12.0);
                self.render_actions(ui);
                ui.add_space(8.0);
            });
        });

        // Interactions queued this frame are applied by the next `logic` pass.
        if !self.inbox.is_empty() {
            ui.ctx().request_repaint();
        }
    }
}

impl FieldDeskApp {
    /// Open the target page in the browser when a dashboard is configured, then close.
    fn navigate(&self, ctx: &egui::Context, route: Route) {
        tracing::info!(?route, "leaving field editor");
        if let Some(url) = self.config.dashboard_page(&route.page_path())
            && let Err(err) = open::that(&url)
        {
            tracing::warn!(%url, ?err, "failed to open dashboard page");
        }
        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
    }

    /// Labelled inputs for the editable attributes.
    fn render_form(&mut self, ui: &mut egui::Ui) {
        let enabled = !self.model.submitting;
        egui::Frame::group(ui.style()).show(ui, |ui| {
            ui.set_width(ui.available_width());
            egui::Grid::new("field_form")
                .num_columns(2)
                .spacing(egui::vec2(8.0, 10.0))
                .min_col_width(120.0)
                .show(ui, |ui| {
                    ui.label("Field name");
                    ui.vertical(|ui| {
                        let mut name = self.model.form.name.clone();
                        let edit = egui::TextEdit::singleline(&mut name).hint_text("Field name");
                        if ui.add_enabled(enabled, edit).changed() {
                            self.inbox.push(Msg::NameChanged(name));
                        }
                        self.render_field_error(ui, FormField::Name);
                    });
                    ui.end_row();

                    ui.label("Branch");
                    ui.vertical(|ui| {
                        let options: Vec<(i64, &str)> = self
                            .model
                            .branches
                            .iter()
                            .map(|b| (b.id, b.name.as_str()))
                            .collect();
                        let choice = ui
                            .add_enabled_ui(enabled && !self.model.branch_locked, |ui| {
                                select_id(ui, "branch", &self.model.form.branch_id, &options, "Choose branch")
                            })
                            .inner;
                        if let Some(id) = choice {
                            self.inbox.push(Msg::BranchSelected(id));
                        }
                        self.render_field_error(ui, FormField::BranchId);
                    });
                    ui.end_row();

                    ui.label("Field type");
                    ui.vertical(|ui| {
                        let options: Vec<(i64, &str)> = self
                            .model
                            .field_types
                            .iter()
                            .map(|t| (t.id, t.name.as_str()))
                            .collect();
                        let choice = ui
                            .add_enabled_ui(enabled, |ui| {
                                select_id(ui, "field_type", &self.model.form.type_id, &options, "Choose field type")
                            })
                            .inner;
                        if let Some(id) = choice {
                            self.inbox.push(Msg::TypeSelected(id));
                        }
                        self.render_field_error(ui, FormField::TypeId);
                    });
                    ui.end_row();

                    ui.label("Day price");
                    ui.vertical(|ui| {
                        let mut price = self.model.form.price_day.clone();
                        let edit = egui::TextEdit::singleline(&mut price).hint_text("100000");
                        if ui.add_enabled(enabled, edit).changed() {
                            self.inbox.push(Msg::PriceDayChanged(price));
                        }
                        self.render_field_error(ui, FormField::PriceDay);
                    });
                    ui.end_row();

                    ui.label("Night price");
                    ui.vertical(|ui| {
                        let mut price = self.model.form.price_night.clone();
                        let edit = egui::TextEdit::singleline(&mut price).hint_text("150000");
                        if ui.add_enabled(enabled, edit).changed() {
                            self.inbox.push(Msg::PriceNightChanged(price));
                        }
                        self.render_field_error(ui, FormField::PriceNight);
                    });
                    ui.end_row();

                    ui.label("Status");
                    ui.vertical(|ui| {
                        self.render_status_select(ui, enabled);
                        self.render_field_error(ui, FormField::Status);
                    });
                    ui.end_row();
                });
        });
    }

    fn render_status_select(&mut self, ui: &mut egui::Ui, enabled: bool) {
        let current = self.model.form.status.clone();
        let mut choice = current.clone();
        let selected_text = if current.is_empty() {
            "Choose status".to_string()
        } else {
            current.clone()
        };
        ui.add_enabled_ui(enabled, |ui| {
            egui::ComboBox::from_id_salt("status")
                .selected_text(selected_text)
                .show_ui(ui, |ui| {
                    for status in FieldStatus::ALL {
                        ui.selectable_value(&mut choice, status.as_str().to_string(), status.as_str());
                    }
                });
        });
        if choice != current {
            self.inbox.push(Msg::StatusSelected(choice));
        }
    }

    fn render_field_error(&self, ui: &mut egui::Ui, field: FormField) {
        if let Some(message) = self.model.errors.get(field) {
            ui.label(
                egui::RichText::new(message)
                    .small()
                    .color(egui::Color32::from_rgb(220, 50, 47)),
            );
        }
    }

    fn render_image_section(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Field image")
            .default_open(true)
            .show(ui, |ui| {
                let msgs = image::view(ui, &self.model.image, !self.model.submitting);
                self.inbox.extend(msgs.into_iter().map(Msg::Image));
            });
    }

    /// Back and save buttons; save is disabled while a load or save is running.
    fn render_actions(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            let back = egui::Button::new(format!("{} Back", egui_phosphor::regular::ARROW_LEFT));
            if ui.add(back).clicked() {
                self.inbox.push(Msg::BackRequested);
            }

            let label = if self.model.submitting {
                "Saving...".to_string()
            } else {
                format!("{} Save changes", egui_phosphor::regular::FLOPPY_DISK)
            };
            if ui
                .add_enabled(!self.model.is_busy(), egui::Button::new(label))
                .clicked()
            {
                self.inbox.push(Msg::SubmitRequested);
            }
        });
    }

    fn render_load_failure(&mut self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.label(
                egui::RichText::new("The field could not be loaded.")
                    .color(egui::Color32::from_rgb(220, 50, 47)),
            );
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Back").clicked() {
                    self.inbox.push(Msg::BackRequested);
                }
                if ui.button("Retry").clicked() {
                    self.inbox.push(Msg::ReloadRequested);
                }
            });
        });
    }

    /// Render a simple modal window for error messages.
    fn render_error_modal(&mut self, ctx: &egui::Context) {
        if let Some(message) = self.model.error.clone() {
            egui::Window::new("Error")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
                .show(ctx, |ui| {
                    ui.label(message);
                    ui.add_space(8.0);
                    if ui.button("OK").clicked() {
                        self.inbox.push(Msg::DismissError);
                    }
                });
        }
    }

    /// Render latest status/error message when present.
    fn render_status(&self, ui: &mut egui::Ui) {
        if let Some(text) = &self.model.status {
            ui.horizontal(|ui| {
                ui.label(egui::RichText::new(text).color(egui::Color32::from_gray(68)));
                if self.model.pending_commands > 0 {
                    ui.add(egui::Spinner::new().size(14.0)).on_hover_text(format!(
                        "{} task(s) running in background",
                        self.model.pending_commands
                    ));
                }
            });
        }
    }
}

/// Combo box over `(id, label)` options; returns the newly chosen id as a string.
fn select_id(
    ui: &mut egui::Ui,
    salt: &str,
    current: &str,
    options: &[(i64, &str)],
    placeholder: &str,
) -> Option<String> {
    let selected_text = options
        .iter()
        .find(|(id, _)| id.to_string() == current)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| placeholder.to_string());
    let mut choice = current.to_string();
    egui::ComboBox::from_id_salt(salt)
        .selected_text(selected_text)
        .show_ui(ui, |ui| {
            for (id, name) in options {
                ui.selectable_value(&mut choice, id.to_string(), *name);
            }
        });
    (choice != current).then_some(choice)
}
