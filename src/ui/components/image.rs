// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Alexander Minges

//! Field image panel: shows the current image or a preview and handles replace/remove.

use std::path::{Path, PathBuf};

use eframe::egui;

use crate::models::image::{ImageDisplay, ImageState, SelectedImage};

/// Largest edge of a decoded preview, in pixels.
const PREVIEW_MAX: u32 = 512;
/// Largest edge of the preview as drawn.
const DISPLAY_MAX: f32 = 240.0;

/// MVU state for the image panel.
#[derive(Default)]
pub struct ImageModel {
    state: ImageState<egui::TextureHandle>,
}

/// Messages emitted by the image panel or by preview workers.
// Debug omitted because TextureHandle is not Debug.
pub enum ImageMsg {
    RequestPick,
    /// Picker result; `None` when the dialog was dismissed.
    FilePicked(Option<PathBuf>),
    PreviewReady {
        path: PathBuf,
        texture: egui::TextureHandle,
    },
    PreviewFailed {
        path: PathBuf,
    },
    Remove,
}

/// Side-effectful commands for the image panel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageCommand {
    PickFile,
    LoadPreview { path: PathBuf },
}

/// User-facing feedback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageEvent {
    pub message: String,
    pub is_error: bool,
}

impl ImageModel {
    /// Start from the image the loaded field already has.
    pub fn from_remote(url: Option<String>) -> Self {
        Self {
            state: ImageState::from_remote(url),
        }
    }

    pub fn state(&self) -> &ImageState<egui::TextureHandle> {
        &self.state
    }
}

/// Apply a message to the image model. Returns a user-facing event when relevant.
pub fn update(
    model: &mut ImageModel,
    msg: ImageMsg,
    cmds: &mut Vec<ImageCommand>,
) -> Option<ImageEvent> {
    match msg {
        ImageMsg::RequestPick => {
            cmds.push(ImageCommand::PickFile);
            None
        }
        ImageMsg::FilePicked(None) => {
            model.state.select(None);
            None
        }
        ImageMsg::FilePicked(Some(path)) => match SelectedImage::from_path(&path) {
            Ok(file) => {
                tracing::debug!(path = %path.display(), mime = %file.mime, "image selected");
                if model.state.select(Some(file)) {
                    cmds.push(ImageCommand::LoadPreview { path });
                }
                None
            }
            Err(err) => Some(ImageEvent {
                message: err.to_string(),
                is_error: true,
            }),
        },
        ImageMsg::PreviewReady { path, texture } => {
            if !model.state.attach_preview(&path, texture) {
                tracing::debug!(path = %path.display(), "discarding stale preview");
            }
            None
        }
        ImageMsg::PreviewFailed { path } => {
            let current = model
                .state
                .selected_file()
                .is_some_and(|file| file.path == path);
            current.then(|| ImageEvent {
                message: format!(
                    "Cannot preview {}; it will still be uploaded.",
                    path.display()
                ),
                is_error: false,
            })
        }
        ImageMsg::Remove => {
            model.state.remove();
            model.state.is_removed().then(|| ImageEvent {
                message: "Image will be removed when you save.".into(),
                is_error: false,
            })
        }
    }
}

/// Render the image panel and return any messages triggered by user interaction.
pub fn view(ui: &mut egui::Ui, model: &ImageModel, enabled: bool) -> Vec<ImageMsg> {
    let mut msgs = Vec::new();
    let visuals = ui.visuals().clone();

    egui::Frame::new()
        .fill(visuals.panel_fill)
        .stroke(visuals.window_stroke())
        .inner_margin(8.0)
        .show(ui, |ui| {
            ui.vertical_centered(|ui| {
                let display = model.state.display();
                let showing_image = !matches!(display, ImageDisplay::Placeholder);

                match display {
                    ImageDisplay::Preview(texture) => {
                        let size = texture.size_vec2();
                        let scale = (DISPLAY_MAX / size.x).min(DISPLAY_MAX / size.y).min(1.0);
                        ui.add(egui::Image::new((texture.id(), size * scale)));
                        if let Some(file) = model.state.selected_file() {
                            ui.label(
                                egui::RichText::new(&file.file_name)
                                    .small()
                                    .color(egui::Color32::from_gray(102)),
                            );
                        }
                    }
                    ImageDisplay::Remote(url) => {
                        ui.add(
                            egui::Image::from_uri(url.to_string())
                                .max_width(DISPLAY_MAX)
                                .max_height(DISPLAY_MAX),
                        );
                        let caption = match model.state.selected_file() {
                            Some(file) => format!("Loading preview of {}", file.file_name),
                            None => "Current image".to_string(),
                        };
                        ui.label(
                            egui::RichText::new(caption)
                                .small()
                                .color(egui::Color32::from_gray(102)),
                        );
                    }
                    ImageDisplay::Placeholder => {
                        ui.label(
                            egui::RichText::new(egui_phosphor::regular::IMAGE)
                                .size(40.0)
                                .color(egui::Color32::from_gray(150)),
                        );
                        let text = match model.state.selected_file() {
                            Some(file) => format!("Loading preview of {}", file.file_name),
                            None => "No image".to_string(),
                        };
                        ui.label(egui::RichText::new(text).color(egui::Color32::from_gray(150)));
                    }
                }

                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    let label = if showing_image || model.state.selected_file().is_some() {
                        "Replace image"
                    } else {
                        "Upload image"
                    };
                    let pick = egui::Button::new(format!(
                        "{} {label}",
                        egui_phosphor::regular::UPLOAD_SIMPLE
                    ));
                    if ui
                        .add_enabled(enabled, pick)
                        .on_hover_text("PNG or JPEG")
                        .clicked()
                    {
                        msgs.push(ImageMsg::RequestPick);
                    }

                    if showing_image || model.state.selected_file().is_some() {
                        let remove = egui::Button::new(format!(
                            "{} Remove",
                            egui_phosphor::regular::TRASH_SIMPLE
                        ));
                        if ui
                            .add_enabled(enabled, remove)
                            .on_hover_text("Remove the field image")
                            .clicked()
                        {
                            msgs.push(ImageMsg::Remove);
                        }
                    }
                });
            });
        });

    msgs
}

/// Decode and shrink a picked image into a preview-sized `ColorImage`.
pub(crate) fn load_preview(path: &Path) -> Result<egui::ColorImage, String> {
    let dyn_img = image::open(path).map_err(|e| e.to_string())?;
    let resized = dyn_img.thumbnail(PREVIEW_MAX, PREVIEW_MAX).to_rgba8();
    let size = [resized.width() as usize, resized.height() as usize];
    let pixels = resized.into_raw();
    Ok(egui::ColorImage::from_rgba_unmultiplied(size, &pixels))
}
