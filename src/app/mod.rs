//! Application entry point wiring configuration, the HTTP client, and egui/eframe.

use std::sync::Arc;

use anyhow::{Result, anyhow};
use eframe::egui;
use egui_phosphor::Variant;

use crate::api::HttpApi;
use crate::config;
use crate::logging;
use crate::logic::loader::RouteParams;
use crate::mvu::Services;
use crate::ui::FieldDeskApp;

/// Bootstrap the desktop application and run the main egui event loop.
pub fn run() -> Result<()> {
    logging::init();

    let config = config::load_app_config();
    let route = route_from_args(std::env::args().skip(1));
    tracing::info!(api = %config.api_base_url, ?route, "starting field editor");

    let api = Arc::new(HttpApi::new(&config)?);
    let services = Services {
        fields: api.clone(),
        branches: api,
    };

    // Register Phosphor icon font.
    let mut fonts = egui::FontDefinitions::default();
    egui_phosphor::add_to_fonts(&mut fonts, Variant::Regular);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([720.0, 760.0])
            .with_min_inner_size([480.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Field Desk",
        options,
        Box::new(|cc| {
            cc.egui_ctx.set_fonts(fonts);
            egui_extras::install_image_loaders(&cc.egui_ctx);
            Ok(Box::new(FieldDeskApp::new(route, services, config)))
        }),
    )
    .map_err(|err| anyhow!("UI failed: {err}"))
}

/// `<branch-id> <field-id>`; missing values stay empty and fail identifier parsing later.
fn route_from_args(mut args: impl Iterator<Item = String>) -> RouteParams {
    RouteParams {
        branch_id: args.next().unwrap_or_default(),
        field_id: args.next().unwrap_or_default(),
    }
}
