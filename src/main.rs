mod api;
mod app;
mod config;
mod error;
mod logging;
mod logic;
mod models;
mod mvu;
mod ui;

fn main() -> anyhow::Result<()> {
    app::run()
}
