mod app;
mod config;
mod effects;
mod host;
mod logging;
mod server;
mod session;
mod ui;

pub use app::run_app;
