mod app;
mod effects;
pub mod logging;
mod persistence;
mod render;

pub use app::run_app;
pub use persistence::SETTINGS_FILENAME;
