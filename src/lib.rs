pub mod app;
pub mod cluster;
pub mod config;
pub mod poller;
pub mod server;
pub mod settings;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::app::{run, AppError};
pub use crate::config::{load_configuration, Configuration};
pub use crate::settings::Settings;
