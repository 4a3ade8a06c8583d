//! CLI command handlers.

pub mod config;
pub mod info;

pub use config::{
    ConfigView, run_config_fields, run_config_get, run_config_set, run_config_show,
    run_config_update,
};
pub use info::run_info;
