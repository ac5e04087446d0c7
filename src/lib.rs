pub mod charts;
pub mod config;
pub mod dataset;
pub mod model;
pub mod selection;
pub mod serve;

/// Application name for XDG paths
pub const APP_NAME: &str = "streamdash";
