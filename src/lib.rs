pub mod api;
pub mod best;
pub mod chart;
pub mod config;
pub mod data;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod selection;
pub mod ui;
