//! Statline: typed time-series metric store with an HTTP surface

pub mod api;
pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod utils;
