//! Evergreen - an animated geometric Christmas tree with snowfall and a photo gallery

pub mod app;
pub mod config;
pub mod controls;
pub mod core;
pub mod gallery;
pub mod generation;
pub mod math;
pub mod render;
pub mod scene;
pub mod snow;
