//! Core project model, HTML export/import, and configuration

pub mod config;
pub mod media;
pub mod model;
pub mod render;
pub mod serialization;
pub mod workspace;
