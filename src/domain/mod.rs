//! Domain types: light requests and state, per-model profiles, color
//! math, and persisted settings.

pub mod color;
pub mod models;
pub mod profile;
pub mod settings;
