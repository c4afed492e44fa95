//! Turns a project README into a short comic: one structured script from a
//! text model, then one generated image per panel.

pub mod core;
pub mod services;
pub mod utils;
