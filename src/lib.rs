//! Data pipeline and dashboard state for the dengue case viewer.
//!
//! The egui front end lives in the binary; everything here is free of UI
//! types so it can be tested and reused by the sample generator.

pub mod boundaries;
pub mod config;
pub mod data;
pub mod state;
pub mod synthetic;
