//! Post-test telemetry processing for rocket-engine hot fires.
//!
//! CSV recordings are aligned to a common T0, optionally filtered, and drawn
//! as PDF plots that can then be handed to an upload sink.

pub mod app;
pub mod batch;
pub mod color;
pub mod config;
pub mod data;
pub mod discover;
pub mod logging;
pub mod render;
pub mod storage;
pub mod ui;
