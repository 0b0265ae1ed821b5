//! exrtiler - tiled EXR texture conversion for scenes
//!
//! This library crate exposes the application layer for integration testing.

pub mod config;
pub mod manifest;
pub mod report;
pub mod tools;
