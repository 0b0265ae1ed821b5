//! # exrtiler-core
//!
//! Batch conversion of texture images into tiled OpenEXR files, plus the
//! bookkeeping that lets an asset flip between its original file and the
//! converted one.
//!
//! This crate provides:
//! - [`path::derive`] - naming of derived `.exr` files
//! - [`ConversionEngine`] - bounded worker pool running the external converter
//! - [`AssetRecord`] / [`AssetState`] - the three-state asset lifecycle
//! - [`LifecycleController`] - convert, revert to source, switch to derived
//! - [`scene`] - loading and committing records against a host scene
//!
//! ## Example
//!
//! ```no_run
//! use exrtiler_core::{
//!     AssetRecord, ConversionEngine, ConvertRequest, LifecycleController, ProcessRunner,
//! };
//!
//! # async fn example() -> exrtiler_core::Result<()> {
//! let controller = LifecycleController::new(ConversionEngine::new(ProcessRunner::new()));
//! let mut records = vec![AssetRecord::new("file1", "/textures/grass.tga", "sRGB")];
//!
//! let report = controller
//!     .convert(&mut records, &ConvertRequest::new("/opt/vray/bin/img2tiledexr"))
//!     .await?;
//! println!("converted {} of {}", report.succeeded(), report.entries.len());
//! # Ok(())
//! # }
//! ```

pub mod asset;
pub mod colorspace;
pub mod engine;
mod error;
pub mod job;
pub mod lifecycle;
pub mod options;
pub mod path;
pub mod runner;
pub mod scene;

// Re-exports
pub use asset::{AssetId, AssetRecord, AssetState};
pub use colorspace::{ColorSpacePolicy, SubstringFilter};
pub use engine::{plan_jobs, ConversionEngine, DEFAULT_CONCURRENCY};
pub use error::{Error, Result};
pub use job::{CommandLine, ConversionJob, ConversionResult, ConversionStatus};
pub use lifecycle::{
    ConversionReport, ConvertRequest, LifecycleController, Rejection, ReportEntry, StateEntry,
    SwitchReport, Transition,
};
pub use options::{Compression, ConvertOptions, LinearMode};
pub use runner::{CommandRunner, DryRunRunner, ProcessRunner, ToolOutput};
pub use scene::{RawAsset, SceneStore, Selection};
