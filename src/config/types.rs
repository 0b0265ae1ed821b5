use exrtiler_core::{ColorSpacePolicy, ConvertOptions, DEFAULT_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub converter: ConverterConfig,

    /// Options used when the command line does not override them.
    #[serde(default)]
    pub defaults: ConvertOptions,

    #[serde(default)]
    pub color_space: ColorSpacePolicy,

    #[serde(default)]
    pub scene: SceneConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ConverterConfig {
    /// Path to `img2tiledexr`; looked up on PATH when unset
    #[serde(default)]
    pub executable: Option<PathBuf>,

    /// Number of conversions running at once
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Kill a single conversion after this many seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_threads() -> usize {
    DEFAULT_CONCURRENCY
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            executable: None,
            threads: default_threads(),
            timeout_secs: None,
        }
    }
}

impl ConverterConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SceneConfig {
    /// Re-guess the color space whenever a texture path changes, the way
    /// DCC hosts do on file nodes.
    #[serde(default = "default_true")]
    pub auto_color_space: bool,
}

fn default_true() -> bool {
    true
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            auto_color_space: default_true(),
        }
    }
}
