//! Locating the external converter.

use std::path::{Path, PathBuf};

/// Executable name searched on PATH.
pub const CONVERTER_NAME: &str = "img2tiledexr";

/// Information about an external tool.
#[derive(Debug, Clone)]
pub struct ToolInfo {
    /// Name of the tool.
    pub name: String,
    /// Whether the tool is available.
    pub available: bool,
    /// Path to the tool executable.
    pub path: Option<PathBuf>,
    /// Where the path came from ("config" or "PATH").
    pub origin: Option<&'static str>,
}

/// Find the converter: a configured path if it exists, otherwise a PATH
/// lookup. `None` means there is no default and the user must supply one.
pub fn resolve_converter(configured: Option<&Path>) -> Option<PathBuf> {
    check_converter(configured).path
}

/// Like [`resolve_converter`], but reports where the executable was found.
pub fn check_converter(configured: Option<&Path>) -> ToolInfo {
    if let Some(path) = configured {
        if path.is_file() {
            return ToolInfo {
                name: CONVERTER_NAME.to_string(),
                available: true,
                path: Some(path.to_path_buf()),
                origin: Some("config"),
            };
        }
        tracing::debug!("Configured converter {:?} not found, searching PATH", path);
    }

    match which::which(CONVERTER_NAME) {
        Ok(path) => ToolInfo {
            name: CONVERTER_NAME.to_string(),
            available: true,
            path: Some(path),
            origin: Some("PATH"),
        },
        Err(_) => ToolInfo {
            name: CONVERTER_NAME.to_string(),
            available: false,
            path: None,
            origin: None,
        },
    }
}
