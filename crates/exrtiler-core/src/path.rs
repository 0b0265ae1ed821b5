//! Derived-file naming.
//!
//! The derived file always lives next to its source and is named
//! `stem(source) + postfix + ".exr"`. Nothing stores derived paths; they are
//! recomputed from the source path and the current postfix whenever needed,
//! so this function must stay pure.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension of every file produced by the converter.
pub const DERIVED_EXTENSION: &str = "exr";

/// Postfix used when none is configured.
pub const DEFAULT_POSTFIX: &str = "_tiled";

/// Derive the tiled EXR path for `source` using `postfix`.
///
/// # Example
///
/// ```
/// use exrtiler_core::path::derive;
/// use std::path::Path;
///
/// let derived = derive(Path::new("/textures/grass.tga"), "_tiled");
/// assert_eq!(derived, Path::new("/textures/grass_tiled.exr"));
/// ```
pub fn derive(source: &Path, postfix: &str) -> PathBuf {
    let mut name: OsString = source
        .file_stem()
        .map(|stem| stem.to_os_string())
        .unwrap_or_default();
    name.push(postfix);
    name.push(".");
    name.push(DERIVED_EXTENSION);
    source.with_file_name(name)
}
