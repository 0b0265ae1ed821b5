//! JSON manifest standing in for a host scene.
//!
//! ```json
//! { "assets": [ { "id": "file1", "attrs": { "fileTextureName": "/tex/grass.tga" } } ] }
//! ```
//!
//! Attributes are stored as strings under the names in
//! [`exrtiler_core::scene::attr`]. Like a DCC host, the manifest re-guesses an
//! asset's color space whenever its path changes (see [`guess_color_space`]).

use anyhow::{Context, Result};
use exrtiler_core::scene::attr;
use exrtiler_core::{AssetId, Error, RawAsset, SceneStore, Selection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Color space a host assigns to float images.
pub const LINEAR_COLOR_SPACE: &str = "scene-linear Rec.709-sRGB";
/// Color space a host assigns to everything else.
pub const DISPLAY_COLOR_SPACE: &str = "sRGB";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestAsset {
    pub id: AssetId,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ManifestFile {
    #[serde(default)]
    assets: Vec<ManifestAsset>,
}

/// A scene backed by a JSON file on disk.
#[derive(Debug)]
pub struct ManifestScene {
    path: PathBuf,
    assets: Vec<ManifestAsset>,
    auto_color_space: bool,
}

impl ManifestScene {
    /// Read the manifest at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene manifest: {:?}", path))?;
        let file: ManifestFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse scene manifest: {:?}", path))?;

        tracing::debug!("Loaded {} assets from {:?}", file.assets.len(), path);

        Ok(Self {
            path: path.to_path_buf(),
            assets: file.assets,
            auto_color_space: true,
        })
    }

    /// Enable or disable color space re-guessing on path changes.
    pub fn with_auto_color_space(mut self, enabled: bool) -> Self {
        self.auto_color_space = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn assets(&self) -> &[ManifestAsset] {
        &self.assets
    }

    /// Write the manifest back, replacing the file atomically.
    pub fn save(&self) -> Result<()> {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let file = ManifestFile {
            assets: self.assets.clone(),
        };
        let json = serde_json::to_string_pretty(&file).context("Failed to serialize scene manifest")?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temp file in {:?}", dir))?;
        tmp.write_all(json.as_bytes())?;
        tmp.write_all(b"\n")?;
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to write scene manifest: {:?}", self.path))?;

        tracing::debug!("Saved scene manifest {:?}", self.path);
        Ok(())
    }

    fn asset(&self, id: &AssetId) -> Option<&ManifestAsset> {
        self.assets.iter().find(|a| &a.id == id)
    }
}

impl SceneStore for ManifestScene {
    fn enumerate_assets(&self, selection: &Selection) -> exrtiler_core::Result<Vec<RawAsset>> {
        let mut raw = Vec::new();

        for asset in self.assets.iter().filter(|a| selection.contains(&a.id)) {
            let Some(path) = asset.attrs.get(attr::PATH).filter(|p| !p.is_empty()) else {
                tracing::debug!("Asset {} has no texture path, ignoring", asset.id);
                continue;
            };

            let state_flag = match asset.attrs.get(attr::STATE) {
                None => None,
                Some(flag) => match flag.trim().parse::<i64>() {
                    Ok(flag) => Some(flag),
                    Err(_) => {
                        tracing::warn!("Asset {} has unreadable state {:?}, ignoring", asset.id, flag);
                        continue;
                    }
                },
            };

            raw.push(RawAsset {
                state_flag,
                id: asset.id.clone(),
                path: PathBuf::from(path),
            });
        }

        if let Selection::Ids(ids) = selection {
            for id in ids.iter().filter(|id| self.asset(id).is_none()) {
                tracing::warn!("Asset {} is not in the scene", id);
            }
        }

        Ok(raw)
    }

    fn read_attr(&self, id: &AssetId, name: &str) -> exrtiler_core::Result<Option<String>> {
        let asset = self
            .asset(id)
            .ok_or_else(|| Error::scene(format!("no asset {id} in scene")))?;
        Ok(asset.attrs.get(name).cloned())
    }

    fn write_attr(&mut self, id: &AssetId, name: &str, value: &str) -> exrtiler_core::Result<()> {
        let auto_color_space = self.auto_color_space;
        let asset = self
            .assets
            .iter_mut()
            .find(|a| &a.id == id)
            .ok_or_else(|| Error::scene(format!("no asset {id} in scene")))?;

        asset.attrs.insert(name.to_string(), value.to_string());

        if name == attr::PATH && auto_color_space {
            asset.attrs.insert(
                attr::COLOR_SPACE.to_string(),
                guess_color_space(Path::new(value)).to_string(),
            );
        }

        Ok(())
    }
}

/// The color space a host would pick for a freshly assigned file.
pub fn guess_color_space(path: &Path) -> &'static str {
    let is_float = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("exr") || e.eq_ignore_ascii_case("hdr"))
        .unwrap_or(false);

    if is_float {
        LINEAR_COLOR_SPACE
    } else {
        DISPLAY_COLOR_SPACE
    }
}
