//! Per-asset lifecycle state.
//!
//! An asset is anything in the scene that points at an image file. Once it
//! has been converted it remembers its source file, and its active path can
//! be flipped between that source and the derived tiled EXR.
//!
//! ```text
//! NotConverted --convert--> ConvertedActive <--switch/revert--> ConvertedInactive
//! ```
//!
//! Only the lifecycle controller mutates records; everyone else reads them
//! through the accessors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Opaque handle for an asset in the caller's scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AssetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AssetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where an asset stands in the conversion lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetState {
    /// Never converted; the active path is the asset's original file.
    #[default]
    NotConverted,
    /// Converted at least once, currently pointing at the source file.
    ConvertedInactive,
    /// Pointing at the derived tiled EXR.
    ConvertedActive,
}

impl AssetState {
    /// Integer flag stored in the scene's state attribute.
    pub fn as_flag(&self) -> i64 {
        match self {
            AssetState::NotConverted => 0,
            AssetState::ConvertedInactive => 1,
            AssetState::ConvertedActive => 2,
        }
    }

    pub fn from_flag(flag: i64) -> Option<Self> {
        match flag {
            0 => Some(AssetState::NotConverted),
            1 => Some(AssetState::ConvertedInactive),
            2 => Some(AssetState::ConvertedActive),
            _ => None,
        }
    }

    pub fn is_converted(&self) -> bool {
        !matches!(self, AssetState::NotConverted)
    }
}

impl fmt::Display for AssetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AssetState::NotConverted => "not converted",
            AssetState::ConvertedInactive => "converted (source active)",
            AssetState::ConvertedActive => "converted (tiled active)",
        };
        f.write_str(label)
    }
}

/// One tracked asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
    pub(crate) id: AssetId,
    pub(crate) active_path: PathBuf,
    pub(crate) source_path: Option<PathBuf>,
    pub(crate) color_space: String,
    pub(crate) state: AssetState,
}

impl AssetRecord {
    /// A record that has never been converted.
    pub fn new(id: impl Into<AssetId>, path: impl Into<PathBuf>, color_space: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            active_path: path.into(),
            source_path: None,
            color_space: color_space.into(),
            state: AssetState::NotConverted,
        }
    }

    /// Rebuild a record from persisted fields, checking the lifecycle
    /// invariants.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Scene`] when the fields contradict each other, e.g. a
    /// converted state with no source path.
    pub fn restore(
        id: impl Into<AssetId>,
        active_path: impl Into<PathBuf>,
        source_path: Option<PathBuf>,
        color_space: impl Into<String>,
        state: AssetState,
    ) -> Result<Self> {
        let id = id.into();
        let active_path = active_path.into();

        match (state, &source_path) {
            (AssetState::NotConverted, Some(source)) => {
                return Err(Error::scene(format!(
                    "asset {id} is not converted but records source {}",
                    source.display()
                )));
            }
            (AssetState::ConvertedInactive | AssetState::ConvertedActive, None) => {
                return Err(Error::scene(format!(
                    "asset {id} is {state} but has no source path"
                )));
            }
            (AssetState::ConvertedInactive, Some(source)) if *source != active_path => {
                return Err(Error::scene(format!(
                    "asset {id} is {state} but points at {} instead of its source {}",
                    active_path.display(),
                    source.display()
                )));
            }
            (AssetState::ConvertedActive, Some(source)) if *source == active_path => {
                return Err(Error::scene(format!(
                    "asset {id} is {state} but still points at its source {}",
                    source.display()
                )));
            }
            _ => {}
        }

        Ok(Self {
            id,
            active_path,
            source_path,
            color_space: color_space.into(),
            state,
        })
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    pub fn active_path(&self) -> &Path {
        &self.active_path
    }

    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    pub fn color_space(&self) -> &str {
        &self.color_space
    }

    pub fn state(&self) -> AssetState {
        self.state
    }

    /// Derived file for the current source under `postfix`, if converted.
    pub fn derived_path(&self, postfix: &str) -> Option<PathBuf> {
        self.source_path
            .as_deref()
            .map(|source| crate::path::derive(source, postfix))
    }

    /// Refresh the color space after the scene reassigned it.
    pub(crate) fn sync_color_space(&mut self, color_space: impl Into<String>) {
        self.color_space = color_space.into();
    }
}
