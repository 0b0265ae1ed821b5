//! Converter options.
//!
//! These map one-to-one onto the `img2tiledexr` command line flags
//! `-compression`, `-tileSize` and `-linear`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::path::DEFAULT_POSTFIX;
use crate::{Error, Result};

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 64;

/// EXR compression scheme passed to the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    None,
    Rle,
    Zip,
    /// Single-scanline zip, the converter's usual choice for textures.
    #[default]
    Zips,
    Piz,
    Pxr24,
    B44,
    B44a,
    Dwaa,
    Dwab,
}

impl Compression {
    /// Every compression scheme the converter accepts, in its documented order.
    pub const ALL: [Compression; 10] = [
        Compression::None,
        Compression::Rle,
        Compression::Zip,
        Compression::Zips,
        Compression::Piz,
        Compression::Pxr24,
        Compression::B44,
        Compression::B44a,
        Compression::Dwaa,
        Compression::Dwab,
    ];

    /// Name as it appears on the converter command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::None => "none",
            Compression::Rle => "rle",
            Compression::Zip => "zip",
            Compression::Zips => "zips",
            Compression::Piz => "piz",
            Compression::Pxr24 => "pxr24",
            Compression::B44 => "b44",
            Compression::B44a => "b44a",
            Compression::Dwaa => "dwaa",
            Compression::Dwab => "dwab",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Compression::ALL
            .into_iter()
            .find(|c| c.as_str() == lower)
            .ok_or_else(|| format!("Unknown compression: {}", s))
    }
}

/// Linear color conversion mode passed to the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearMode {
    Auto,
    On,
    #[default]
    Off,
}

impl LinearMode {
    /// Name as it appears on the converter command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            LinearMode::Auto => "auto",
            LinearMode::On => "on",
            LinearMode::Off => "off",
        }
    }
}

impl fmt::Display for LinearMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LinearMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(LinearMode::Auto),
            "on" => Ok(LinearMode::On),
            "off" => Ok(LinearMode::Off),
            _ => Err(format!("Unknown linear mode: {}", s)),
        }
    }
}

/// Options for one conversion batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
    /// Inserted before `.exr` in the derived file name (default: `_tiled`).
    pub postfix: String,
    /// EXR compression (default: zips).
    pub compression: Compression,
    /// Tile edge length in pixels (default: 64).
    pub tile_size: u32,
    /// Linear conversion mode (default: off).
    pub linear: LinearMode,
    /// Replace derived files that already exist (default: false).
    pub overwrite: bool,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            postfix: DEFAULT_POSTFIX.to_string(),
            compression: Compression::default(),
            tile_size: DEFAULT_TILE_SIZE,
            linear: LinearMode::default(),
            overwrite: false,
        }
    }
}

impl ConvertOptions {
    /// Reject option combinations the converter cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.tile_size == 0 {
            return Err(Error::invalid_input("tile size must be a positive integer"));
        }
        Ok(())
    }

    /// Option arguments in command line order.
    pub fn args(&self) -> Vec<String> {
        vec![
            "-compression".to_string(),
            self.compression.to_string(),
            "-tileSize".to_string(),
            self.tile_size.to_string(),
            "-linear".to_string(),
            self.linear.to_string(),
        ]
    }

    /// The option string as the converter documentation spells it.
    pub fn option_string(&self) -> String {
        self.args().join(" ")
    }
}
