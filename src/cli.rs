use clap::{Args, Parser, Subcommand};
use exrtiler_core::{
    AssetId, ColorSpacePolicy, Compression, ConvertOptions, LinearMode, Selection, SubstringFilter,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "exrtiler")]
#[command(author, version, about = "Convert textures to tiled OpenEXR and switch scenes between them")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the conversion state of every texture in a scene
    List {
        #[command(flatten)]
        scene: SceneArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert scene textures to tiled EXR and point them at the result
    Convert {
        #[command(flatten)]
        scene: SceneArgs,

        #[command(flatten)]
        convert: ConvertArgs,

        #[command(flatten)]
        color_space: ColorSpaceArgs,
    },

    /// Point converted textures back at their source images
    Revert {
        #[command(flatten)]
        scene: SceneArgs,

        #[command(flatten)]
        color_space: ColorSpaceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Point reverted textures at their tiled EXR again
    Switch {
        #[command(flatten)]
        scene: SceneArgs,

        /// Postfix of the derived files (defaults to the configured one)
        #[arg(long)]
        postfix: Option<String>,

        #[command(flatten)]
        color_space: ColorSpaceArgs,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert image files directly, without a scene
    ConvertFiles {
        /// Images to convert
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        convert: ConvertArgs,
    },

    /// Check that the converter executable can be found
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SceneArgs {
    /// Scene manifest (JSON)
    #[arg(short, long)]
    pub scene: PathBuf,

    /// Only these asset ids (comma separated); all assets if omitted
    #[arg(long, value_delimiter = ',')]
    pub ids: Vec<String>,
}

impl SceneArgs {
    pub fn selection(&self) -> Selection {
        if self.ids.is_empty() {
            Selection::All
        } else {
            Selection::Ids(self.ids.iter().map(|id| AssetId::from(id.as_str())).collect())
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ConvertArgs {
    /// Path to img2tiledexr (overrides config and PATH lookup)
    #[arg(short = 'x', long)]
    pub executable: Option<PathBuf>,

    /// Postfix inserted before .exr in derived file names
    #[arg(long)]
    pub postfix: Option<String>,

    /// EXR compression (none, rle, zip, zips, piz, pxr24, b44, b44a, dwaa, dwab)
    #[arg(long)]
    pub compression: Option<Compression>,

    /// Tile size in pixels
    #[arg(long)]
    pub tile_size: Option<u32>,

    /// Linear conversion (auto, on, off)
    #[arg(long)]
    pub linear: Option<LinearMode>,

    /// Replace derived files that already exist
    #[arg(long)]
    pub overwrite: bool,

    /// Number of conversions running at once
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// Kill a conversion after this many seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Print the converter commands without running them or saving the scene
    #[arg(long)]
    pub dry_run: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ConvertArgs {
    /// Command line values layered over the configured defaults.
    pub fn options(&self, defaults: &ConvertOptions) -> ConvertOptions {
        ConvertOptions {
            postfix: self.postfix.clone().unwrap_or_else(|| defaults.postfix.clone()),
            compression: self.compression.unwrap_or(defaults.compression),
            tile_size: self.tile_size.unwrap_or(defaults.tile_size),
            linear: self.linear.unwrap_or(defaults.linear),
            overwrite: self.overwrite || defaults.overwrite,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ColorSpaceArgs {
    /// Keep each texture's color space when its path changes
    #[arg(long)]
    pub preserve_color_space: bool,

    /// Comma separated path substrings the preservation applies to
    #[arg(long)]
    pub filter: Option<String>,
}

impl ColorSpaceArgs {
    pub fn policy(&self, configured: &ColorSpacePolicy) -> ColorSpacePolicy {
        ColorSpacePolicy {
            preserve: self.preserve_color_space || configured.preserve,
            filter: self
                .filter
                .as_deref()
                .map(SubstringFilter::parse)
                .unwrap_or_else(|| configured.filter.clone()),
        }
    }
}
