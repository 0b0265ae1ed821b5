//! Boundary with the host scene.
//!
//! The scene owns the durable copy of every asset's bookkeeping as loose
//! string attributes. [`load_records`] turns those into validated
//! [`AssetRecord`]s and [`commit`] writes lifecycle transitions back.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::asset::{AssetId, AssetRecord, AssetState};
use crate::lifecycle::Transition;
use crate::{Error, Result};

/// Attribute names used on scene assets.
pub mod attr {
    /// Path the asset currently reads from.
    pub const PATH: &str = "fileTextureName";
    /// Lifecycle flag: 0 not converted, 1 source active, 2 tiled active.
    pub const STATE: &str = "tiledExrState";
    /// Pre-conversion path, written on first successful conversion.
    pub const SOURCE: &str = "tiledExrSource";
    pub const COLOR_SPACE: &str = "colorSpace";
}

/// Which assets to enumerate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Ids(Vec<AssetId>),
}

impl Selection {
    pub fn contains(&self, id: &AssetId) -> bool {
        match self {
            Selection::All => true,
            Selection::Ids(ids) => ids.contains(id),
        }
    }
}

/// An asset as the scene reports it, before validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawAsset {
    /// Absent when the asset has never been touched.
    pub state_flag: Option<i64>,
    pub id: AssetId,
    pub path: PathBuf,
}

/// Read/write access to the host scene's asset attributes.
pub trait SceneStore {
    /// List image-bearing assets matching `selection`.
    fn enumerate_assets(&self, selection: &Selection) -> Result<Vec<RawAsset>>;

    /// Read an attribute; `None` if the asset does not carry it.
    fn read_attr(&self, id: &AssetId, name: &str) -> Result<Option<String>>;

    /// Write an attribute, creating it if needed.
    fn write_attr(&mut self, id: &AssetId, name: &str, value: &str) -> Result<()>;
}

/// Load and validate records for `selection`.
///
/// Assets whose attributes contradict each other are skipped with a warning
/// rather than failing the whole load.
pub fn load_records<S: SceneStore + ?Sized>(
    store: &S,
    selection: &Selection,
) -> Result<Vec<AssetRecord>> {
    let raw = store.enumerate_assets(selection)?;
    let mut records = Vec::with_capacity(raw.len());

    for asset in raw {
        let id = asset.id.clone();
        match normalize(store, asset) {
            Ok(record) => records.push(record),
            Err(Error::Scene(reason)) => {
                warn!(asset = %id, %reason, "Skipping asset with inconsistent attributes");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(records)
}

fn normalize<S: SceneStore + ?Sized>(store: &S, asset: RawAsset) -> Result<AssetRecord> {
    let state = match asset.state_flag {
        None => AssetState::NotConverted,
        Some(flag) => AssetState::from_flag(flag).ok_or_else(|| {
            Error::scene(format!("asset {} has unknown state flag {flag}", asset.id))
        })?,
    };

    let mut source = store
        .read_attr(&asset.id, attr::SOURCE)?
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);
    let color_space = store
        .read_attr(&asset.id, attr::COLOR_SPACE)?
        .unwrap_or_default();

    if state == AssetState::NotConverted && source.is_some() {
        debug!(asset = %asset.id, "Ignoring leftover source attribute on unconverted asset");
        source = None;
    }

    AssetRecord::restore(asset.id, asset.path, source, color_space, state)
}

/// Persist `transitions` and refresh the affected records' color spaces.
///
/// The new path is written after the bookkeeping attributes. A restored color
/// space is written last so it wins over whatever the scene assigned when the
/// path changed; otherwise the scene's value is read back into the record.
pub fn commit<S: SceneStore + ?Sized>(
    store: &mut S,
    records: &mut [AssetRecord],
    transitions: &[Transition],
) -> Result<()> {
    for transition in transitions {
        let id = &transition.id;
        store.write_attr(id, attr::SOURCE, &transition.source_path.to_string_lossy())?;
        store.write_attr(id, attr::STATE, &transition.to.as_flag().to_string())?;
        store.write_attr(id, attr::PATH, &transition.active_path.to_string_lossy())?;

        let color_space = match &transition.restore_color_space {
            Some(color_space) => {
                store.write_attr(id, attr::COLOR_SPACE, color_space)?;
                Some(color_space.clone())
            }
            None => store.read_attr(id, attr::COLOR_SPACE)?,
        };

        if let Some(color_space) = color_space {
            for record in records.iter_mut().filter(|r| r.id() == id) {
                record.sync_color_space(color_space.clone());
            }
        }
    }

    Ok(())
}
