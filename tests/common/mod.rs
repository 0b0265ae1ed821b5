//! Shared helpers for integration tests.
//!
//! Provides [`SceneFixture`], a temp directory holding texture files and a
//! scene manifest, and [`CopyRunner`], a converter stand-in that "converts"
//! by copying the source to the derived path.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use exrtiler_core::{CommandLine, CommandRunner, Error, ToolOutput};
use serde_json::json;
use tempfile::TempDir;

/// Temp directory with textures and a `scene.json` manifest.
pub struct SceneFixture {
    pub dir: TempDir,
}

impl SceneFixture {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temp dir"),
        }
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Create an image file with placeholder contents.
    pub fn touch(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, b"not really an image").expect("failed to write texture");
        path
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path("scene.json")
    }

    /// Write a manifest with one unconverted asset per `(id, file, color_space)`.
    pub fn write_manifest(&self, assets: &[(&str, &str, &str)]) -> PathBuf {
        let assets: Vec<_> = assets
            .iter()
            .map(|(id, file, color_space)| {
                json!({
                    "id": id,
                    "attrs": {
                        "fileTextureName": self.path(file).to_string_lossy(),
                        "colorSpace": color_space,
                    }
                })
            })
            .collect();
        let path = self.manifest_path();
        std::fs::write(&path, serde_json::to_string_pretty(&json!({ "assets": assets })).unwrap())
            .expect("failed to write manifest");
        path
    }

    pub fn read_manifest(&self) -> serde_json::Value {
        let content = std::fs::read_to_string(self.manifest_path()).expect("failed to read manifest");
        serde_json::from_str(&content).expect("manifest is not JSON")
    }

    /// Attribute `name` of asset `id` in the saved manifest.
    pub fn attr(&self, id: &str, name: &str) -> Option<String> {
        self.read_manifest()["assets"]
            .as_array()?
            .iter()
            .find(|a| a["id"] == id)?["attrs"][name]
            .as_str()
            .map(String::from)
    }
}

/// Copies source to derived, failing for sources whose name contains "corrupt".
#[derive(Default)]
pub struct CopyRunner;

#[async_trait]
impl CommandRunner for CopyRunner {
    async fn run(&self, command: &CommandLine) -> exrtiler_core::Result<ToolOutput> {
        let source = Path::new(&command.args[0]);
        let derived = Path::new(&command.args[1]);
        if source.to_string_lossy().contains("corrupt") {
            return Err(Error::tool("img2tiledexr", "exited with status 1: bad header"));
        }
        tokio::fs::copy(source, derived).await?;
        Ok(ToolOutput::default())
    }
}

/// Shell script behaving like the converter, for CLI tests.
#[cfg(unix)]
pub fn fake_converter(dir: &Path) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("img2tiledexr");
    std::fs::write(
        &script,
        "#!/bin/sh\n\
         case \"$1\" in *corrupt*) echo \"cannot read $1\" >&2; exit 1;; esac\n\
         echo \"$@\" >> \"$(dirname \"$0\")/calls.log\"\n\
         cp \"$1\" \"$2\"\n",
    )
    .expect("failed to write fake converter");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}
