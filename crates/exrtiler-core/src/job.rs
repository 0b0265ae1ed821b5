//! Records flowing through the conversion engine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::options::ConvertOptions;
use crate::path;

/// Reason reported for jobs whose derived file is already on disk.
pub const SKIPPED_EXISTING: &str = "file already exists and overwrite is disabled";

/// A single conversion request. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionJob {
    executable: PathBuf,
    source_file: PathBuf,
    derived_file: PathBuf,
    overwrite: bool,
    options: Vec<String>,
}

impl ConversionJob {
    /// Build a job converting `source_file` next to itself, named with the
    /// postfix from `options`.
    pub fn new(executable: &Path, source_file: &Path, options: &ConvertOptions) -> Self {
        Self {
            executable: executable.to_path_buf(),
            source_file: source_file.to_path_buf(),
            derived_file: path::derive(source_file, &options.postfix),
            overwrite: options.overwrite,
            options: options.args(),
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn source_file(&self) -> &Path {
        &self.source_file
    }

    pub fn derived_file(&self) -> &Path {
        &self.derived_file
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// `-compression <c> -tileSize <n> -linear <mode>`
    pub fn option_string(&self) -> String {
        self.options.join(" ")
    }

    /// The converter invocation for this job.
    pub fn command_line(&self) -> CommandLine {
        let mut args = Vec::with_capacity(self.options.len() + 2);
        args.push(self.source_file.to_string_lossy().into_owned());
        args.push(self.derived_file.to_string_lossy().into_owned());
        args.extend(self.options.iter().cloned());

        CommandLine {
            program: self.executable.clone(),
            args,
        }
    }
}

/// A program and its argument vector.
///
/// `Display` renders the converter's documented form, quoting the program and
/// both file arguments:
/// `"<executable>" "<source>" "<derived>" -compression zips -tileSize 64 -linear off`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandLine {
    /// Short program name for log and error messages.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.program.display())?;
        for (i, arg) in self.args.iter().enumerate() {
            // The two file arguments come first and are always quoted.
            if i < 2 {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Outcome of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ConversionStatus {
    Success,
    /// The converter was not run; carries the reason.
    Skipped { reason: String },
    /// The converter failed to launch, timed out or exited non-zero.
    Failed { error: String },
}

impl ConversionStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ConversionStatus::Success)
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConversionStatus::Success => "converted",
            ConversionStatus::Skipped { .. } => "skipped",
            ConversionStatus::Failed { .. } => "failed",
        }
    }
}

/// One result per submitted job, matched to it by `source_file`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionResult {
    pub source_file: PathBuf,
    pub derived_file: PathBuf,
    #[serde(flatten)]
    pub status: ConversionStatus,
}

impl ConversionResult {
    pub(crate) fn for_job(job: &ConversionJob, status: ConversionStatus) -> Self {
        Self {
            source_file: job.source_file.clone(),
            derived_file: job.derived_file.clone(),
            status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{Compression, LinearMode};

    #[test]
    fn test_job_derives_target() {
        let job = ConversionJob::new(
            Path::new("/opt/vray/bin/img2tiledexr"),
            Path::new("/proj/images/grass_CLR01.tga"),
            &ConvertOptions::default(),
        );
        assert_eq!(
            job.derived_file(),
            Path::new("/proj/images/grass_CLR01_tiled.exr")
        );
        assert!(!job.overwrite());
        assert_eq!(job.option_string(), "-compression zips -tileSize 64 -linear off");
    }

    #[test]
    fn test_command_line_format() {
        let options = ConvertOptions {
            compression: Compression::Piz,
            tile_size: 32,
            linear: LinearMode::On,
            ..Default::default()
        };
        let job = ConversionJob::new(
            Path::new("/opt/vray/bin/img2tiledexr"),
            Path::new("/proj/images/grass.tga"),
            &options,
        );
        let command = job.command_line();

        assert_eq!(
            command.to_string(),
            "\"/opt/vray/bin/img2tiledexr\" \"/proj/images/grass.tga\" \
             \"/proj/images/grass_tiled.exr\" -compression piz -tileSize 32 -linear on"
        );
        assert_eq!(command.args.len(), 8);
        assert_eq!(command.program_name(), "img2tiledexr");
    }

    #[test]
    fn test_status_serialization() {
        let result = ConversionResult {
            source_file: PathBuf::from("a.tga"),
            derived_file: PathBuf::from("a_tiled.exr"),
            status: ConversionStatus::Skipped {
                reason: SKIPPED_EXISTING.to_string(),
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "skipped");
        assert_eq!(json["reason"], SKIPPED_EXISTING);
        assert_eq!(json["derived_file"], "a_tiled.exr");
    }
}
