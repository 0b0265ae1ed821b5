//! Lifecycle controller: converts assets and flips their active path.
//!
//! The controller is the only code that mutates [`AssetRecord`]s. Every
//! mutation is also returned as a [`Transition`] so the scene boundary can
//! persist it. Operations are not meant to run concurrently on the same
//! record set; callers serialize them.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::asset::{AssetId, AssetRecord, AssetState};
use crate::colorspace::ColorSpacePolicy;
use crate::engine::{ConversionEngine, DEFAULT_CONCURRENCY};
use crate::job::{ConversionJob, ConversionResult, ConversionStatus};
use crate::options::ConvertOptions;
use crate::path;
use crate::runner::CommandRunner;
use crate::{Error, Result};

/// Everything `convert` needs besides the records.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    /// Converter executable; must be non-empty.
    pub executable: PathBuf,
    pub options: ConvertOptions,
    /// Number of concurrent workers (at least 1).
    pub concurrency: usize,
    pub color_space: ColorSpacePolicy,
}

impl ConvertRequest {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            options: ConvertOptions::default(),
            concurrency: DEFAULT_CONCURRENCY,
            color_space: ColorSpacePolicy::default(),
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_color_space(mut self, policy: ColorSpacePolicy) -> Self {
        self.color_space = policy;
        self
    }
}

/// A state change applied to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub id: AssetId,
    pub from: AssetState,
    pub to: AssetState,
    pub active_path: PathBuf,
    pub source_path: PathBuf,
    /// Color space to write back once the new path is in place. `None` means
    /// the scene keeps whatever it assigns.
    pub restore_color_space: Option<String>,
}

/// Outcome of one submitted asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportEntry {
    pub asset: AssetId,
    #[serde(flatten)]
    pub result: ConversionResult,
}

/// Result of a `convert` call.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub batch_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// One entry per submitted asset; excluded assets do not appear.
    pub entries: Vec<ReportEntry>,
    /// Records that were mutated (successful conversions only).
    pub transitions: Vec<Transition>,
}

impl ConversionReport {
    pub fn succeeded(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Success))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Skipped { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Failed { .. }))
    }

    /// Entries the user should see as errors.
    pub fn failures(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries
            .iter()
            .filter(|e| matches!(e.result.status, ConversionStatus::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ConversionStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| predicate(&e.result.status)).count()
    }
}

/// A record an operation refused to touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub asset: AssetId,
    pub reason: String,
}

/// Result of `revert_to_source` / `switch_to_derived`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SwitchReport {
    pub transitions: Vec<Transition>,
    pub rejected: Vec<Rejection>,
}

/// Read-only projection of a record for presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateEntry {
    pub state: AssetState,
    pub id: AssetId,
    pub active_path: PathBuf,
}

/// Orchestrates conversions and path switches over a set of records.
pub struct LifecycleController<R> {
    engine: ConversionEngine<R>,
}

impl<R: CommandRunner + 'static> LifecycleController<R> {
    pub fn new(engine: ConversionEngine<R>) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &ConversionEngine<R> {
        &self.engine
    }

    /// Convert every record whose source file can be found and point the
    /// successful ones at their tiled EXR.
    ///
    /// The file submitted for a record is its stored source path when that
    /// still exists, otherwise its active path. Records whose file is missing
    /// are left out of the batch and the report. Records resolving to the same
    /// file share one job. Skipped and failed records are not modified.
    ///
    /// # Errors
    ///
    /// Only invalid requests fail the call: empty executable, zero
    /// concurrency or invalid options.
    pub async fn convert(
        &self,
        records: &mut [AssetRecord],
        request: &ConvertRequest,
    ) -> Result<ConversionReport> {
        request.options.validate()?;
        if request.executable.as_os_str().is_empty() {
            return Err(Error::invalid_input("no converter executable given"));
        }
        if request.concurrency == 0 {
            return Err(Error::invalid_input("concurrency must be at least 1"));
        }

        let batch_id = Uuid::new_v4();
        let started_at = Utc::now();

        let mut jobs: Vec<ConversionJob> = Vec::new();
        let mut queued: HashSet<PathBuf> = HashSet::new();
        let mut submitted: Vec<(usize, PathBuf)> = Vec::new();

        for (index, record) in records.iter().enumerate() {
            let Some(resolved) = resolve_source(record) else {
                continue;
            };
            if queued.insert(resolved.clone()) {
                jobs.push(ConversionJob::new(
                    &request.executable,
                    &resolved,
                    &request.options,
                ));
            }
            submitted.push((index, resolved));
        }

        info!(
            batch = %batch_id,
            assets = submitted.len(),
            jobs = jobs.len(),
            "Submitting assets for conversion"
        );

        let results = self.engine.submit_batch(jobs, request.concurrency).await?;
        let by_source: HashMap<&PathBuf, &ConversionResult> =
            results.iter().map(|r| (&r.source_file, r)).collect();

        let mut entries = Vec::with_capacity(submitted.len());
        let mut transitions = Vec::new();

        for (index, resolved) in submitted {
            let record = &mut records[index];
            let Some(result) = by_source.get(&resolved) else {
                // submit_batch reports every job, so this is unreachable in practice.
                warn!(asset = %record.id, "No conversion result for asset");
                continue;
            };

            if result.status.is_success() {
                transitions.push(apply_conversion(record, result, &request.color_space));
            } else {
                debug!(
                    asset = %record.id,
                    status = result.status.label(),
                    "Asset left unchanged"
                );
            }

            entries.push(ReportEntry {
                asset: record.id.clone(),
                result: (*result).clone(),
            });
        }

        let report = ConversionReport {
            batch_id,
            started_at,
            finished_at: Utc::now(),
            entries,
            transitions,
        };

        info!(
            batch = %batch_id,
            converted = report.succeeded(),
            skipped = report.skipped(),
            failed = report.failed(),
            "Conversion finished"
        );

        Ok(report)
    }
}

impl<R> LifecycleController<R> {
    /// Point every converted record back at its source file.
    ///
    /// Unconverted records are rejected and left alone.
    pub fn revert_to_source(
        &self,
        records: &mut [AssetRecord],
        policy: &ColorSpacePolicy,
    ) -> SwitchReport {
        revert_to_source(records, policy)
    }

    /// Point every record showing its source at the derived file for
    /// `postfix`. Records in any other state are rejected.
    pub fn switch_to_derived(
        &self,
        records: &mut [AssetRecord],
        postfix: &str,
        policy: &ColorSpacePolicy,
    ) -> SwitchReport {
        switch_to_derived(records, postfix, policy)
    }

    pub fn list_state(&self, records: &[AssetRecord]) -> Vec<StateEntry> {
        list_state(records)
    }
}

/// See [`LifecycleController::revert_to_source`].
pub fn revert_to_source(records: &mut [AssetRecord], policy: &ColorSpacePolicy) -> SwitchReport {
    apply_each(records, |record| revert_record(record, policy))
}

/// See [`LifecycleController::switch_to_derived`].
pub fn switch_to_derived(
    records: &mut [AssetRecord],
    postfix: &str,
    policy: &ColorSpacePolicy,
) -> SwitchReport {
    apply_each(records, |record| switch_record(record, postfix, policy))
}

/// `(state, id, active_path)` for each record, in input order.
pub fn list_state(records: &[AssetRecord]) -> Vec<StateEntry> {
    records
        .iter()
        .map(|r| StateEntry {
            state: r.state,
            id: r.id.clone(),
            active_path: r.active_path.clone(),
        })
        .collect()
}

/// Revert a single converted record to its source.
///
/// # Errors
///
/// [`Error::StateInconsistency`] if the record was never converted.
pub fn revert_record(record: &mut AssetRecord, policy: &ColorSpacePolicy) -> Result<Transition> {
    let source = match (&record.source_path, record.state.is_converted()) {
        (Some(source), true) => source.clone(),
        _ => {
            return Err(Error::StateInconsistency {
                id: record.id.clone(),
                state: record.state,
                operation: "revert to source",
            })
        }
    };

    let restore = policy.restore_for(&source, &record.color_space);
    Ok(set_active(record, source.clone(), source, AssetState::ConvertedInactive, restore))
}

/// Switch a single record from its source to the derived file for `postfix`.
///
/// # Errors
///
/// [`Error::StateInconsistency`] unless the record is `ConvertedInactive`.
pub fn switch_record(
    record: &mut AssetRecord,
    postfix: &str,
    policy: &ColorSpacePolicy,
) -> Result<Transition> {
    let source = match (&record.source_path, record.state) {
        (Some(source), AssetState::ConvertedInactive) => source.clone(),
        _ => {
            return Err(Error::StateInconsistency {
                id: record.id.clone(),
                state: record.state,
                operation: "switch to derived",
            })
        }
    };

    let derived = path::derive(&source, postfix);
    if derived == source {
        return Err(Error::invalid_input(format!(
            "derived file for asset {} with postfix {:?} is its own source {}",
            record.id,
            postfix,
            source.display()
        )));
    }
    if !derived.exists() {
        warn!(
            asset = %record.id,
            derived = %derived.display(),
            "Switching to a derived file that does not exist yet"
        );
    }

    let restore = policy.restore_for(&derived, &record.color_space);
    Ok(set_active(record, derived, source, AssetState::ConvertedActive, restore))
}

/// Pick the file to convert for `record`, or `None` if nothing usable exists.
fn resolve_source(record: &AssetRecord) -> Option<PathBuf> {
    if let Some(source) = record.source_path.as_deref() {
        if source.exists() {
            return Some(source.to_path_buf());
        }
        if record.state == AssetState::ConvertedActive {
            // The active path is a derived file, which becomes the new source.
            warn!(
                asset = %record.id,
                source = %source.display(),
                active = %record.active_path.display(),
                "Stored source is missing, converting the active tiled file instead"
            );
        } else {
            debug!(
                asset = %record.id,
                source = %source.display(),
                "Stored source is missing, falling back to the active path"
            );
        }
    }

    if record.active_path.exists() {
        Some(record.active_path.clone())
    } else {
        warn!(
            asset = %record.id,
            error = %Error::missing_source(&record.active_path),
            "Excluding asset from conversion"
        );
        None
    }
}

fn apply_conversion(
    record: &mut AssetRecord,
    result: &ConversionResult,
    policy: &ColorSpacePolicy,
) -> Transition {
    let restore = policy.restore_for(&result.derived_file, &record.color_space);
    set_active(
        record,
        result.derived_file.clone(),
        result.source_file.clone(),
        AssetState::ConvertedActive,
        restore,
    )
}

/// Update path, source, state and color space together.
fn set_active(
    record: &mut AssetRecord,
    active_path: PathBuf,
    source_path: PathBuf,
    to: AssetState,
    restore_color_space: Option<String>,
) -> Transition {
    let from = record.state;

    record.active_path = active_path.clone();
    record.source_path = Some(source_path.clone());
    record.state = to;
    if let Some(ref color_space) = restore_color_space {
        record.color_space = color_space.clone();
    }

    debug!(asset = %record.id, ?from, ?to, path = %active_path.display(), "Asset switched");

    Transition {
        id: record.id.clone(),
        from,
        to,
        active_path,
        source_path,
        restore_color_space,
    }
}

fn apply_each(
    records: &mut [AssetRecord],
    mut op: impl FnMut(&mut AssetRecord) -> Result<Transition>,
) -> SwitchReport {
    let mut report = SwitchReport::default();
    for record in records.iter_mut() {
        match op(record) {
            Ok(transition) => report.transitions.push(transition),
            Err(e) => {
                debug!(asset = %record.id, error = %e, "Asset rejected");
                report.rejected.push(Rejection {
                    asset: record.id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::CommandLine;
    use crate::runner::ToolOutput;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::Path;
    use tempfile::{tempdir, TempDir};

    /// Succeeds unless the source name contains "bad"; records invocations.
    #[derive(Default)]
    struct StubRunner {
        calls: Mutex<Vec<CommandLine>>,
    }

    #[async_trait]
    impl CommandRunner for StubRunner {
        async fn run(&self, command: &CommandLine) -> Result<ToolOutput> {
            self.calls.lock().push(command.clone());
            let name = Path::new(&command.args[0]).file_name().unwrap_or_default();
            if name.to_string_lossy().starts_with("bad") {
                return Err(Error::tool("img2tiledexr", "exited with status 1: unreadable"));
            }
            Ok(ToolOutput::default())
        }
    }

    fn controller() -> LifecycleController<StubRunner> {
        LifecycleController::new(ConversionEngine::new(StubRunner::default()))
    }

    fn request() -> ConvertRequest {
        ConvertRequest::new("/opt/vray/bin/img2tiledexr").with_concurrency(4)
    }

    fn touch(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"img").unwrap();
        path
    }

    #[tokio::test]
    async fn convert_points_record_at_derived_file() {
        let dir = tempdir().unwrap();
        let tex = touch(&dir, "tex.tga");
        let mut records = vec![AssetRecord::new("A", &tex, "sRGB")];

        let options = ConvertOptions {
            postfix: "_tiled".into(),
            ..Default::default()
        };
        let report = controller()
            .convert(&mut records, &request().with_options(options))
            .await
            .unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.succeeded(), 1);
        let record = &records[0];
        assert_eq!(record.active_path(), dir.path().join("tex_tiled.exr"));
        assert_eq!(record.source_path(), Some(tex.as_path()));
        assert_eq!(record.state(), AssetState::ConvertedActive);

        let transition = &report.transitions[0];
        assert_eq!(transition.from, AssetState::NotConverted);
        assert_eq!(transition.to, AssetState::ConvertedActive);
        assert_eq!(transition.restore_color_space, None);
    }

    #[tokio::test]
    async fn failed_and_skipped_records_untouched() {
        let dir = tempdir().unwrap();
        let bad = touch(&dir, "bad.tga");
        let done = touch(&dir, "done.tga");
        touch(&dir, "done_tiled.exr");

        let mut records = vec![
            AssetRecord::new("bad", &bad, "sRGB"),
            AssetRecord::new("done", &done, "sRGB"),
        ];
        let before = records.clone();

        let report = controller().convert(&mut records, &request()).await.unwrap();

        assert_eq!(report.failed(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(report.transitions.is_empty());
        assert_eq!(records, before);
        assert_eq!(report.failures().count(), 1);
    }

    #[tokio::test]
    async fn missing_files_are_excluded() {
        let dir = tempdir().unwrap();
        let present = touch(&dir, "present.tga");
        let mut records = vec![
            AssetRecord::new("gone", dir.path().join("gone.tga"), "sRGB"),
            AssetRecord::new("present", &present, "sRGB"),
        ];

        let controller = controller();
        let report = controller.convert(&mut records, &request()).await.unwrap();

        assert_eq!(report.entries.len(), 1);
        assert_eq!(report.entries[0].asset, AssetId::from("present"));
        assert_eq!(controller.engine().runner().calls.lock().len(), 1);
        assert_eq!(records[0].state(), AssetState::NotConverted);
    }

    #[tokio::test]
    async fn stored_source_preferred_over_active_path() {
        let dir = tempdir().unwrap();
        let source = touch(&dir, "grass.tga");
        let derived = touch(&dir, "grass_tiled.exr");
        let mut records = vec![AssetRecord::restore(
            "A",
            &derived,
            Some(source.clone()),
            "sRGB",
            AssetState::ConvertedActive,
        )
        .unwrap()];

        let options = ConvertOptions {
            postfix: "_tx".into(),
            ..Default::default()
        };
        let controller = controller();
        controller
            .convert(&mut records, &request().with_options(options))
            .await
            .unwrap();

        let calls = controller.engine().runner().calls.lock().clone();
        assert_eq!(calls[0].args[0], source.to_string_lossy());
        assert_eq!(records[0].active_path(), dir.path().join("grass_tx.exr"));
        assert_eq!(records[0].source_path(), Some(source.as_path()));
    }

    #[tokio::test]
    async fn stale_source_repaired_from_active_path() {
        let dir = tempdir().unwrap();
        let derived = touch(&dir, "tex_tiled.exr");
        // Converted earlier, but the source image has since been deleted.
        let mut records = vec![AssetRecord::restore(
            "A",
            &derived,
            Some(dir.path().join("tex.tga")),
            "sRGB",
            AssetState::ConvertedActive,
        )
        .unwrap()];

        let controller = controller();
        let report = controller.convert(&mut records, &request()).await.unwrap();

        // The tiled file is all that is left, so it is converted again.
        assert_eq!(report.succeeded(), 1);
        let calls = controller.engine().runner().calls.lock().clone();
        assert_eq!(calls[0].args[0], derived.to_string_lossy());
        assert_eq!(records[0].source_path(), Some(derived.as_path()));
        assert_eq!(records[0].active_path(), dir.path().join("tex_tiled_tiled.exr"));
        assert_eq!(records[0].state(), AssetState::ConvertedActive);
    }

    #[tokio::test]
    async fn sources_sharing_a_derived_name_convert_once() {
        let dir = tempdir().unwrap();
        let tga = touch(&dir, "tex.tga");
        let png = touch(&dir, "tex.png");
        let mut records = vec![
            AssetRecord::new("A", &tga, "sRGB"),
            AssetRecord::new("B", &png, "sRGB"),
        ];

        let controller = controller();
        let report = controller.convert(&mut records, &request()).await.unwrap();

        let calls = controller.engine().runner().calls.lock().clone();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].args[0], tga.to_string_lossy());

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.skipped(), 1);
        assert_matches!(
            &report.entries[1].result.status,
            ConversionStatus::Skipped { reason } if reason.contains("tex.tga")
        );
        assert_eq!(records[0].state(), AssetState::ConvertedActive);
        assert_eq!(records[1].state(), AssetState::NotConverted);
        assert_eq!(records[1].active_path(), png.as_path());
    }

    #[tokio::test]
    async fn exr_source_never_converted_onto_itself() {
        let dir = tempdir().unwrap();
        let sky = touch(&dir, "sky.exr");
        let mut records = vec![AssetRecord::new("A", &sky, "Linear")];

        let options = ConvertOptions {
            postfix: String::new(),
            overwrite: true,
            ..Default::default()
        };
        let controller = controller();
        let report = controller
            .convert(&mut records, &request().with_options(options))
            .await
            .unwrap();

        assert_eq!(report.failed(), 1);
        assert!(report.transitions.is_empty());
        assert!(controller.engine().runner().calls.lock().is_empty());
        assert_eq!(records[0].state(), AssetState::NotConverted);
        assert_eq!(records[0].source_path(), None);
    }

    #[tokio::test]
    async fn shared_source_converted_once() {
        let dir = tempdir().unwrap();
        let tex = touch(&dir, "shared.tga");
        let mut records = vec![
            AssetRecord::new("A", &tex, "sRGB"),
            AssetRecord::new("B", &tex, "sRGB"),
        ];

        let controller = controller();
        let report = controller.convert(&mut records, &request()).await.unwrap();

        assert_eq!(controller.engine().runner().calls.lock().len(), 1);
        assert_eq!(report.entries.len(), 2);
        assert!(records.iter().all(|r| r.state() == AssetState::ConvertedActive));
    }

    #[tokio::test]
    async fn convert_restores_color_space_when_filter_matches() {
        let dir = tempdir().unwrap();
        let matched = touch(&dir, "grass_sRGB.tga");
        let unmatched = touch(&dir, "rock.tga");
        let mut records = vec![
            AssetRecord::new("matched", &matched, "Utility - sRGB - Texture"),
            AssetRecord::new("unmatched", &unmatched, "Utility - sRGB - Texture"),
        ];

        let report = controller()
            .convert(
                &mut records,
                &request().with_color_space(ColorSpacePolicy::new(true, "sRGB,raw")),
            )
            .await
            .unwrap();

        let restore: HashMap<_, _> = report
            .transitions
            .iter()
            .map(|t| (t.id.as_str().to_string(), t.restore_color_space.clone()))
            .collect();
        assert_eq!(
            restore["matched"],
            Some("Utility - sRGB - Texture".to_string())
        );
        assert_eq!(restore["unmatched"], None);
    }

    #[tokio::test]
    async fn invalid_requests_fail_outright() {
        let mut records = vec![AssetRecord::new("A", "/nonexistent/a.tga", "sRGB")];

        let err = controller()
            .convert(&mut records, &ConvertRequest::new(""))
            .await
            .unwrap_err();
        assert_matches!(err, Error::InvalidInput(_));

        let err = controller()
            .convert(&mut records, &request().with_concurrency(0))
            .await
            .unwrap_err();
        assert_matches!(err, Error::InvalidInput(_));
    }

    fn converted(dir: &Path) -> AssetRecord {
        AssetRecord::restore(
            "A",
            dir.join("tex_tiled.exr"),
            Some(dir.join("tex.tga")),
            "sRGB",
            AssetState::ConvertedActive,
        )
        .unwrap()
    }

    #[test]
    fn revert_then_switch_round_trip() {
        let dir = Path::new("/proj/images");
        let mut records = vec![converted(dir)];
        let controller = controller();
        let policy = ColorSpacePolicy::disabled();

        let report = controller.revert_to_source(&mut records, &policy);
        assert!(report.rejected.is_empty());
        assert_eq!(records[0].active_path(), dir.join("tex.tga"));
        assert_eq!(records[0].state(), AssetState::ConvertedInactive);

        let report = controller.switch_to_derived(&mut records, "_tiled", &policy);
        assert!(report.rejected.is_empty());
        assert_eq!(records[0].active_path(), dir.join("tex_tiled.exr"));
        assert_eq!(records[0].state(), AssetState::ConvertedActive);
        assert_eq!(records[0].source_path(), Some(dir.join("tex.tga").as_path()));
    }

    #[test]
    fn switch_honors_new_postfix() {
        let dir = Path::new("/proj/images");
        let mut record = converted(dir);
        revert_record(&mut record, &ColorSpacePolicy::disabled()).unwrap();

        let transition =
            switch_record(&mut record, "_tx", &ColorSpacePolicy::disabled()).unwrap();
        assert_eq!(transition.active_path, path::derive(&dir.join("tex.tga"), "_tx"));
    }

    #[test]
    fn switch_rejects_wrong_state() {
        let mut record = AssetRecord::new("A", "/p/tex.tga", "sRGB");
        let err = switch_record(&mut record, "_tiled", &ColorSpacePolicy::disabled()).unwrap_err();
        assert_matches!(
            err,
            Error::StateInconsistency { state: AssetState::NotConverted, .. }
        );

        let mut record = converted(Path::new("/p"));
        let err = switch_record(&mut record, "_tiled", &ColorSpacePolicy::disabled()).unwrap_err();
        assert_matches!(
            err,
            Error::StateInconsistency { state: AssetState::ConvertedActive, .. }
        );
        assert_eq!(record.state(), AssetState::ConvertedActive);
    }

    #[test]
    fn switch_refuses_derived_equal_to_source() {
        let mut record = AssetRecord::restore(
            "A",
            "/p/sky.exr",
            Some(PathBuf::from("/p/sky.exr")),
            "Linear",
            AssetState::ConvertedInactive,
        )
        .unwrap();

        let err = switch_record(&mut record, "", &ColorSpacePolicy::disabled()).unwrap_err();
        assert_matches!(err, Error::InvalidInput(msg) if msg.contains("own source"));
        assert_eq!(record.state(), AssetState::ConvertedInactive);
        assert_eq!(record.active_path(), Path::new("/p/sky.exr"));

        let mut records = vec![record];
        let report = switch_to_derived(&mut records, "", &ColorSpacePolicy::disabled());
        assert!(report.transitions.is_empty());
        assert_eq!(report.rejected.len(), 1);
    }

    #[test]
    fn revert_rejects_unconverted_in_batch() {
        let mut records = vec![
            AssetRecord::new("fresh", "/p/a.tga", "sRGB"),
            converted(Path::new("/p")),
        ];
        let report = controller().revert_to_source(&mut records, &ColorSpacePolicy::disabled());

        assert_eq!(report.transitions.len(), 1);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].asset, AssetId::from("fresh"));
        assert_eq!(records[0].state(), AssetState::NotConverted);
    }

    #[test]
    fn color_space_filter_applies_in_both_directions() {
        let policy = ColorSpacePolicy::new(true, "_tiled");
        let mut record = converted(Path::new("/p"));

        // Source path does not contain the token.
        let back = revert_record(&mut record, &policy).unwrap();
        assert_eq!(back.restore_color_space, None);

        // Derived path does.
        let forward = switch_record(&mut record, "_tiled", &policy).unwrap();
        assert_eq!(forward.restore_color_space, Some("sRGB".to_string()));
    }

    #[test]
    fn list_state_projects_records() {
        let records = vec![
            AssetRecord::new("fresh", "/p/a.tga", "sRGB"),
            converted(Path::new("/p")),
        ];
        let listed = controller().list_state(&records);
        assert_eq!(
            listed,
            vec![
                StateEntry {
                    state: AssetState::NotConverted,
                    id: AssetId::from("fresh"),
                    active_path: PathBuf::from("/p/a.tga"),
                },
                StateEntry {
                    state: AssetState::ConvertedActive,
                    id: AssetId::from("A"),
                    active_path: PathBuf::from("/p/tex_tiled.exr"),
                },
            ]
        );
    }
}
