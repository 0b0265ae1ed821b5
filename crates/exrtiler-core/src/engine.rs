//! Bounded worker pool that runs conversion batches.
//!
//! [`ConversionEngine::submit_batch`] spawns `min(concurrency, jobs)` workers
//! for the duration of one call. Workers pull the next unclaimed job from a
//! shared queue, run it through the [`CommandRunner`] and send the outcome
//! back on a channel. The call returns once every job has exactly one result.
//! The engine only works on paths and never touches asset records.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::job::{ConversionJob, ConversionResult, ConversionStatus, SKIPPED_EXISTING};
use crate::options::ConvertOptions;
use crate::runner::CommandRunner;
use crate::{Error, Result};

/// Worker count used when the caller has no preference.
pub const DEFAULT_CONCURRENCY: usize = 8;

type PendingQueue = Arc<Mutex<VecDeque<(usize, ConversionJob)>>>;

/// Build one job per file, naming derived files with the options' postfix.
pub fn plan_jobs(
    executable: &Path,
    files: &[PathBuf],
    options: &ConvertOptions,
) -> Vec<ConversionJob> {
    files
        .iter()
        .map(|file| ConversionJob::new(executable, file, options))
        .collect()
}

/// Runs conversion jobs on a bounded pool of workers.
pub struct ConversionEngine<R> {
    runner: Arc<R>,
}

impl<R> Clone for ConversionEngine<R> {
    fn clone(&self) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
        }
    }
}

impl<R: CommandRunner + 'static> ConversionEngine<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Convert `files` with `options`; shorthand for [`plan_jobs`] followed by
    /// [`submit_batch`](Self::submit_batch).
    pub async fn convert_files(
        &self,
        executable: &Path,
        files: &[PathBuf],
        options: &ConvertOptions,
        concurrency: usize,
    ) -> Result<Vec<ConversionResult>> {
        options.validate()?;
        let jobs = plan_jobs(executable, files, options);
        self.submit_batch(jobs, concurrency).await
    }

    /// Run every job and wait for all of them.
    ///
    /// Results come back in submission order, one per job. A failing job never
    /// affects its siblings. Jobs that would write onto their own source,
    /// another job's source or another job's output are never run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if `concurrency` is zero or a job has an
    /// empty executable path. Per-job failures are reported in the results.
    pub async fn submit_batch(
        &self,
        jobs: Vec<ConversionJob>,
        concurrency: usize,
    ) -> Result<Vec<ConversionResult>> {
        if concurrency == 0 {
            return Err(Error::invalid_input("concurrency must be at least 1"));
        }
        if let Some(job) = jobs.iter().find(|j| j.executable().as_os_str().is_empty()) {
            return Err(Error::invalid_input(format!(
                "no converter executable given for {}",
                job.source_file().display()
            )));
        }
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let total = jobs.len();

        // Kept so a job whose worker died can still be reported.
        let submitted: Vec<ConversionJob> = jobs.clone();
        let mut results: Vec<Option<ConversionResult>> = vec![None; total];

        let (pending, rejected) = claim_outputs(jobs);
        for (index, result) in rejected {
            results[index] = Some(result);
        }

        let workers = concurrency.min(pending.len());
        info!(jobs = total, workers, "Starting conversion batch");

        let queue: PendingQueue = Arc::new(Mutex::new(pending));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel();

        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let queue = Arc::clone(&queue);
            let result_tx = result_tx.clone();
            let runner = Arc::clone(&self.runner);
            pool.spawn(async move {
                loop {
                    let next = queue.lock().pop_front();
                    let Some((index, job)) = next else {
                        break;
                    };
                    debug!(worker, job = index, source = %job.source_file().display(), "Worker picked up job");
                    let result = execute_job(runner.as_ref(), &job).await;
                    if result_tx.send((index, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        while let Some((index, result)) = result_rx.recv().await {
            results[index] = Some(result);
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Conversion worker terminated abnormally");
            }
        }

        let results: Vec<ConversionResult> = results
            .into_iter()
            .zip(submitted.iter())
            .map(|(result, job)| {
                result.unwrap_or_else(|| {
                    ConversionResult::for_job(
                        job,
                        ConversionStatus::Failed {
                            error: "worker terminated before reporting a result".to_string(),
                        },
                    )
                })
            })
            .collect();

        let failed = results.iter().filter(|r| matches!(r.status, ConversionStatus::Failed { .. })).count();
        info!(jobs = total, failed, "Conversion batch finished");

        Ok(results)
    }
}

/// Give every derived file at most one writer per batch.
///
/// A job is held back when its derived file is its own source, the source of
/// another job, or the output of an earlier job. Held-back jobs get their
/// result here and never reach a worker.
fn claim_outputs(
    jobs: Vec<ConversionJob>,
) -> (VecDeque<(usize, ConversionJob)>, Vec<(usize, ConversionResult)>) {
    let sources: HashSet<PathBuf> = jobs.iter().map(|j| j.source_file().to_path_buf()).collect();
    let mut claimed: HashMap<PathBuf, PathBuf> = HashMap::new();
    let mut pending = VecDeque::with_capacity(jobs.len());
    let mut rejected = Vec::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let derived = job.derived_file();
        let status = if derived == job.source_file() {
            Some(ConversionStatus::Failed {
                error: format!("derived file {} is the source itself", derived.display()),
            })
        } else if sources.contains(derived) {
            Some(ConversionStatus::Skipped {
                reason: format!("derived file {} is the source of another job", derived.display()),
            })
        } else if let Some(owner) = claimed.get(derived) {
            Some(ConversionStatus::Skipped {
                reason: format!("derived file collides with {}", owner.display()),
            })
        } else {
            claimed.insert(derived.to_path_buf(), job.source_file().to_path_buf());
            None
        };

        match status {
            Some(status) => {
                warn!(source = %job.source_file().display(), status = status.label(), "Conversion held back");
                rejected.push((index, ConversionResult::for_job(&job, status)));
            }
            None => pending.push_back((index, job)),
        }
    }

    (pending, rejected)
}

/// Run a single job: skip when the target exists and overwrite is off,
/// otherwise invoke the converter.
async fn execute_job<R: CommandRunner + ?Sized>(runner: &R, job: &ConversionJob) -> ConversionResult {
    let target_exists = match tokio::fs::try_exists(job.derived_file()).await {
        Ok(exists) => exists,
        Err(e) => {
            warn!(derived = %job.derived_file().display(), error = %e, "Cannot check derived file");
            return ConversionResult::for_job(
                job,
                ConversionStatus::Failed {
                    error: format!("cannot check {}: {}", job.derived_file().display(), e),
                },
            );
        }
    };

    if target_exists && !job.overwrite() {
        debug!(derived = %job.derived_file().display(), "Derived file exists, skipping");
        return ConversionResult::for_job(
            job,
            ConversionStatus::Skipped {
                reason: SKIPPED_EXISTING.to_string(),
            },
        );
    }

    let command = job.command_line();
    info!("Executing: {}", command);

    let status = match runner.run(&command).await {
        Ok(_) => ConversionStatus::Success,
        Err(e) => {
            warn!(source = %job.source_file().display(), error = %e, "Conversion failed");
            ConversionStatus::Failed {
                error: e.to_string(),
            }
        }
    };

    ConversionResult::for_job(job, status)
}
