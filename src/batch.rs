use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use rayon::prelude::*;

use crate::{
    config::JobRecord,
    features::{ExtractorFactory, WorkerExtractor},
    foundation::error::{PlaceError, PlaceResult},
    pipeline::{JobReport, Placer},
};

/// A job that did not produce its primary output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobFailure {
    pub index: usize,
    pub output_name: String,
    pub error: String,
}

/// Outcome of a batch, in job order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: Vec<JobReport>,
    pub failed: Vec<JobFailure>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Run every job, sequentially or on a pool of `settings.threads` workers.
///
/// Each worker owns one extractor from `factory`. `progress` receives `(completed, total)`
/// after every job. A failing job is recorded and the batch continues.
#[tracing::instrument(skip_all, fields(jobs = jobs.len()))]
pub fn run_batch(
    placer: &Placer,
    jobs: &[JobRecord],
    factory: Arc<dyn ExtractorFactory>,
    progress: &(dyn Fn(usize, usize) + Sync),
) -> PlaceResult<BatchReport> {
    let total = jobs.len();
    let done = AtomicUsize::new(0);
    let tick = || progress(done.fetch_add(1, Ordering::SeqCst) + 1, total);

    let outcomes: Vec<PlaceResult<JobReport>> = match placer.settings().threads {
        None => {
            let mut worker = WorkerExtractor::new(factory);
            jobs.iter()
                .map(|job| {
                    let r = placer.run_job(job, &mut worker);
                    tick();
                    r
                })
                .collect()
        }
        Some(n) => {
            let pool = build_thread_pool(n)?;
            pool.install(|| {
                jobs.par_iter()
                    .map_init(
                        || WorkerExtractor::new(Arc::clone(&factory)),
                        |worker, job| {
                            let r = placer.run_job(job, worker);
                            tick();
                            r
                        },
                    )
                    .collect()
            })
        }
    };

    let mut report = BatchReport::default();
    for (index, (job, outcome)) in jobs.iter().zip(outcomes).enumerate() {
        match outcome {
            Ok(r) => report.succeeded.push(r),
            Err(e) => {
                tracing::warn!(index, output = %job.output_name, error = %e, "job failed");
                report.failed.push(JobFailure {
                    index,
                    output_name: job.output_name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }
    tracing::info!(
        succeeded = report.succeeded.len(),
        failed = report.failed.len(),
        "batch finished"
    );
    Ok(report)
}

fn build_thread_pool(threads: usize) -> PlaceResult<rayon::ThreadPool> {
    if threads == 0 {
        return Err(PlaceError::validation("threads must be >= 1 when set"));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("logoplace-worker-{i}"))
        .build()
        .map_err(|e| PlaceError::Other(anyhow::anyhow!("failed to build rayon thread pool: {e}")))
}
