//! The worker pool.
//!
//! Every run goes through one scheduler; the two output modes differ only in
//! the [`OutputSink`] handed to the workers.
//!
//! ```text
//! descriptors ──► JobQueue ──┬─► Worker 0 (Canvas) ──┐
//!                            ├─► Worker 1 (Canvas) ──┼─► sink (files | map)
//!                            └─► Worker n (Canvas) ──┘
//! ```
//!
//! ## Sizing
//!
//! The pool runs `min(max_workers, jobs)` workers, where `max_workers`
//! defaults to the host's available parallelism. Each worker gets its own
//! thread in a dedicated rayon pool and its own canvas, so no drawing state is
//! ever shared. An empty job list returns immediately without building a pool.
//!
//! ## Failure model
//!
//! Problems that would affect every job (bad config, duplicate ids, pool
//! construction) are returned as [`GenerateError`] before any worker starts.
//! Problems with a single job are recorded in the [`GenerateSummary`] and the
//! remaining jobs still run.

use crate::config::{ArtConfig, ConfigError, available_parallelism};
use crate::imaging::operations::CompositeError;
use crate::imaging::params::CompressionParams;
use crate::imaging::source::{SourceResolver, SourceTable, TraitsDir};
use crate::imaging::{ImageBackend, RustBackend};
use crate::queue::JobQueue;
use crate::sink::{FileSink, MapSink, OutputSink};
use crate::types::ImageDescriptor;
use crate::worker::{GeneratedImage, JobContext, JobFailure, Worker};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Duplicate image id {0} in job list")]
    DuplicateId(u32),
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),
    #[error("Failed to set up worker: {0}")]
    Worker(#[from] CompositeError),
}

/// Progress events sent while a run is in flight.
#[derive(Debug, Clone)]
pub enum GenerateEvent {
    Started {
        total: usize,
        workers: usize,
    },
    ImageGenerated {
        id: u32,
        name: String,
        worker: usize,
        duration: Duration,
    },
    ImageFailed {
        id: u32,
        error: String,
    },
}

/// Per-run knobs that are not part of the artwork itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    /// Upper bound on concurrent workers; `None` uses available parallelism.
    pub max_workers: Option<usize>,
    pub compression: CompressionParams,
}

impl GenerateOptions {
    pub fn from_config(config: &ArtConfig) -> Self {
        Self {
            max_workers: config.processing.max_workers,
            compression: config.compression_params(),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = Some(max_workers);
        self
    }
}

/// Outcome of a run.
#[derive(Debug)]
pub struct GenerateSummary {
    pub total: usize,
    pub workers: usize,
    /// Sorted by id.
    pub generated: Vec<GeneratedImage>,
    /// Sorted by id.
    pub failures: Vec<JobFailure>,
    pub elapsed: Duration,
}

impl GenerateSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Buffer-mode result: output name → PNG bytes.
#[derive(Debug)]
pub struct InMemoryOutput {
    pub images: BTreeMap<String, Vec<u8>>,
    pub summary: GenerateSummary,
}

/// Number of workers for a run: `min(requested or available parallelism, jobs)`.
pub fn worker_count(requested: Option<usize>, jobs: usize) -> usize {
    requested.unwrap_or_else(available_parallelism).min(jobs)
}

fn build_thread_pool(threads: usize) -> Result<rayon::ThreadPool, GenerateError> {
    if threads == 0 {
        return Err(GenerateError::ThreadPool(
            "worker pool needs at least one thread".into(),
        ));
    }
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("layergen-worker-{i}"))
        .build()
        .map_err(|e| GenerateError::ThreadPool(e.to_string()))
}

fn check_unique_ids(descriptors: &[ImageDescriptor]) -> Result<(), GenerateError> {
    let mut seen = HashSet::with_capacity(descriptors.len());
    for descriptor in descriptors {
        if !seen.insert(descriptor.id) {
            return Err(GenerateError::DuplicateId(descriptor.id));
        }
    }
    Ok(())
}

/// File mode: read layers from `{traits_dir}/{layer}/{value}` and write
/// `{assets_dir}/{id - 1}.png`. `assets_dir` must already exist.
pub fn generate_files(
    config: &ArtConfig,
    descriptors: Vec<ImageDescriptor>,
    traits_dir: &Path,
    assets_dir: &Path,
    options: &GenerateOptions,
    events: Option<Sender<GenerateEvent>>,
) -> Result<GenerateSummary, GenerateError> {
    let backend = RustBackend::new();
    let resolver = TraitsDir::new(traits_dir);
    let sink = FileSink::new(assets_dir);
    generate_with_backend(
        &backend,
        config,
        descriptors,
        &resolver,
        &sink,
        options,
        events,
    )
}

/// Buffer mode: resolve layers through `sources` and collect every output in
/// memory.
pub fn generate_in_memory(
    config: &ArtConfig,
    descriptors: Vec<ImageDescriptor>,
    sources: &SourceTable,
    options: &GenerateOptions,
    events: Option<Sender<GenerateEvent>>,
) -> Result<InMemoryOutput, GenerateError> {
    let backend = RustBackend::new();
    let sink = MapSink::new();
    let summary = generate_with_backend(
        &backend,
        config,
        descriptors,
        sources,
        &sink,
        options,
        events,
    )?;
    Ok(InMemoryOutput {
        images: sink.into_inner(),
        summary,
    })
}

/// Run the pool with an explicit backend, resolver and sink.
///
/// Returns once every worker has exited; no work outlives the call.
pub fn generate_with_backend<B: ImageBackend>(
    backend: &B,
    config: &ArtConfig,
    descriptors: Vec<ImageDescriptor>,
    resolver: &dyn SourceResolver,
    sink: &dyn OutputSink,
    options: &GenerateOptions,
    events: Option<Sender<GenerateEvent>>,
) -> Result<GenerateSummary, GenerateError> {
    config.validate()?;
    if options.max_workers == Some(0) {
        return Err(ConfigError::Validation("max_workers must be at least 1".into()).into());
    }
    check_unique_ids(&descriptors)?;

    let started = Instant::now();
    let total = descriptors.len();
    let workers = worker_count(options.max_workers, total);

    tracing::info!(total, workers, "starting generation");
    if let Some(tx) = &events {
        let _ = tx.send(GenerateEvent::Started { total, workers });
    }

    if workers == 0 {
        return Ok(GenerateSummary {
            total,
            workers,
            generated: Vec::new(),
            failures: Vec::new(),
            elapsed: started.elapsed(),
        });
    }

    let pool = build_thread_pool(workers)?;
    let mut pool_workers = (0..workers)
        .map(|index| Worker::new(index, config.width, config.height))
        .collect::<Result<Vec<_>, _>>()?;

    let queue = JobQueue::new(descriptors);
    let ctx = JobContext {
        backend,
        order: &config.order,
        resolver,
        sink,
        compression: options.compression,
    };
    let events = events.as_ref();

    pool.scope(|scope| {
        for worker in pool_workers.iter_mut() {
            let queue = &queue;
            let ctx = &ctx;
            scope.spawn(move |_| worker.run(queue, ctx, events));
        }
    });

    let mut generated = Vec::with_capacity(total);
    let mut failures = Vec::new();
    for worker in pool_workers {
        let report = worker.into_report();
        generated.extend(report.generated);
        failures.extend(report.failures);
    }
    generated.sort_by_key(|g| g.id);
    failures.sort_by_key(|f| f.id);

    let elapsed = started.elapsed();
    tracing::info!(
        generated = generated.len(),
        failed = failures.len(),
        ?elapsed,
        "generation finished"
    );

    Ok(GenerateSummary {
        total,
        workers,
        generated,
        failures,
        elapsed,
    })
}
