//! Pool workers.
//!
//! A [`Worker`] owns one [`Canvas`] for its whole life and keeps claiming
//! descriptors from the shared [`JobQueue`] until it is drained. A failed job
//! is recorded and the worker moves on to the next claim.

use crate::generate::GenerateEvent;
use crate::imaging::canvas::Canvas;
use crate::imaging::operations::{CompositeError, composite};
use crate::imaging::params::CompressionParams;
use crate::imaging::source::SourceResolver;
use crate::imaging::ImageBackend;
use crate::queue::JobQueue;
use crate::sink::{OutputSink, SinkError};
use crate::types::ImageDescriptor;
use std::sync::mpsc::Sender;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Composite(#[from] CompositeError),
    #[error(transparent)]
    Sink(#[from] SinkError),
    #[error("image id must be 1 or greater")]
    InvalidId,
}

/// A job that did not produce an output.
#[derive(Debug)]
pub struct JobFailure {
    pub id: u32,
    pub error: JobError,
}

/// A job that produced an output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub id: u32,
    pub name: String,
}

/// Everything a worker did during one run.
#[derive(Debug, Default)]
pub struct WorkerReport {
    pub generated: Vec<GeneratedImage>,
    pub failures: Vec<JobFailure>,
}

/// Read-only state shared by every worker in a run.
pub struct JobContext<'a, B: ImageBackend> {
    pub backend: &'a B,
    pub order: &'a [String],
    pub resolver: &'a dyn SourceResolver,
    pub sink: &'a dyn OutputSink,
    pub compression: CompressionParams,
}

pub struct Worker {
    index: usize,
    canvas: Canvas,
    report: WorkerReport,
}

impl Worker {
    pub fn new(index: usize, width: u32, height: u32) -> Result<Self, CompositeError> {
        let canvas = Canvas::new(width, height)?;
        Ok(Self {
            index,
            canvas,
            report: WorkerReport::default(),
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn report(&self) -> &WorkerReport {
        &self.report
    }

    pub fn into_report(self) -> WorkerReport {
        self.report
    }

    /// Claim and complete jobs until the queue is drained.
    pub fn run<B: ImageBackend>(
        &mut self,
        queue: &JobQueue,
        ctx: &JobContext<'_, B>,
        events: Option<&Sender<GenerateEvent>>,
    ) {
        let _span = tracing::debug_span!("worker", index = self.index).entered();

        while let Some(descriptor) = queue.claim_next() {
            let started = Instant::now();
            match self.execute(descriptor, ctx) {
                Ok(name) => {
                    let duration = started.elapsed();
                    tracing::debug!(id = descriptor.id, %name, ?duration, "image generated");
                    emit(
                        events,
                        GenerateEvent::ImageGenerated {
                            id: descriptor.id,
                            name: name.clone(),
                            worker: self.index,
                            duration,
                        },
                    );
                    self.report.generated.push(GeneratedImage {
                        id: descriptor.id,
                        name,
                    });
                }
                Err(error) => {
                    tracing::warn!(id = descriptor.id, %error, "image failed");
                    emit(
                        events,
                        GenerateEvent::ImageFailed {
                            id: descriptor.id,
                            error: error.to_string(),
                        },
                    );
                    self.report.failures.push(JobFailure {
                        id: descriptor.id,
                        error,
                    });
                }
            }
        }
    }

    fn execute<B: ImageBackend>(
        &mut self,
        descriptor: &ImageDescriptor,
        ctx: &JobContext<'_, B>,
    ) -> Result<String, JobError> {
        let name = descriptor.output_name().ok_or(JobError::InvalidId)?;
        let bytes = composite(
            ctx.backend,
            descriptor,
            ctx.order,
            ctx.resolver,
            &mut self.canvas,
            &ctx.compression,
        )?;
        ctx.sink.deliver(&name, bytes)?;
        Ok(name)
    }
}

fn emit(events: Option<&Sender<GenerateEvent>>, event: GenerateEvent) {
    if let Some(tx) = events {
        // A dropped receiver only means nobody is listening.
        let _ = tx.send(event);
    }
}
