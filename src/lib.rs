//! # layergen
//!
//! Composites layered trait images into finished PNG artwork. Each job picks
//! one trait value per layer; layers are drawn bottom to top onto a fixed-size
//! canvas, and the result is palette-quantized into a small PNG.
//!
//! # Architecture: One Pool, Two Sinks
//!
//! ```text
//! jobs.json ──► JobQueue ──► Worker × n ──► composite ──► OutputSink
//!                            (own Canvas)   (load, draw,   ├─ FileSink: assets/{id-1}.png
//!                                            compress)     └─ MapSink:  name → bytes
//! ```
//!
//! A bounded pool of `min(max_workers, jobs)` workers drains a shared queue.
//! Every worker owns exactly one canvas for its lifetime and reuses it for
//! every job it claims. File mode and buffer mode run through the same
//! scheduler; only the sink differs.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`generate`] | Pool scheduler: sizing, launch, join, summary; file and buffer entry points |
//! | [`worker`] | Claim-composite-deliver loop around one owned canvas |
//! | [`queue`] | Lock-free exactly-once job claims over an immutable arena |
//! | [`sink`] | Output destinations: atomic file writes or an in-memory map |
//! | [`imaging`] | Layer sources, canvas, decode/compress backend, per-job compositing |
//! | [`scan`] | Traits directory catalog, pre-flight checks, job-list loading |
//! | [`config`] | `config.json` / `config.toml` loading and validation |
//! | [`types`] | [`ImageDescriptor`](types::ImageDescriptor) and output naming |
//! | [`output`] | CLI output formatting for progress, summaries and checks |
//!
//! # Design Decisions
//!
//! ## Load Then Draw
//!
//! Every layer of a job is decoded before the first one is drawn. A broken
//! trait file fails the job with the canvas untouched, and draw order is
//! always exactly the config's `order` no matter how loading went.
//!
//! ## Failures Stay Local
//!
//! A job that cannot be composited is recorded with its id and typed error,
//! and the worker moves on. Only problems that would doom every job (invalid
//! config, duplicate ids, pool construction) abort the run up front.
//!
//! ## Quality Window
//!
//! Compression takes a `[min, max]` quality window in the pngquant tradition.
//! When the quantizer cannot reach `min`, the lossless PNG is kept instead of
//! failing the job.

pub mod config;
pub mod generate;
pub mod imaging;
pub mod output;
pub mod queue;
pub mod scan;
pub mod sink;
pub mod types;
pub mod worker;

#[cfg(test)]
pub(crate) mod test_helpers;
