//! Change detection and the end-to-end sync pipeline.
//!
//! [`SyncCoordinator`] implements [`docsift_core::PageSink`]: it chunks
//! incoming pages, skips chunks whose stored hash is unchanged, embeds and
//! upserts the rest, and runs the end-of-run stale cleanup. [`run_sync`]
//! wires a content source to a coordinator and runs one full sync.

pub mod coordinator;
pub mod pipeline;

pub use coordinator::SyncCoordinator;
pub use pipeline::{run_sync, Collaborators, SyncOptions, SyncSummary};
