//! Content sources for docsift.
//!
//! [`CrawlScheduler`] walks a website breadth-first from a base URL;
//! [`LocalSource`] walks a local directory. Both feed pages to a
//! [`docsift_core::PageSink`] and return a [`docsift_core::CrawlReport`].

pub mod files;
pub mod scheduler;

pub use files::LocalSource;
pub use scheduler::CrawlScheduler;
