pub mod api;
pub mod classify;
pub mod config;
pub mod import;
pub mod metrics_server;
pub mod observability;
pub mod parse;
pub mod pipeline;
pub mod sinks;
pub mod sources;
pub mod validation;

pub use import::{BatchReport, DirectoryLoader, Importer, ResourceLoader};
pub use pipeline::{Envelope, ImportError, ImportReport, Pipeline};
