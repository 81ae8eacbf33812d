// Dataset ingestion: uploaded byte streams to named tables

pub mod csv;
mod infer;
pub mod upload;
pub mod xlsx;

pub use upload::{ingest, ingest_batch, SourceFormat, Upload, UploadError};
