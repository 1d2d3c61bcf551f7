//! Document partitioning: backend client, per-upload staging, and element types.

pub mod client;
pub mod pipeline;
pub mod types;

pub use client::{HttpPartitioner, Partitioner};
pub use pipeline::{Upload, basename, partition_upload, partition_uploads};
pub use types::{Element, PartitionError, PartitionRequest, Payload};
