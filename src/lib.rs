#![deny(missing_docs)]

//! Core library for the docpipe document partitioning service.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Stored-file records.
pub mod database;
/// Text extraction for stored files.
pub mod extraction;
/// Structured logging and tracing setup.
pub mod logging;
/// Streaming `multipart/mixed` responses.
pub mod multipart;
/// Media type negotiation for partition responses.
pub mod negotiation;
/// Document partitioning client and per-upload pipeline.
pub mod partition;
/// Object storage downloads.
pub mod storage;
