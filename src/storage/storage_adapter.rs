//! Storage adapters. Includes a [usage log](usage_log::UsageLogStorageAdapter) implementation.
//!
//! An adapter wraps another storage backend and implements the same storage traits, so adapters can be chained.

pub mod usage_log;
