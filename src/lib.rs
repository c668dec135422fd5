//! # docindex: documentation chunking and retrieval
//!
//! Splits large multi-SDK markdown references into addressable chunks,
//! derives their structure (sections, classes, methods) and answers
//! structural lookups and keyword searches over an in-memory corpus.
//!
//! ## Architecture
//!
//! - **[`chunker`]**: Pure chunking strategies and code-example extraction
//! - **[`index`]**: Lazily built corpus, lookups, search, similarity
//! - **[`models`]**: Validated search results and overviews, builder and factory
//! - **[`uri`]**: `scheme://docs/...` resource addressing
//! - **[`config`]**: Configuration loading, validation, and document discovery
//! - **[`error`]**: Load and validation error types

pub mod chunker;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod uri;
