//! # Moji - character-level HTML translation
//!
//! Moji rewrites the visible text of HTML pages one character at a time using
//! a CSV mapping table, leaving markup, attributes, comments and script/style
//! bodies byte-for-byte intact.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  CSV table  │────▶│   Parser    │────▶│   Mapping   │──┐  │  translated │
//! │ (auto-enc)  │     │ (auto-delim)│     │ (char→str)  │  │  │    HTML     │
//! └─────────────┘     └─────────────┘     └─────────────┘  │  └─────────────┘
//!                                                           ▼         ▲
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐  │         │
//! │  HTML page  │────▶│  Tokenizer  │────▶│  Rewriter   │◀─┘  ┌──────┴──────┐
//! │             │     │ (lossless)  │     │ (ScanMode)  │────▶│ Asset paths │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use moji::{transform, Mapping};
//!
//! let mapping: Mapping = [("あ", "ア")].into_iter().collect();
//! let html = transform("<p class=\"あ\">あい</p>", &mapping);
//! assert_eq!(html, "<p class=\"あ\">アい</p>");
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - The character mapping
//! - [`parser`] - CSV mapping loader with encoding and delimiter detection
//! - [`transform`] - Tokenizer, rewriter, asset rewrite and drivers
//! - [`index`] - Title extraction and link list
//! - [`config`] - Defaults and environment overrides
//! - [`logs`] - Progress logging

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Mapping table
pub mod parser;

// Transformation
pub mod transform;

// Link list
pub mod index;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ConfigError,
    DocumentError,
    DocumentResult,
    MappingError,
    MappingResult,
    PipelineError,
    PipelineResult,
};

// =============================================================================
// Re-exports - Models and config
// =============================================================================

pub use config::Config;
pub use models::Mapping;

// =============================================================================
// Re-exports - Mapping table
// =============================================================================

pub use parser::{
    decode_content,
    detect_delimiter,
    detect_encoding,
    load_mapping,
    parse_mapping_bytes,
    parse_mapping_str,
    LoadedMapping,
    MappingColumns,
};

// =============================================================================
// Re-exports - Transformer
// =============================================================================

pub use transform::{
    rewrite_asset_paths,
    substitute,
    tokenize,
    transform,
    transform_with_stats,
    ScanMode,
    Token,
    TransformStats,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    list_documents,
    output_file_name,
    translate_directory,
    translate_document,
    translate_file,
    translate_file_in_place,
    BatchOptions,
    BatchReport,
    FileFailure,
    FileOutcome,
    TranslateOptions,
};

// =============================================================================
// Re-exports - Index
// =============================================================================

pub use index::{build_link_list, extract_title, render_link_list, IndexOptions, LinkEntry};
