//! Transformation module.
//!
//! - Tokenizer: lossless HTML token stream over borrowed slices
//! - Substitute: per-character mapping primitive
//! - Rewriter: structure-preserving transform with script/style tracking
//! - Assets: `{stem}_files/` reference rewrite
//! - Pipeline: batch and single-file drivers

pub mod assets;
pub mod pipeline;
pub mod rewriter;
pub mod substitute;
pub mod tokenizer;

pub use assets::rewrite_asset_paths;
pub use pipeline::*;
pub use rewriter::{transform, transform_with_stats, ScanMode, TransformStats};
pub use substitute::{substitute, substitute_into};
pub use tokenizer::{tokenize, Attribute, Token, Tokenizer};
