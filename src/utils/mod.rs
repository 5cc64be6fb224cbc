//! Utility modules
//!
//! This module contains utilities and helpers:
//! - Error types and result types
//! - File resolution for manual page lookup and `.so` requests
//! - Source decoding
//! - Loss reports for degraded constructs

pub mod charset;
pub mod error;
pub mod files;
pub mod loss;

// Re-export commonly used items
pub use charset::{decode_source, split_lines};
pub use error::{CliDiagnostic, ConversionError, ConversionResult, DiagnosticSeverity};
pub use files::{FileResolveError, FileResolver, MemoryFileResolver, NoopFileResolver};
pub use loss::{LossKind, LossRecord, LossReport, LOSS_MARKER_CLASS};

#[cfg(not(target_arch = "wasm32"))]
pub use files::StdFileResolver;
