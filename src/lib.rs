//! # Mandox
//!
//! A compiler from roff manual pages (the mdoc(7) and man(7) dialects) to
//! HTML. Every rendered span carries an `x-source` attribute naming the input
//! line it came from, so an editor can map a click in the preview back to
//! the source.
//!
//! ## Features
//!
//! - **Preprocessing**: `.ds`, `.de`, `.if`/`.ie`/`.el`, `.nr`, `.so`
//! - **mdoc and man**: semantic inline macros, lists, displays, references
//! - **tbl**: column justification and widths
//! - **Best effort**: unknown constructs are rendered as marked fragments
//!   and reported as warnings instead of failing the page
//!
//! ## Example
//!
//! ```rust
//! use mandox::{man_to_html_with_options, M2HOptions};
//!
//! let page = ".Dd May 5, 2020\n.Dt HELLO 1\n.Os\n.Sh NAME\n.Nm hello\n.Nd greet\n";
//! let html = man_to_html_with_options(page, M2HOptions::fragment());
//! assert!(html.contains("<span class=\"name\""));
//! ```

pub mod core;
pub mod utils;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use core::man2html::{
    convert_page, man_to_html, man_to_html_with_diagnostics, man_to_html_with_options,
    ConversionOutput, ConversionWarning, M2HOptions, ManConverter, Stylesheet, WarningKind,
};
pub use utils::error::{ConversionError, ConversionResult};
pub use utils::files::{FileResolver, MemoryFileResolver, NoopFileResolver};
