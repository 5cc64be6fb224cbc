//! Core conversion modules
//!
//! - `man2html`: man(7) and mdoc(7) pages to HTML with source line provenance

pub mod man2html;
