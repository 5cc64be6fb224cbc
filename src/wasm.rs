//! WASM bindings for mandox
//!
//! This module provides JavaScript-accessible functions for the editor
//! preview: rendering a page to HTML whose spans carry `x-source` lines.

#[cfg(feature = "wasm")]
use std::collections::BTreeMap;

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "wasm")]
use crate::core::man2html::{man_to_html_with_diagnostics, M2HOptions, Stylesheet};
#[cfg(feature = "wasm")]
use crate::utils::files::MemoryFileResolver;
#[cfg(feature = "wasm")]
use crate::utils::loss::LossReport;

/// Conversion options (exposed to WASM)
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
pub struct M2HConvertOptions {
    /// Emit `x-source` line attributes
    #[serde(default = "default_true")]
    pub source_markers: bool,
    /// Wrap the body in a complete HTML document
    #[serde(default)]
    pub full_page: bool,
    /// Inline the default stylesheet instead of linking it
    #[serde(default)]
    pub embed_css: bool,
    /// Footer operating system when `.Os` gives none
    #[serde(default)]
    pub default_os: String,
    /// Files available to `.so`, keyed by the path written in the request
    #[serde(default)]
    pub files: BTreeMap<String, String>,
}

#[cfg(feature = "wasm")]
impl Default for M2HConvertOptions {
    fn default() -> Self {
        Self {
            source_markers: true,
            full_page: false,
            embed_css: false,
            default_os: String::new(),
            files: BTreeMap::new(),
        }
    }
}

#[cfg(feature = "wasm")]
fn default_true() -> bool {
    true
}

#[cfg(feature = "wasm")]
fn to_js_value<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|e| {
        let error_obj = ConvertResult {
            output: String::new(),
            success: false,
            error: Some(format!("Serialization error: {}", e)),
            warnings: vec![],
            losses: None,
        };
        serde_wasm_bindgen::to_value(&error_obj).unwrap_or(JsValue::NULL)
    })
}

#[cfg(feature = "wasm")]
#[derive(Serialize)]
pub struct ConvertResult {
    pub output: String,
    pub success: bool,
    pub error: Option<String>,
    pub warnings: Vec<String>,
    pub losses: Option<LossReport>,
}

#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "manToHtml")]
pub fn man_to_html_wasm(input: &str) -> String {
    crate::man_to_html_with_options(input, M2HOptions::fragment())
}

#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "manToHtmlWithOptions")]
pub fn man_to_html_with_options_wasm(input: &str, options: JsValue) -> JsValue {
    let opts: M2HConvertOptions = serde_wasm_bindgen::from_value(options).unwrap_or_default();

    let m2h_opts = M2HOptions {
        source_markers: opts.source_markers,
        full_page: opts.full_page,
        stylesheet: if opts.embed_css {
            Stylesheet::Embedded
        } else {
            M2HOptions::default().stylesheet
        },
        default_os: opts.default_os.clone(),
        ..Default::default()
    };
    let mut resolver = MemoryFileResolver::new();
    for (path, content) in &opts.files {
        resolver.add_file(path.clone(), content.clone());
    }

    let result = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        man_to_html_with_diagnostics(input, &m2h_opts, &resolver)
    })) {
        Ok(Ok(converted)) => ConvertResult {
            warnings: converted.format_warnings(),
            losses: Some(LossReport::from_warnings(None, &converted.warnings)),
            output: converted.output,
            success: true,
            error: None,
        },
        Ok(Err(err)) => ConvertResult {
            output: String::new(),
            success: false,
            error: Some(err.to_string()),
            warnings: vec![],
            losses: None,
        },
        Err(e) => {
            let error_msg = if let Some(s) = e.downcast_ref::<&str>() {
                format!("Conversion failed: {}", s)
            } else if let Some(s) = e.downcast_ref::<String>() {
                format!("Conversion failed: {}", s)
            } else {
                "Conversion failed: unknown error (check browser console for details)".to_string()
            };
            ConvertResult {
                output: String::new(),
                success: false,
                error: Some(error_msg),
                warnings: vec![],
                losses: None,
            }
        }
    };

    to_js_value(&result)
}

#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "defaultStylesheet")]
pub fn default_stylesheet() -> String {
    crate::core::man2html::DEFAULT_STYLESHEET.to_string()
}

#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "getVersion")]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
