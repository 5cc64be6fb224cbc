//! man/mdoc to HTML converter
//!
//! This module implements the line-oriented roff interpreter. A document is
//! first run through the preprocessor (`engine::preprocess`), which resolves
//! strings, user macros, conditionals and `.so`; the resulting line stream is
//! then interpreted macro by macro into HTML whose spans carry the source
//! line they came from (`x-source`).

pub mod context;
pub mod engine;
mod blocks;
mod inline;
pub mod macros;
mod page;
mod table;
pub mod utils;

pub use blocks::{ListKind, ListSpec};
pub use context::{
    ConversionState, Enders, M2HOptions, ManConverter, PageMeta, Stylesheet,
};
pub use macros::MacroKind;
pub use page::{render_page, DEFAULT_STYLESHEET};

use crate::utils::error::{ConversionError, ConversionResult};
use crate::utils::files::FileResolver;

// =============================================================================
// Warning System
// =============================================================================

/// Kind of warning generated during conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WarningKind {
    /// An unknown macro was rendered as an unimplemented fragment
    UnsupportedMacro,
    /// An unknown escape sequence was rendered as an unimplemented fragment
    UnsupportedEscape,
    /// A `Bl` list type that is not supported
    UnsupportedListType,
    /// A macro was missing a required argument
    MissingArgument,
    /// Runaway macro or string recursion was cut off
    MacroLoop,
    /// A block ran to the end of its parent without its terminator
    UnterminatedBlock,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::UnsupportedMacro => write!(f, "unsupported macro"),
            WarningKind::UnsupportedEscape => write!(f, "unsupported escape"),
            WarningKind::UnsupportedListType => write!(f, "unsupported list type"),
            WarningKind::MissingArgument => write!(f, "missing argument"),
            WarningKind::MacroLoop => write!(f, "macro loop"),
            WarningKind::UnterminatedBlock => write!(f, "unterminated block"),
        }
    }
}

/// A warning generated during man/mdoc to HTML conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionWarning {
    /// The kind of warning
    pub kind: WarningKind,
    /// Human-readable message
    pub message: String,
    /// 0-based line in the expanded line stream
    pub line: Option<usize>,
    /// Macro, escape or list type the warning is about
    pub name: Option<String>,
}

impl ConversionWarning {
    /// Create a new warning
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        ConversionWarning {
            kind,
            message: message.into(),
            line: None,
            name: None,
        }
    }

    fn named(kind: WarningKind, name: &str, message: String) -> Self {
        ConversionWarning {
            name: Some(name.to_string()),
            ..ConversionWarning::new(kind, message)
        }
    }

    /// Attach the line the warning refers to
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    pub fn unsupported_macro(name: &str) -> Self {
        Self::named(
            WarningKind::UnsupportedMacro,
            name,
            format!("Unknown macro '{}' rendered as unimplemented", name),
        )
    }

    pub fn unsupported_escape(name: &str) -> Self {
        Self::named(
            WarningKind::UnsupportedEscape,
            name,
            format!("Unknown escape '\\{}' rendered as unimplemented", name),
        )
    }

    pub fn unsupported_list_type(name: &str) -> Self {
        let shown = if name.is_empty() { "(none)" } else { name };
        Self::named(
            WarningKind::UnsupportedListType,
            name,
            format!("List type '{}' is not supported, rendered as an item list", shown),
        )
    }

    pub fn missing_argument(name: &str) -> Self {
        Self::named(
            WarningKind::MissingArgument,
            name,
            format!("Macro '{}' is missing an argument", name),
        )
    }

    pub fn macro_loop(name: &str) -> Self {
        Self::named(
            WarningKind::MacroLoop,
            name,
            format!("Recursion in '{}' was cut off", name),
        )
    }

    pub fn unterminated_block(name: &str) -> Self {
        Self::named(
            WarningKind::UnterminatedBlock,
            name,
            format!("Block '{}' is not closed", name),
        )
    }
}

impl std::fmt::Display for ConversionWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "[{}] line {}: {}", self.kind, line, self.message),
            None => write!(f, "[{}] {}", self.kind, self.message),
        }
    }
}

impl From<ConversionWarning> for crate::utils::error::CliDiagnostic {
    fn from(warning: ConversionWarning) -> Self {
        use crate::utils::error::{CliDiagnostic, DiagnosticSeverity};

        let severity = match warning.kind {
            WarningKind::MacroLoop => DiagnosticSeverity::Error,
            WarningKind::UnsupportedMacro
            | WarningKind::UnsupportedEscape
            | WarningKind::UnsupportedListType
            | WarningKind::UnterminatedBlock => DiagnosticSeverity::Warning,
            WarningKind::MissingArgument => DiagnosticSeverity::Info,
        };

        let mut diag = CliDiagnostic::new(severity, warning.kind.to_string(), warning.message);
        if let Some(line) = warning.line {
            diag = diag.with_location(format!("line {}", line));
        }
        diag
    }
}

/// Result of conversion with diagnostics
#[derive(Debug, Clone)]
pub struct ConversionOutput {
    /// The HTML output
    pub output: String,
    /// Warnings generated during conversion, ordered by line
    pub warnings: Vec<ConversionWarning>,
}

impl ConversionOutput {
    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Get warnings as formatted strings
    pub fn format_warnings(&self) -> Vec<String> {
        self.warnings.iter().map(|w| w.to_string()).collect()
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Convert a man or mdoc document to an HTML page
///
/// Errors (an unresolvable `.so` without file access) are rendered as a
/// short error page rather than returned.
///
/// # Example
///
/// ```
/// use mandox::core::man2html::man_to_html;
///
/// let html = man_to_html(".Dd May 5, 2020\n.Dt LS 1\n.Os\n.Sh NAME\n.Nm ls\n.Nd list\n");
/// assert!(html.contains("LS(1)"));
/// ```
pub fn man_to_html(input: &str) -> String {
    man_to_html_with_options(input, M2HOptions::default())
}

/// Convert with custom options
pub fn man_to_html_with_options(input: &str, options: M2HOptions) -> String {
    let mut converter = ManConverter::with_options(options);
    match converter.convert(input) {
        Ok(result) => result.output,
        Err(err) => format!(
            "<div class=\"{}\">{}</div>",
            crate::utils::loss::LOSS_MARKER_CLASS,
            utils::html_escape(&err.to_string())
        ),
    }
}

/// Convert with full diagnostics, loading `.so` targets through `resolver`
///
/// # Example
///
/// ```
/// use mandox::core::man2html::{man_to_html_with_diagnostics, M2HOptions};
/// use mandox::utils::files::NoopFileResolver;
///
/// let result = man_to_html_with_diagnostics(".Zz what\n", &M2HOptions::fragment(), &NoopFileResolver)
///     .unwrap();
/// assert!(result.has_warnings());
/// ```
pub fn man_to_html_with_diagnostics(
    input: &str,
    options: &M2HOptions,
    resolver: &dyn FileResolver,
) -> ConversionResult<ConversionOutput> {
    let mut converter = ManConverter::with_resolver(options.clone(), resolver);
    converter.convert(input)
}

/// Look a page up by name and section and convert it
///
/// When the resolver finds several candidates the first one is used.
pub fn convert_page(
    name: &str,
    section: Option<&str>,
    resolver: &dyn FileResolver,
    options: &M2HOptions,
) -> ConversionResult<ConversionOutput> {
    let candidates = resolver
        .resolve(name, section)
        .map_err(|e| ConversionError::IoError {
            message: e.to_string(),
        })?;
    let Some(path) = candidates.first() else {
        return Err(ConversionError::not_found(name, section));
    };
    if candidates.len() > 1 {
        log::debug!("{} candidates for {}, using {}", candidates.len(), name, path);
    }
    let text = resolver.load(path).map_err(|e| ConversionError::IoError {
        message: e.to_string(),
    })?;
    man_to_html_with_diagnostics(&text, options, resolver)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::files::MemoryFileResolver;

    #[test]
    fn test_warning_display() {
        let warning = ConversionWarning::unsupported_macro("Zz").at_line(4);
        assert_eq!(
            warning.to_string(),
            "[unsupported macro] line 4: Unknown macro 'Zz' rendered as unimplemented"
        );
        assert_eq!(warning.name.as_deref(), Some("Zz"));
    }

    #[test]
    fn test_warning_to_diagnostic() {
        use crate::utils::error::{CliDiagnostic, DiagnosticSeverity};
        let diag: CliDiagnostic = ConversionWarning::macro_loop("xx").at_line(2).into();
        assert_eq!(diag.severity, DiagnosticSeverity::Error);
        assert_eq!(diag.location.as_deref(), Some("line 2"));
    }

    #[test]
    fn test_convert_page_not_found() {
        let resolver = MemoryFileResolver::new();
        let err = convert_page("nope", Some("1"), &resolver, &M2HOptions::fragment()).unwrap_err();
        assert_eq!(err, ConversionError::not_found("nope", Some("1")));
    }

    #[test]
    fn test_convert_page_first_candidate() {
        let resolver = MemoryFileResolver::new()
            .with_file("man1/ls.1", ".Dd May 5, 2020\n.Dt LS 1\n.Os\n.Sh NAME\n.Nm ls\n")
            .with_file("man8/ls.8", ".Dt LS 8\n");
        let result = convert_page("ls", Some("1"), &resolver, &M2HOptions::default()).unwrap();
        assert!(result.output.contains("LS(1)"));
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_error_page_without_resolver() {
        let options = M2HOptions {
            inline_includes: false,
            ..M2HOptions::fragment()
        };
        let html = man_to_html_with_options(".so man1/other.1\n", options);
        assert!(html.starts_with("<div class=\"unimplemented\">"));
    }
}
