//! Error handling for Mandox conversions
//!
//! This module provides a unified error type and result type for all
//! conversion operations. Only failures that abort a whole document live
//! here; unsupported constructs degrade in place and are reported as
//! warnings instead.

use std::fmt;

/// Conversion error type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionError {
    /// No candidate source file for a manual page name
    NotFound {
        name: String,
        section: Option<String>,
    },
    /// A `.so` redirection could not be followed
    Redirect { message: String },
    /// IO error (for file operations)
    IoError { message: String },
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionError::NotFound { name, section } => {
                if let Some(sec) = section {
                    write!(f, "No manual entry for {} in section {}", name, sec)
                } else {
                    write!(f, "No manual entry for {}", name)
                }
            }
            ConversionError::Redirect { message } => {
                write!(f, "Redirection error: {}", message)
            }
            ConversionError::IoError { message } => {
                write!(f, "IO error: {}", message)
            }
        }
    }
}

impl std::error::Error for ConversionError {}

impl From<std::io::Error> for ConversionError {
    fn from(err: std::io::Error) -> Self {
        ConversionError::IoError {
            message: err.to_string(),
        }
    }
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;

// Convenience constructors for errors
impl ConversionError {
    pub fn not_found(name: impl Into<String>, section: Option<&str>) -> Self {
        ConversionError::NotFound {
            name: name.into(),
            section: section.map(str::to_string),
        }
    }

    pub fn redirect(message: impl Into<String>) -> Self {
        ConversionError::Redirect {
            message: message.into(),
        }
    }

    /// Whether this error came from following a `.so` request.
    pub fn is_redirect(&self) -> bool {
        matches!(self, ConversionError::Redirect { .. })
    }
}

// =============================================================================
// CLI Diagnostic System
// =============================================================================

/// Severity level for CLI diagnostics (determines coloring and behavior).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticSeverity {
    /// Critical errors (red) - e.g., runaway macro expansion
    Error,
    /// Warnings (yellow) - e.g., unknown macro rendered as unimplemented
    Warning,
    /// Informational (cyan) - e.g., ignored layout requests
    Info,
}

/// Diagnostic line printed by the CLI.
#[derive(Debug, Clone)]
pub struct CliDiagnostic {
    /// Severity level (for coloring and strict mode)
    pub severity: DiagnosticSeverity,
    /// Warning kind as string (e.g., "unsupported macro")
    pub kind: String,
    /// Human-readable message
    pub message: String,
    /// Location context (e.g., "line 10")
    pub location: Option<String>,
}

impl CliDiagnostic {
    /// Create a new diagnostic.
    pub fn new(
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            kind: kind.into(),
            message: message.into(),
            location: None,
        }
    }

    /// Add location context.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Get ANSI color code for this diagnostic's severity.
    pub fn color_code(&self) -> &'static str {
        match self.severity {
            DiagnosticSeverity::Error => "\x1b[31m",   // red
            DiagnosticSeverity::Warning => "\x1b[33m", // yellow
            DiagnosticSeverity::Info => "\x1b[36m",    // cyan
        }
    }
}

impl fmt::Display for CliDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref loc) = self.location {
            write!(f, "[{}] {}: {}", self.kind, loc, self.message)
        } else {
            write!(f, "[{}] {}", self.kind, self.message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = ConversionError::not_found("ls", Some("1"));
        assert_eq!(err.to_string(), "No manual entry for ls in section 1");

        let err = ConversionError::not_found("ls", None);
        assert_eq!(err.to_string(), "No manual entry for ls");
    }

    #[test]
    fn test_redirect_error() {
        let err = ConversionError::redirect("too many redirections");
        assert!(err.is_redirect());
        assert!(err.to_string().contains("too many redirections"));
        assert!(!ConversionError::not_found("x", None).is_redirect());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ConversionError = io.into();
        assert!(matches!(err, ConversionError::IoError { .. }));
    }

    #[test]
    fn test_cli_diagnostic_display() {
        let diag = CliDiagnostic::new(DiagnosticSeverity::Warning, "unsupported macro", "Zz")
            .with_location("line 4");
        assert_eq!(diag.to_string(), "[unsupported macro] line 4: Zz");
        assert_eq!(diag.color_code(), "\x1b[33m");
    }
}
