//! Loss reporting for constructs rendered as unimplemented fragments.

use serde::Serialize;

use crate::core::man2html::{ConversionWarning, WarningKind};

/// Class attribute carried by every degraded fragment in the HTML output.
pub const LOSS_MARKER_CLASS: &str = "unimplemented";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LossKind {
    UnknownMacro,
    UnsupportedEscape,
    UnsupportedList,
    MissingArgument,
    MacroLoop,
    UnterminatedBlock,
}

impl From<&WarningKind> for LossKind {
    fn from(kind: &WarningKind) -> Self {
        match kind {
            WarningKind::UnsupportedMacro => LossKind::UnknownMacro,
            WarningKind::UnsupportedEscape => LossKind::UnsupportedEscape,
            WarningKind::UnsupportedListType => LossKind::UnsupportedList,
            WarningKind::MissingArgument => LossKind::MissingArgument,
            WarningKind::MacroLoop => LossKind::MacroLoop,
            WarningKind::UnterminatedBlock => LossKind::UnterminatedBlock,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LossRecord {
    pub id: String,
    pub kind: LossKind,
    pub message: String,
    /// 0-based line in the expanded line stream
    pub line: Option<usize>,
    pub name: Option<String>,
}

impl LossRecord {
    pub fn from_warning(id: String, warning: &ConversionWarning) -> Self {
        Self {
            id,
            kind: LossKind::from(&warning.kind),
            message: warning.message.clone(),
            line: warning.line,
            name: warning.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LossReport {
    pub source: Option<String>,
    pub losses: Vec<LossRecord>,
}

impl LossReport {
    pub fn new(source: Option<String>, losses: Vec<LossRecord>) -> Self {
        Self { source, losses }
    }

    /// Number the warnings of one conversion into loss records.
    pub fn from_warnings(source: Option<String>, warnings: &[ConversionWarning]) -> Self {
        let losses = warnings
            .iter()
            .enumerate()
            .map(|(idx, warning)| LossRecord::from_warning(format!("L{:04}", idx + 1), warning))
            .collect();
        Self { source, losses }
    }

    pub fn is_empty(&self) -> bool {
        self.losses.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_from_warnings() {
        let warnings = vec![
            ConversionWarning::unsupported_macro("Zz").at_line(3),
            ConversionWarning::macro_loop("loop"),
        ];
        let report = LossReport::from_warnings(Some("a.1".into()), &warnings);
        assert_eq!(report.losses.len(), 2);
        assert_eq!(report.losses[0].id, "L0001");
        assert_eq!(report.losses[0].kind, LossKind::UnknownMacro);
        assert_eq!(report.losses[0].line, Some(3));
        assert_eq!(report.losses[1].kind, LossKind::MacroLoop);

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"kind\":\"unknown-macro\""));
        assert!(json.contains("\"source\":\"a.1\""));
    }

    #[test]
    fn test_empty_report() {
        assert!(LossReport::from_warnings(None, &[]).is_empty());
    }
}
