//! Roff engine: line buffer, tokenizer and the preprocessing pass.
//!
//! The engine knows roff syntax but nothing about mdoc or man semantics.
//! Two pieces of state cross the boundary to the interpreter:
//!
//! - [`Registers`]: defined strings, number registers and user macros,
//!   filled by the preprocessor and read back by the tokenizer, so that
//!   `\*x` resolves the same way in both passes.
//! - [`Interrupt`]: the non-local outcome of a step. `.so` met during
//!   interpretation restarts the pipeline, which is not an error.

pub mod lexer;
pub mod preprocess;
pub mod primitives;
pub mod source;
pub mod token;

use fxhash::FxHashMap;

use crate::utils::error::ConversionError;

pub use lexer::{FormatState, LineCursor, Tokenizer};
pub use preprocess::{MacroProcessor, Preprocessed, RedirectGuard};
pub use source::{LineStream, SourceDocument, SourceLine};
pub use token::{Token, Word};

/// Why a step stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    /// Restart the whole pipeline on the document named by a `.so` request.
    Redirect(String),
    /// Abort the document.
    Fatal(ConversionError),
}

impl From<ConversionError> for Interrupt {
    fn from(err: ConversionError) -> Self {
        Interrupt::Fatal(err)
    }
}

/// Outcome of every recursive engine and interpreter step.
pub type Step<T> = Result<T, Interrupt>;

/// Macro body captured by `.de`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MacroDefinition {
    pub name: String,
    /// Template lines after copy-mode unescaping, still holding `\$N`.
    pub lines: Vec<String>,
}

/// Document-scoped roff registers.
#[derive(Debug, Clone, Default)]
pub struct Registers {
    pub strings: FxHashMap<String, String>,
    pub numbers: FxHashMap<String, String>,
    pub macros: FxHashMap<String, MacroDefinition>,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.strings.get(name).map(String::as_str)
    }

    pub fn number(&self, name: &str) -> Option<&str> {
        self.numbers.get(name).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.strings.clear();
        self.numbers.clear();
        self.macros.clear();
    }
}
