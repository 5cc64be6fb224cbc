//! Preprocessing pass (MacroProcessor)
//!
//! Runs once over the whole document before any macro is interpreted:
//! comments are removed, defined strings substituted, user macros expanded
//! in place and conditionals resolved. The result is a flat line stream.
//!
//! Expansion is textual. A macro call splices its substituted body at the
//! cursor and the spliced lines are processed like any other input, so a
//! body may define, test or call further macros.

use super::primitives::{
    comment_start, copy_mode, interpolate_strings, is_comment_line, is_control_line,
    parse_condition, parse_request, scan_braces, split_macro_args, substitute_args,
    trim_continuation,
};
use super::source::{SourceDocument, SourceLine};
use super::{MacroDefinition, Registers, Step};
use crate::core::man2html::context::M2HOptions;
use crate::core::man2html::ConversionWarning;
use crate::utils::charset::split_lines;
use crate::utils::error::ConversionError;
use crate::utils::files::FileResolver;

/// Total user macro expansions allowed in one document. Nesting is bounded
/// by `max_expansions`; this stops macros that call themselves more than
/// once from growing without limit.
const EXPANSION_BUDGET: usize = 1 << 20;

/// Output of the preprocessing pass.
#[derive(Debug, Clone, Default)]
pub struct Preprocessed {
    pub lines: Vec<SourceLine>,
    pub registers: Registers,
    pub warnings: Vec<ConversionWarning>,
}

/// Bounds `.so` redirection across pipeline restarts.
///
/// Every followed redirect counts against the limit; a target whose content
/// equals the document that named it is a direct self loop. Longer cycles
/// are only stopped by the counter.
#[derive(Debug, Clone)]
pub struct RedirectGuard {
    limit: usize,
    followed: usize,
    current: Vec<String>,
}

impl RedirectGuard {
    pub fn new(limit: usize, initial: &[String]) -> Self {
        RedirectGuard {
            limit,
            followed: 0,
            current: initial.to_vec(),
        }
    }

    /// Accept the lines loaded for `path` as the new current document.
    pub fn follow(&mut self, path: &str, lines: Vec<String>) -> Result<Vec<String>, ConversionError> {
        if lines == self.current {
            return Err(ConversionError::redirect(format!(
                "{} includes itself",
                path
            )));
        }
        self.followed += 1;
        if self.followed > self.limit {
            return Err(ConversionError::redirect(format!(
                "too many redirections (limit {}) at {}",
                self.limit, path
            )));
        }
        log::debug!("following .so {} ({}/{})", path, self.followed, self.limit);
        self.current = lines.clone();
        Ok(lines)
    }

    pub fn followed(&self) -> usize {
        self.followed
    }
}

/// The preprocessor over one document.
pub struct MacroProcessor<'a> {
    doc: SourceDocument,
    registers: Registers,
    /// Outcomes of `.ie`, consumed by the matching `.el`.
    conditions: Vec<bool>,
    resolver: &'a dyn FileResolver,
    guard: &'a mut RedirectGuard,
    inline_includes: bool,
    max_expansions: usize,
    expansions: usize,
    output: Vec<SourceLine>,
    warnings: Vec<ConversionWarning>,
}

impl<'a> MacroProcessor<'a> {
    pub fn new(
        lines: Vec<String>,
        resolver: &'a dyn FileResolver,
        guard: &'a mut RedirectGuard,
        options: &M2HOptions,
    ) -> Self {
        MacroProcessor {
            doc: SourceDocument::new(lines),
            registers: Registers::new(),
            conditions: Vec::new(),
            resolver,
            guard,
            inline_includes: options.inline_includes,
            max_expansions: options.max_expansions,
            expansions: 0,
            output: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn run(mut self) -> Step<Preprocessed> {
        log::debug!("preprocessing {} lines", self.doc.unconsumed().len());
        while let Some(line) = self.doc.pop_front() {
            self.process_line(line)?;
        }
        log::debug!(
            "preprocessing done: {} lines, {} macro expansions",
            self.output.len(),
            self.expansions
        );
        Ok(Preprocessed {
            lines: self.output,
            registers: self.registers,
            warnings: self.warnings,
        })
    }

    fn warn(&mut self, warning: ConversionWarning) {
        log::warn!("{}", warning);
        self.warnings.push(warning);
    }

    fn process_line(&mut self, line: SourceLine) -> Step<()> {
        let SourceLine { number, text } = line;
        if is_comment_line(&text) {
            return Ok(());
        }
        let text = match comment_start(&text) {
            Some(idx) => {
                let kept = text[..idx].trim_end();
                if kept.is_empty() {
                    return Ok(());
                }
                kept.to_string()
            }
            None => text,
        };
        let text = interpolate_strings(&text, &self.registers.strings);
        if !is_control_line(&text) {
            self.output.push(SourceLine::new(number, text));
            return Ok(());
        }
        let Some(request) = parse_request(&text) else {
            return Ok(());
        };
        let name = request.name.to_string();
        let args = request.args.to_string();
        match name.as_str() {
            "" => {}
            "ds" | "ds1" => self.define_string(&args, false),
            "as" | "as1" => self.define_string(&args, true),
            "de" | "de1" => self.define_macro(number, &args, false),
            "am" | "am1" => self.define_macro(number, &args, true),
            "if" => {
                let (outcome, body) = parse_condition(&args, &self.registers.numbers);
                let body = body.to_string();
                self.conditional(number, outcome, &body);
            }
            "ie" => {
                let (outcome, body) = parse_condition(&args, &self.registers.numbers);
                let body = body.to_string();
                self.conditions.push(outcome);
                self.conditional(number, outcome, &body);
            }
            "el" => {
                let outcome = !self.conditions.pop().unwrap_or(true);
                self.conditional(number, outcome, &args);
            }
            "nr" => {
                let words = split_macro_args(&args);
                if let [reg, value, ..] = words.as_slice() {
                    self.registers.numbers.insert(reg.clone(), value.clone());
                }
            }
            "rr" => {
                for reg in split_macro_args(&args) {
                    self.registers.numbers.remove(&reg);
                }
            }
            "rm" => {
                for reg in split_macro_args(&args) {
                    self.registers.strings.remove(&reg);
                    self.registers.macros.remove(&reg);
                }
            }
            "so" if self.inline_includes => self.include(number, &args)?,
            "ig" => self.skip_ignored(number, &args),
            "wh" | "hy" | "nh" | "ch" | "em" | "ev" | "lf" | "tm" | "cp" => {}
            user if self.registers.macros.contains_key(user) => {
                self.invoke_macro(number, user, &args)
            }
            _ => {
                let normalized = match text.strip_prefix('\'') {
                    Some(rest) => format!(".{}", rest),
                    None => text.clone(),
                };
                self.output.push(SourceLine::new(number, normalized));
            }
        }
        Ok(())
    }

    fn define_string(&mut self, args: &str, append: bool) {
        let end = args.find(is_blank).unwrap_or(args.len());
        let name = &args[..end];
        if name.is_empty() {
            return;
        }
        let value = args[end..].trim_start_matches(is_blank);
        let value = value.strip_prefix('"').unwrap_or(value);
        let entry = self.registers.strings.entry(name.to_string()).or_default();
        if !append {
            entry.clear();
        }
        entry.push_str(value);
    }

    fn define_macro(&mut self, number: usize, args: &str, append: bool) {
        let words = split_macro_args(args);
        let Some(name) = words.first().cloned() else {
            self.warn(ConversionWarning::missing_argument("de").at_line(number));
            return;
        };
        let end = words.get(1).cloned().unwrap_or_else(|| ".".to_string());
        let mut body = Vec::new();
        let mut terminated = false;
        while let Some(line) = self.doc.pop_front() {
            if parse_request(&line.text).is_some_and(|r| r.name == end) {
                terminated = true;
                break;
            }
            body.push(copy_mode(&line.text));
        }
        if !terminated {
            self.warn(ConversionWarning::unterminated_block(&format!("de {}", name)).at_line(number));
        }
        let definition = self
            .registers
            .macros
            .entry(name.clone())
            .or_insert_with(|| MacroDefinition {
                name,
                lines: Vec::new(),
            });
        if !append {
            definition.lines.clear();
        }
        definition.lines.extend(body);
    }

    fn invoke_macro(&mut self, number: usize, name: &str, args: &str) {
        if self.doc.depth() >= self.max_expansions || self.expansions >= EXPANSION_BUDGET {
            self.warn(ConversionWarning::macro_loop(name).at_line(number));
            return;
        }
        self.expansions += 1;
        let args = split_macro_args(args);
        let Some(definition) = self.registers.macros.get(name) else {
            return;
        };
        let body: Vec<String> = definition
            .lines
            .iter()
            .map(|line| substitute_args(line, &args))
            .collect();
        log::trace!(
            "expanding .{} into {} lines at depth {}",
            name,
            body.len(),
            self.doc.depth() + 1
        );
        self.doc.splice_expansion(body);
    }

    fn conditional(&mut self, number: usize, outcome: bool, body: &str) {
        let lines = self.take_conditional_body(number, body);
        if outcome {
            self.doc.splice_front(lines);
        }
    }

    /// Collect the body of a conditional: the rest of the request line, or
    /// a `\{ ... \}` block that may span lines. Only the outer braces are
    /// removed; nested blocks are resolved when the body is reprocessed.
    fn take_conditional_body(&mut self, number: usize, body: &str) -> Vec<String> {
        let Some(inner) = body.strip_prefix("\\{") else {
            let body = trim_continuation(body);
            return if body.trim().is_empty() {
                Vec::new()
            } else {
                vec![body.to_string()]
            };
        };
        let mut lines = Vec::new();
        let mut current = inner.trim_start_matches(is_blank).to_string();
        let mut depth = 1;
        loop {
            let (next_depth, close) = scan_braces(&current, depth);
            match close {
                Some(idx) => {
                    push_body_line(&mut lines, &current[..idx]);
                    break;
                }
                None => {
                    depth = next_depth;
                    push_body_line(&mut lines, &current);
                    match self.doc.pop_front() {
                        Some(line) => current = line.text,
                        None => {
                            self.warn(ConversionWarning::unterminated_block("\\{").at_line(number));
                            break;
                        }
                    }
                }
            }
        }
        lines
    }

    fn include(&mut self, number: usize, args: &str) -> Step<()> {
        let Some(path) = split_macro_args(args).into_iter().next() else {
            self.warn(ConversionWarning::missing_argument("so").at_line(number));
            return Ok(());
        };
        let text = self
            .resolver
            .load(&path)
            .map_err(|e| ConversionError::redirect(format!("cannot open {}: {}", path, e)))?;
        let lines = self.guard.follow(&path, split_lines(&text))?;
        self.doc.replace_remaining(lines);
        Ok(())
    }

    fn skip_ignored(&mut self, number: usize, args: &str) {
        let end = split_macro_args(args)
            .into_iter()
            .next()
            .unwrap_or_else(|| ".".to_string());
        while let Some(line) = self.doc.pop_front() {
            if parse_request(&line.text).is_some_and(|r| r.name == end) {
                return;
            }
        }
        self.warn(ConversionWarning::unterminated_block("ig").at_line(number));
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn push_body_line(lines: &mut Vec<String>, text: &str) {
    let text = trim_continuation(text.trim_end_matches(' '));
    if !text.trim().is_empty() {
        lines.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::man2html::WarningKind;
    use crate::utils::files::{MemoryFileResolver, NoopFileResolver};

    fn run_with(src: &str, resolver: &dyn FileResolver, options: &M2HOptions) -> Step<Preprocessed> {
        let lines = split_lines(src);
        let mut guard = RedirectGuard::new(options.redirect_limit, &lines);
        MacroProcessor::new(lines, resolver, &mut guard, options).run()
    }

    fn run(src: &str) -> Preprocessed {
        run_with(src, &NoopFileResolver, &M2HOptions::default()).unwrap()
    }

    fn texts(pre: &Preprocessed) -> Vec<&str> {
        pre.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_comments_removed() {
        let pre = run(".\\\" header\ntext \\\" note\n\\\" only\n.Nm ls");
        assert_eq!(texts(&pre), vec!["text", ".Nm ls"]);
        assert_eq!(pre.lines[0].number, 1);
        assert_eq!(pre.lines[1].number, 3);
    }

    #[test]
    fn test_defined_strings() {
        let pre = run(".ds V 2.1\n.ds W \"quoted \\*V\n.as V b\nversion \\*V \\*W");
        assert_eq!(texts(&pre), vec!["version 2.1b quoted 2.1"]);
        assert_eq!(pre.registers.string("V"), Some("2.1b"));
    }

    #[test]
    fn test_macro_expansion() {
        let pre = run(".de Op2\n.B \\\\$1\n\\\\$2 tail\n..\n.Op2 first \"second arg\"\nafter");
        assert_eq!(texts(&pre), vec![".B first", "second arg tail", "after"]);
    }

    #[test]
    fn test_macro_with_end_token() {
        let pre = run(".de xx yy\nbody\n.yy\n.xx\n.xx");
        assert_eq!(texts(&pre), vec!["body", "body"]);
    }

    #[test]
    fn test_if_single_line() {
        let pre = run(".if n .B term\n.if t .B typeset\n.if !n shown");
        assert_eq!(texts(&pre), vec![".B typeset", "shown"]);
    }

    #[test]
    fn test_ie_el_braces() {
        let src = ".ie n \\{\\\nterminal\n.B one\n.\\}\n.el \\{ typeset\n.I two \\}\nend";
        let pre = run(src);
        assert_eq!(texts(&pre), vec!["typeset", ".I two", "end"]);
    }

    #[test]
    fn test_nested_braces_skipped() {
        let src = ".if n \\{\\\n.if t \\{\\\ninner\n.\\}\nstill skipped\n.\\}\nvisible";
        assert_eq!(texts(&run(src)), vec!["visible"]);
    }

    #[test]
    fn test_nested_braces_kept() {
        let src = ".if t \\{\\\n.if t \\{\\\ninner\n.\\}\nouter\n.\\}";
        assert_eq!(texts(&run(src)), vec!["inner", "outer"]);
    }

    #[test]
    fn test_number_register_condition() {
        let pre = run(".nr X 1\n.if \\nX=1 one\n.rr X\n.if \\nX=1 two");
        assert_eq!(texts(&pre), vec!["one"]);
    }

    #[test]
    fn test_ignore_block() {
        let pre = run(".ig\nhidden\n..\nshown\n.ig END\nhidden\n.END\n.wh 0 hd\n.nh\nalso");
        assert_eq!(texts(&pre), vec!["shown", "also"]);
    }

    #[test]
    fn test_unknown_requests_pass_through() {
        let pre = run("'br\n.Sh NAME");
        assert_eq!(texts(&pre), vec![".br", ".Sh NAME"]);
    }

    #[test]
    fn test_macro_loop_is_capped() {
        let options = M2HOptions {
            max_expansions: 10,
            ..M2HOptions::default()
        };
        let pre = run_with(".de x\nline\n.x\n..\n.x", &NoopFileResolver, &options).unwrap();
        assert_eq!(pre.lines.len(), 10);
        assert_eq!(pre.warnings.len(), 1);
        assert_eq!(pre.warnings[0].kind, WarningKind::MacroLoop);
    }

    #[test]
    fn test_repeated_calls_are_not_a_loop() {
        let options = M2HOptions {
            max_expansions: 10,
            ..M2HOptions::default()
        };
        let mut src = String::from(".de w\n\\$1\n..\n");
        for i in 0..25 {
            src.push_str(&format!(".w word{}\n", i));
        }
        let pre = run_with(&src, &NoopFileResolver, &options).unwrap();
        assert_eq!(pre.lines.len(), 25);
        assert_eq!(pre.lines[24].text, "word24");
        assert!(pre.warnings.is_empty());
    }

    #[test]
    fn test_nested_calls_within_depth() {
        let options = M2HOptions {
            max_expansions: 3,
            ..M2HOptions::default()
        };
        let src = ".de a\n.b\n..\n.de b\n.c\n..\n.de c\nleaf\n..\n.a\n.a";
        let pre = run_with(src, &NoopFileResolver, &options).unwrap();
        assert_eq!(texts(&pre), vec!["leaf", "leaf"]);
        assert!(pre.warnings.is_empty());
    }

    #[test]
    fn test_so_inline_include() {
        let resolver = MemoryFileResolver::new().with_file("man1/real.1", ".TH REAL 1\nbody");
        let pre = run_with(
            ".so man1/real.1\nignored",
            &resolver,
            &M2HOptions::default(),
        )
        .unwrap();
        assert_eq!(texts(&pre), vec![".TH REAL 1", "body"]);
    }

    #[test]
    fn test_so_self_loop() {
        let resolver = MemoryFileResolver::new().with_file("a.1", ".so a.1");
        let err = run_with(".so a.1", &resolver, &M2HOptions::default()).unwrap_err();
        match err {
            crate::core::man2html::engine::Interrupt::Fatal(e) => assert!(e.is_redirect()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_so_chain_limit() {
        let resolver = MemoryFileResolver::new()
            .with_file("a", ".so b")
            .with_file("b", ".so a");
        let err = run_with(".so a\nx", &resolver, &M2HOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::core::man2html::engine::Interrupt::Fatal(ConversionError::Redirect { .. })
        ));
    }

    #[test]
    fn test_so_missing_target() {
        let err = run_with(".so nowhere", &NoopFileResolver, &M2HOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            crate::core::man2html::engine::Interrupt::Fatal(ConversionError::Redirect { .. })
        ));
    }

    #[test]
    fn test_so_deferred_to_interpreter() {
        let options = M2HOptions {
            inline_includes: false,
            ..M2HOptions::default()
        };
        let pre = run_with(".so other.1", &NoopFileResolver, &options).unwrap();
        assert_eq!(texts(&pre), vec![".so other.1"]);
    }
}
