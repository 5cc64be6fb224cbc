//! Line buffers for the roff engine.
//!
//! [`SourceDocument`] is the splice-capable buffer the preprocessor consumes:
//! an arena of lines plus a cursor. Macro expansion and `.so` redirection both
//! write at the cursor, so the unconsumed lines keep their relative order and
//! a popped line is never seen again unless it is re-inserted.
//!
//! [`LineStream`] is the flat, already-expanded stream handed to the
//! interpreter.

/// A line together with the index it had when it was consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    /// 0-based index in the source buffer at the time the line was popped.
    /// Splices shift later lines, so after an expansion this is the
    /// post-expansion position rather than the file offset.
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    pub fn new(number: usize, text: impl Into<String>) -> Self {
        SourceLine {
            number,
            text: text.into(),
        }
    }
}

/// Ordered, index-addressable line buffer with a consume cursor.
///
/// Each line also records how many macro expansions produced it: 0 for
/// document lines, one more than the invoking line for an expanded body.
#[derive(Debug, Clone, Default)]
pub struct SourceDocument {
    lines: Vec<String>,
    depths: Vec<usize>,
    cursor: usize,
}

impl SourceDocument {
    pub fn new(lines: Vec<String>) -> Self {
        let depths = vec![0; lines.len()];
        SourceDocument {
            lines,
            depths,
            cursor: 0,
        }
    }

    /// Pop the next unconsumed line.
    pub fn pop_front(&mut self) -> Option<SourceLine> {
        let text = self.lines.get(self.cursor)?.clone();
        let line = SourceLine::new(self.cursor, text);
        self.cursor += 1;
        Some(line)
    }

    /// Next unconsumed line without consuming it.
    pub fn peek(&self) -> Option<&str> {
        self.lines.get(self.cursor).map(String::as_str)
    }

    /// Expansion depth of the line popped last.
    pub fn depth(&self) -> usize {
        self.cursor
            .checked_sub(1)
            .and_then(|idx| self.depths.get(idx))
            .copied()
            .unwrap_or(0)
    }

    /// Insert lines so that they are the next ones popped, at the depth of
    /// the line popped last.
    pub fn splice_front(&mut self, lines: Vec<String>) {
        self.splice_at(lines, self.depth());
    }

    /// Insert a macro body expanded from the line popped last.
    pub fn splice_expansion(&mut self, lines: Vec<String>) {
        self.splice_at(lines, self.depth() + 1);
    }

    fn splice_at(&mut self, lines: Vec<String>, depth: usize) {
        let count = lines.len();
        self.lines.splice(self.cursor..self.cursor, lines);
        self.depths
            .splice(self.cursor..self.cursor, std::iter::repeat(depth).take(count));
    }

    /// Drop every unconsumed line and continue with `lines` instead.
    pub fn replace_remaining(&mut self, lines: Vec<String>) {
        self.lines.truncate(self.cursor);
        self.depths.truncate(self.cursor);
        self.depths.extend(std::iter::repeat(0).take(lines.len()));
        self.lines.extend(lines);
    }

    /// Lines not yet consumed.
    pub fn unconsumed(&self) -> &[String] {
        &self.lines[self.cursor.min(self.lines.len())..]
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.lines.len()
    }
}

/// Read cursor over the preprocessed line stream.
#[derive(Debug, Clone, Default)]
pub struct LineStream {
    lines: Vec<SourceLine>,
    pos: usize,
}

impl LineStream {
    pub fn new(lines: Vec<SourceLine>) -> Self {
        LineStream { lines, pos: 0 }
    }

    pub fn next_line(&mut self) -> Option<SourceLine> {
        let line = self.lines.get(self.pos)?.clone();
        self.pos += 1;
        Some(line)
    }

    pub fn peek(&self) -> Option<&SourceLine> {
        self.lines.get(self.pos)
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.lines.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(lines: &[&str]) -> SourceDocument {
        SourceDocument::new(lines.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_pop_in_order() {
        let mut d = doc(&["a", "b"]);
        assert_eq!(d.pop_front(), Some(SourceLine::new(0, "a")));
        assert_eq!(d.peek(), Some("b"));
        assert_eq!(d.pop_front(), Some(SourceLine::new(1, "b")));
        assert_eq!(d.pop_front(), None);
        assert!(d.is_exhausted());
    }

    #[test]
    fn test_splice_front_preserves_order() {
        let mut d = doc(&["call", "after"]);
        d.pop_front();
        d.splice_front(vec!["x".into(), "y".into()]);
        assert_eq!(d.unconsumed(), &["x", "y", "after"]);
        assert_eq!(d.pop_front().map(|l| l.number), Some(1));
        assert_eq!(d.pop_front().map(|l| l.text), Some("y".to_string()));
        assert_eq!(d.pop_front().map(|l| l.number), Some(3));
    }

    #[test]
    fn test_expansion_depth() {
        let mut d = doc(&[".call", "after"]);
        d.pop_front();
        assert_eq!(d.depth(), 0);
        d.splice_expansion(vec![".inner".into()]);
        d.pop_front();
        assert_eq!(d.depth(), 1);
        d.splice_expansion(vec!["deep".into()]);
        d.splice_front(vec!["same".into()]);
        d.pop_front();
        assert_eq!(d.depth(), 1);
        d.pop_front();
        assert_eq!(d.depth(), 2);
        assert_eq!(d.pop_front().map(|l| l.text), Some("after".to_string()));
        assert_eq!(d.depth(), 0);
    }

    #[test]
    fn test_replace_remaining() {
        let mut d = doc(&[".so other", "dropped", "dropped too"]);
        d.pop_front();
        d.replace_remaining(vec!["other".into()]);
        assert_eq!(d.unconsumed(), &["other"]);
        assert_eq!(d.position(), 1);
    }

    #[test]
    fn test_line_stream() {
        let mut s = LineStream::new(vec![SourceLine::new(0, "a"), SourceLine::new(2, "b")]);
        assert_eq!(s.peek().map(|l| l.number), Some(0));
        assert_eq!(s.next_line().map(|l| l.text), Some("a".into()));
        assert_eq!(s.next_line().map(|l| l.number), Some(2));
        assert!(s.is_exhausted());
    }
}
