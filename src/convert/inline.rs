//! Inline text assembly with word-boundary spacing.
//!
//! Authored HTML routinely abuts styled runs against adjacent words
//! (`See<b>this</b>now`). Both target syntaxes require a word boundary
//! around formatting marks, so the writer inserts exactly one space between
//! a styled run and adjacent alphanumeric text, and never doubles an
//! existing one. Sentence punctuation binds directly to the preceding run.
//! Runs of source whitespace collapse to a single space.

/// Accumulates one paragraph's worth of inline output.
#[derive(Debug, Default)]
pub struct InlineWriter {
    buf: String,
    /// The last pushed content was a styled token (emphasis, strong, code,
    /// link, inline image).
    prev_styled: bool,
}

impl InlineWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Finish, trimming boundary whitespace.
    pub fn finish(self) -> String {
        self.buf.trim().to_string()
    }

    /// Push already-escaped plain text, collapsing whitespace runs.
    pub fn push_plain(&mut self, text: &str) {
        for c in text.chars() {
            if c.is_whitespace() {
                if !self.buf.is_empty() && !self.buf.ends_with(' ') {
                    self.buf.push(' ');
                }
                self.prev_styled = false;
                continue;
            }
            if self.prev_styled && needs_space_before(c) && !self.buf.ends_with(' ') {
                self.buf.push(' ');
            }
            self.prev_styled = false;
            self.buf.push(c);
        }
    }

    /// Push a styled token (complete with its formatting marks). Two styled
    /// runs back to back also need a boundary, or their marks fuse.
    pub fn push_styled(&mut self, token: &str) {
        if token.is_empty() {
            return;
        }
        let boundary = self.prev_styled
            || self.buf.chars().last().is_some_and(needs_space_after);
        if boundary && !self.buf.ends_with(' ') {
            self.buf.push(' ');
        }
        self.buf.push_str(token);
        self.prev_styled = true;
    }

    /// Push raw output (reference tokens, hard breaks) without spacing or
    /// escaping adjustments.
    pub fn push_raw(&mut self, raw: &str) {
        self.buf.push_str(raw);
        self.prev_styled = false;
    }
}

/// After a styled run, a space is needed before word characters but not
/// before binding punctuation (`.` `,` `;` `:` `!` `?` `)` `]` …).
fn needs_space_before(c: char) -> bool {
    c.is_alphanumeric()
}

/// Before a styled run, a space is needed after word characters; opening
/// punctuation and existing whitespace bind directly.
fn needs_space_after(c: char) -> bool {
    c.is_alphanumeric()
}
