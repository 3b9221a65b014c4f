//! indented text accumulator

use crate::error::Result;

const INDENT: &str = "  ";

/// append-only swift source builder with explicit scopes
#[derive(Debug, Default)]
pub(crate) struct CodeBuilder {
    out: String,
    depth: usize,
    pending_blank: bool,
    at_scope_start: bool,
}

impl CodeBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// write one line at the current indentation
    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        if self.pending_blank && !self.at_scope_start && !self.out.is_empty() {
            self.out.push('\n');
        }
        self.pending_blank = false;
        self.at_scope_start = false;

        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.depth {
                self.out.push_str(INDENT);
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
    }

    /// write every line of `text` at the current indentation
    pub(crate) fn lines(&mut self, text: &str) {
        for line in text.lines() {
            self.line(line);
        }
    }

    /// `///` doc comment, one per line of `text`
    pub(crate) fn doc(&mut self, text: &str) {
        for line in text.trim().lines() {
            let line = line.trim_end();
            if line.is_empty() {
                self.line("///");
            } else {
                self.line(format!("/// {line}"));
            }
        }
    }

    /// separate the next line from the previous one, collapsing repeats
    pub(crate) fn blank(&mut self) {
        self.pending_blank = true;
    }

    /// `header {`, indented body, `}`
    pub(crate) fn block<F>(&mut self, header: impl AsRef<str>, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.wrapped(format!("{} {{", header.as_ref()), "}", body)
    }

    /// opening line, indented body, closing line
    pub(crate) fn wrapped<F>(&mut self, open: impl AsRef<str>, close: &str, body: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.line(open);
        self.at_scope_start = true;
        self.depth += 1;
        let result = body(self);
        self.depth -= 1;
        self.pending_blank = false;
        self.at_scope_start = false;
        self.line(close);
        result
    }

    pub(crate) fn finish(self) -> String {
        self.out
    }
}
