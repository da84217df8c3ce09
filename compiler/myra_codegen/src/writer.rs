//! Indented output buffer for generated C++.

/// One output buffer (a header or a source file).
#[derive(Default, Debug)]
pub(crate) struct Writer {
    buf: String,
    indent: usize,
}

impl Writer {
    /// Write one indented line.
    pub(crate) fn line(&mut self, text: &str) {
        if text.is_empty() {
            self.buf.push('\n');
            return;
        }
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
        self.buf.push_str(text);
        self.buf.push('\n');
    }

    /// Write text verbatim, no indentation, no newline added.
    pub(crate) fn raw(&mut self, text: &str) {
        self.buf.push_str(text);
    }

    pub(crate) fn blank(&mut self) {
        if !self.buf.ends_with("\n\n") && !self.buf.is_empty() {
            self.buf.push('\n');
        }
    }

    /// Write a line and increase the indent (block opener).
    pub(crate) fn open(&mut self, text: &str) {
        self.line(text);
        self.indent += 1;
    }

    /// Decrease the indent and write a line (block closer).
    pub(crate) fn close(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
    }

    /// Close one block and open the next on the same line, e.g.
    /// `} else {` or `} catch (...) {`.
    pub(crate) fn reopen(&mut self, text: &str) {
        self.indent = self.indent.saturating_sub(1);
        self.line(text);
        self.indent += 1;
    }

    /// `#line` directive, always at column zero.
    pub(crate) fn line_directive(&mut self, line: u32, path: &str) {
        self.buf.push_str(&format!("#line {line} \"{path}\"\n"));
    }

    pub(crate) fn finish(self) -> String {
        self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation() {
        let mut w = Writer::default();
        w.open("if (x) {");
        w.line("y = 1;");
        w.close("}");
        assert_eq!(w.finish(), "if (x) {\n    y = 1;\n}\n");
    }

    #[test]
    fn test_line_directive_at_column_zero() {
        let mut w = Writer::default();
        w.open("void f() {");
        w.line_directive(12, "/src/M.myra");
        w.line("x = 1;");
        w.close("}");
        let out = w.finish();
        assert!(out.contains("\n#line 12 \"/src/M.myra\"\n"));
    }
}
