//! Indentation-aware text sinks used by the verbose validator and by
//! [`FrozenMap::append_to`](crate::map::FrozenMap::append_to).

const INDENT: &str = "  ";

/// A text sink that tracks nesting. `newline` starts a new line at the
/// current depth.
pub trait Indenter {
    fn write(&mut self, text: &str);
    fn indent(&mut self);
    fn dedent(&mut self);
    fn newline(&mut self);
}

/// [`Indenter`] backed by a `String`.
#[derive(Debug, Clone)]
pub struct IndentBuffer {
    buffer: String,
    level: usize,
    unit: String,
}

impl IndentBuffer {
    pub fn new() -> Self {
        Self::with_unit(INDENT)
    }

    pub fn with_unit(unit: impl Into<String>) -> Self {
        IndentBuffer { buffer: String::new(), level: 0, unit: unit.into() }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn as_str(&self) -> &str {
        &self.buffer
    }

    pub fn finish(self) -> String {
        self.buffer
    }
}

impl Default for IndentBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Indenter for IndentBuffer {
    fn write(&mut self, text: &str) {
        self.buffer.push_str(text);
    }

    fn indent(&mut self) {
        self.level += 1;
    }

    fn dedent(&mut self) {
        self.level = self.level.saturating_sub(1);
    }

    fn newline(&mut self) {
        self.buffer.push('\n');
        for _ in 0..self.level {
            self.buffer.push_str(&self.unit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting() {
        let mut out = IndentBuffer::new();
        out.write("a");
        out.indent();
        out.newline();
        out.write("b");
        out.dedent();
        out.dedent();
        out.newline();
        out.write("c");
        assert_eq!(out.finish(), "a\n  b\nc");
    }

    #[test]
    fn custom_unit() {
        let mut out = IndentBuffer::with_unit("\t");
        out.indent();
        out.newline();
        out.write("x");
        assert_eq!(out.level(), 1);
        assert_eq!(out.as_str(), "\n\tx");
    }
}
