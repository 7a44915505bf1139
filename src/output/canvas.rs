//! Line-indexed terminal canvas
//!
//! Cursor-relative redraw is stateful and easy to corrupt with concurrent
//! writers, so the streaming renderer only talks to this trait: lines are
//! appended once, then rewritten by index. Tests inject `MemoryCanvas`
//! instead of parsing escape sequences.

use std::io::Write;

/// A vertically growing region of the terminal with rewritable lines.
pub trait Canvas: Send {
    /// Append a line below everything written so far; returns its index.
    fn append_line(&mut self, text: &str) -> std::io::Result<usize>;

    /// Replace the contents of a previously appended line.
    fn rewrite_line(&mut self, index: usize, text: &str) -> std::io::Result<()>;

    /// Append a multi-line block below everything written so far.
    fn append_block(&mut self, text: &str) -> std::io::Result<()>;
}

/// Canvas over a real terminal using ANSI cursor movement.
pub struct AnsiCanvas<W: Write + Send> {
    out: W,
    lines: usize,
}

impl<W: Write + Send> AnsiCanvas<W> {
    pub fn new(out: W) -> Self {
        Self { out, lines: 0 }
    }
}

impl<W: Write + Send> Canvas for AnsiCanvas<W> {
    fn append_line(&mut self, text: &str) -> std::io::Result<usize> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        let index = self.lines;
        self.lines += 1;
        Ok(index)
    }

    fn rewrite_line(&mut self, index: usize, text: &str) -> std::io::Result<()> {
        // The cursor rests at column 0 below the last line; move up, clear,
        // rewrite, move back down.
        let up = self.lines.saturating_sub(index);
        if up == 0 {
            return Ok(());
        }
        write!(self.out, "\x1b[{up}A\r\x1b[2K{text}\x1b[{up}B\r")?;
        self.out.flush()
    }

    fn append_block(&mut self, text: &str) -> std::io::Result<()> {
        for line in text.lines() {
            writeln!(self.out, "{line}")?;
            self.lines += 1;
        }
        self.out.flush()
    }
}

/// In-memory canvas double: a plain list of lines.
#[derive(Debug, Default)]
pub struct MemoryCanvas {
    lines: Vec<String>,
}

impl MemoryCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

impl Canvas for MemoryCanvas {
    fn append_line(&mut self, text: &str) -> std::io::Result<usize> {
        self.lines.push(text.to_string());
        Ok(self.lines.len() - 1)
    }

    fn rewrite_line(&mut self, index: usize, text: &str) -> std::io::Result<()> {
        if let Some(line) = self.lines.get_mut(index) {
            *line = text.to_string();
        }
        Ok(())
    }

    fn append_block(&mut self, text: &str) -> std::io::Result<()> {
        for line in text.lines() {
            self.lines.push(line.to_string());
        }
        Ok(())
    }
}
