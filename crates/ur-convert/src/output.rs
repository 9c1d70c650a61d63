//! Output assembly: named, indentation-aware text buffers.

use indexmap::IndexMap;
use std::time::SystemTime;

const INDENT: &str = "    ";

/// Text written once at the top of every buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preamble {
    /// Emit the `// Generated by Ur at ...` line
    pub generated_header: bool,
    /// Fixed prelude lines following the header
    pub prelude: Vec<String>,
}

impl Default for Preamble {
    fn default() -> Self {
        Self {
            generated_header: true,
            prelude: vec!["use std;".to_string(), "use c_runtime;".to_string()],
        }
    }
}

impl Preamble {
    fn render(&self, generated_at: SystemTime) -> String {
        let mut text = String::new();
        if self.generated_header {
            text.push_str(&format!(
                "// Generated by Ur at {}\n\n",
                humantime::format_rfc3339_seconds(generated_at)
            ));
        }
        for line in &self.prelude {
            text.push_str(line);
            text.push('\n');
        }
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

/// The set of output buffers of one conversion run.
///
/// Buffers are created on first write, in first-write order. The indent
/// level is shared by all buffers.
#[derive(Debug)]
pub struct OutputSet {
    buffers: IndexMap<String, String>,
    preamble: Option<Preamble>,
    generated_at: SystemTime,
    indent: usize,
}

impl OutputSet {
    pub fn new(preamble: Option<Preamble>) -> Self {
        Self {
            buffers: IndexMap::new(),
            preamble,
            generated_at: SystemTime::now(),
            indent: 0,
        }
    }

    /// Fix the timestamp used in preambles.
    pub fn generated_at(mut self, time: SystemTime) -> Self {
        self.generated_at = time;
        self
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn outdent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn indent_level(&self) -> usize {
        self.indent
    }

    /// Writer for `buffer`, creating it (and writing its preamble) if needed.
    pub fn writer(&mut self, buffer: &str) -> BufferWriter<'_> {
        let preamble = &self.preamble;
        let generated_at = self.generated_at;
        let text = self
            .buffers
            .entry(buffer.to_string())
            .or_insert_with(|| {
                preamble
                    .as_ref()
                    .map(|p| p.render(generated_at))
                    .unwrap_or_default()
            });
        BufferWriter {
            text,
            indent: self.indent,
        }
    }

    pub fn contains(&self, buffer: &str) -> bool {
        self.buffers.contains_key(buffer)
    }

    pub fn get(&self, buffer: &str) -> Option<&str> {
        self.buffers.get(buffer).map(String::as_str)
    }

    pub fn buffer_ids(&self) -> impl Iterator<Item = &str> {
        self.buffers.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.buffers.is_empty()
    }

    /// Hand out the finished buffers.
    pub fn finish(self) -> IndexMap<String, String> {
        self.buffers
    }
}

/// Appends lines to one buffer at a fixed indent level.
pub struct BufferWriter<'a> {
    text: &'a mut String,
    indent: usize,
}

impl BufferWriter<'_> {
    /// Write `s` as one or more lines, each prefixed by the indent.
    ///
    /// Multi-line fragments keep their own relative indentation.
    pub fn writeln(&mut self, s: &str) {
        for line in s.lines() {
            if line.trim().is_empty() {
                self.text.push('\n');
                continue;
            }
            for _ in 0..self.indent {
                self.text.push_str(INDENT);
            }
            self.text.push_str(line);
            self.text.push('\n');
        }
    }

    pub fn blank_line(&mut self) {
        self.text.push('\n');
    }

    /// Append text exactly as given.
    pub fn write_raw(&mut self, s: &str) {
        self.text.push_str(s);
    }
}
