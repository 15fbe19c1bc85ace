//! Display formatting for merged output.
//!
//! This module resolves the per-command prefixes of a run (`resolve_prefixes`)
//! and renders framed units into the bytes written to the output sinks
//! (`Decorator`). All prefixes of a run share one column width so the output
//! of differently-named commands lines up.

use unicode_width::UnicodeWidthStr;

use crate::framing::Frame;

/// Style reset appended to every emitted unit.
pub const RESET: &str = "\x1b[0m";

/// Placed between the prefix column and the command's text.
pub const SEPARATOR: &str = " | ";

/// A bracketed label padded to the run's column width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    text: String,
    width: usize,
}

impl Prefix {
    /// The padded label, e.g. `"[0] "` in a run with ten or more commands.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Display width of the prefix column.
    pub fn width(&self) -> usize {
        self.width
    }
}

/// Computes one prefix per command, or `None`s when prefixing is off.
///
/// Labels are used when given, otherwise the zero-based index. Callers
/// validate that `names` matches `count` beforehand.
pub fn resolve_prefixes(count: usize, names: Option<&[String]>, enabled: bool) -> Vec<Option<Prefix>> {
    if !enabled {
        return vec![None; count];
    }

    let bracketed: Vec<String> = (0..count)
        .map(|index| match names.and_then(|names| names.get(index)) {
            Some(name) => format!("[{}]", name),
            None => format!("[{}]", index),
        })
        .collect();
    let width = bracketed.iter().map(|s| s.width()).max().unwrap_or(0);

    bracketed
        .into_iter()
        .map(|label| {
            let pad = width.saturating_sub(label.width());
            let mut text = label;
            text.push_str(&" ".repeat(pad));
            Some(Prefix { text, width })
        })
        .collect()
}

/// Renders frames for one command's stream.
#[derive(Debug, Clone)]
pub struct Decorator {
    prefix: Option<Prefix>,
    continuation: String,
}

impl Decorator {
    pub fn new(prefix: Option<Prefix>) -> Self {
        let continuation = prefix
            .as_ref()
            .map(|p| " ".repeat(p.width()))
            .unwrap_or_default();
        Self {
            prefix,
            continuation,
        }
    }

    /// Renders one frame: the first line carries the prefix, later lines an
    /// equally wide blank, and the unit ends with the reset marker and `\n`.
    pub fn render(&self, frame: &Frame) -> String {
        let mut out = String::new();
        for (i, line) in frame.lines().iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if let Some(prefix) = &self.prefix {
                if i == 0 {
                    out.push_str(prefix.as_str());
                } else {
                    out.push_str(&self.continuation);
                }
                out.push_str(SEPARATOR);
            }
            out.push_str(line);
        }
        out.push_str(RESET);
        out.push('\n');
        out
    }

    /// Lazily renders a sequence of frames.
    pub fn decorate<'a, I>(&'a self, frames: I) -> impl Iterator<Item = String> + 'a
    where
        I: IntoIterator<Item = Frame>,
        I::IntoIter: 'a,
    {
        frames.into_iter().map(move |frame| self.render(&frame))
    }
}
