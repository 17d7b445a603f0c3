//! The output seam.
//!
//! Formatters never print; they hand formatted lines and XML nodes to
//! an [`OutputSink`] owned by the caller. The text side carries a
//! `fancy` toggle (list bullets on or off) that formatters capture and
//! restore around each emission.

use crate::xml::XmlNode;

/// Receives formatted output. Implemented by the embedding product.
pub trait OutputSink {
    /// One line of text output.
    fn line(&mut self, text: &str);

    /// One structured XML document or fragment.
    fn xml(&mut self, node: XmlNode);

    /// Whether text output uses list bullets.
    fn fancy(&self) -> bool {
        false
    }

    fn set_fancy(&mut self, _fancy: bool) {}
}

/// An in-memory sink, mostly for tests and buffering callers.
#[derive(Debug, Default)]
pub struct BufferSink {
    pub lines: Vec<String>,
    pub nodes: Vec<XmlNode>,
    fancy: bool,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected text output as a single string.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

impl OutputSink for BufferSink {
    fn line(&mut self, text: &str) {
        self.lines.push(text.to_string());
    }

    fn xml(&mut self, node: XmlNode) {
        self.nodes.push(node);
    }

    fn fancy(&self) -> bool {
        self.fancy
    }

    fn set_fancy(&mut self, fancy: bool) {
        self.fancy = fancy;
    }
}
