//! A minimal XML tree for sinks that take structured output.
//!
//! The core exchanges XML as data, not as strings: sinks receive
//! [`XmlNode`] values and decide how to serialize them. The `Display`
//! implementation renders a pretty-printed, escaped document for sinks
//! that just want text.

use std::fmt;

/// One XML element: attributes, children, optional text content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
    pub text: Option<String>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.push((name.into(), value.into()));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: XmlNode) {
        self.children.push(child);
    }

    /// First child with the given element name.
    pub fn find_child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given element name.
    pub fn find_children<'a>(&'a self, name: &str) -> Vec<&'a XmlNode> {
        self.children.iter().filter(|c| c.name == name).collect()
    }

    pub fn attr_value(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        write!(f, "{indent}<{}", self.name)?;
        for (name, value) in &self.attrs {
            write!(f, " {name}=\"{}\"", escape(value))?;
        }
        match (&self.text, self.children.is_empty()) {
            (None, true) => writeln!(f, "/>"),
            (Some(text), true) => {
                writeln!(f, ">{}</{}>", escape(text), self.name)
            }
            (text, false) => {
                writeln!(f, ">")?;
                if let Some(text) = text {
                    writeln!(f, "{indent}  {}", escape(text))?;
                }
                for child in &self.children {
                    child.render(f, depth + 1)?;
                }
                writeln!(f, "{indent}</{}>", self.name)
            }
        }
    }
}

impl fmt::Display for XmlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

fn escape(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}
