//! The option-metadata model.
//!
//! Describes one configurable option of the cluster or of a resource
//! agent: its type, default, allowed values, and descriptions. The
//! formatters in `text` and `xml` render lists of these.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// The value type of an option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    Boolean,
    Duration,
    Integer,
    NonnegativeInteger,
    Percentage,
    Select,
    String,
}

impl OptionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OptionKind::Boolean => "boolean",
            OptionKind::Duration => "duration",
            OptionKind::Integer => "integer",
            OptionKind::NonnegativeInteger => "nonnegative_integer",
            OptionKind::Percentage => "percentage",
            OptionKind::Select => "select",
            OptionKind::String => "string",
        }
    }

    /// The type name older consumers expect.
    pub fn legacy_str(self) -> &'static str {
        match self {
            OptionKind::Duration => "time",
            OptionKind::NonnegativeInteger => "integer",
            other => other.as_str(),
        }
    }
}

bitflags! {
    /// Flags on an option, also usable as an emission filter.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct OptionFlags: u32 {
        const ADVANCED = 1 << 0;
        const DEPRECATED = 1 << 1;
        const GENERATED = 1 << 2;
    }
}

/// One configurable option.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionMetadata {
    pub name: String,
    pub kind: OptionKind,
    pub default: Option<String>,
    /// Allowed values, for `select` options.
    pub values: Vec<String>,
    pub short_desc: String,
    pub long_desc: Option<String>,
    /// Translated descriptions, emitted alongside the originals when a
    /// locale is active and they differ.
    pub short_desc_l10n: Option<String>,
    pub long_desc_l10n: Option<String>,
    pub flags: OptionFlags,
}

impl OptionMetadata {
    pub fn new(name: impl Into<String>, kind: OptionKind, short_desc: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            values: Vec::new(),
            short_desc: short_desc.into(),
            long_desc: None,
            short_desc_l10n: None,
            long_desc_l10n: None,
            flags: OptionFlags::empty(),
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_values(mut self, values: &[&str]) -> Self {
        self.values = values.iter().map(|v| v.to_string()).collect();
        self
    }

    pub fn with_long_desc(mut self, long_desc: impl Into<String>) -> Self {
        self.long_desc = Some(long_desc.into());
        self
    }

    pub fn with_flags(mut self, flags: OptionFlags) -> Self {
        self.flags |= flags;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_type_rewrites() {
        assert_eq!(OptionKind::Duration.legacy_str(), "time");
        assert_eq!(OptionKind::NonnegativeInteger.legacy_str(), "integer");
        assert_eq!(OptionKind::Select.legacy_str(), "select");
    }
}
