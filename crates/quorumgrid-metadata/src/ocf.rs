//! OCF-style XML option-list output.
//!
//! Produces the `resource-agent` metadata document. The legacy toggle
//! rewrites types and folds markers the way older consumers expect; it
//! lives entirely here, at output time, so the metadata model knows
//! nothing about it.

use tracing::debug;

use crate::option::{OptionFlags, OptionKind, OptionMetadata};
use crate::sink::OutputSink;
use crate::xml::XmlNode;

/// The OCF metadata standard implemented by this output.
pub const OCF_VERSION: &str = "1.1";

/// Write an option list as a `resource-agent` metadata document.
///
/// With `legacy`, durations become `time`, nonnegative integers become
/// `integer`, deprecation and advanced markers are folded into the
/// short description, allowed values are inlined into the long
/// description, and the `advanced`/`generated` attributes are omitted.
pub fn format_option_list_xml(
    sink: &mut dyn OutputSink,
    name: &str,
    version: &str,
    desc_short: &str,
    desc_long: &str,
    options: &[OptionMetadata],
    legacy: bool,
    locale: Option<&str>,
) {
    let mut root = XmlNode::new("resource-agent")
        .attr("name", name)
        .attr("version", version)
        .child(XmlNode::new("version").with_text(OCF_VERSION))
        .child(XmlNode::new("longdesc").attr("lang", "en").with_text(desc_long))
        .child(XmlNode::new("shortdesc").attr("lang", "en").with_text(desc_short));

    let mut parameters = XmlNode::new("parameters");
    for option in options {
        parameters.push(parameter_node(option, legacy, locale));
    }
    root.push(parameters);

    debug!(name, options = options.len(), legacy, "formatted metadata document");
    sink.xml(root);
}

fn parameter_node(option: &OptionMetadata, legacy: bool, locale: Option<&str>) -> XmlNode {
    let mut node = XmlNode::new("parameter").attr("name", &option.name);
    if !legacy {
        node = node
            .attr(
                "advanced",
                bool_attr(option.flags.contains(OptionFlags::ADVANCED)),
            )
            .attr(
                "generated",
                bool_attr(option.flags.contains(OptionFlags::GENERATED)),
            );
    }

    let long_desc = effective_long_desc(option, legacy);
    let short_desc = effective_short_desc(option, legacy);

    node.push(
        XmlNode::new("longdesc")
            .attr("lang", "en")
            .with_text(&long_desc),
    );
    if let (Some(locale), Some(translated)) = (locale, &option.long_desc_l10n) {
        if Some(translated.as_str()) != option.long_desc.as_deref() {
            node.push(
                XmlNode::new("longdesc")
                    .attr("lang", primary_tag(locale))
                    .with_text(translated),
            );
        }
    }

    node.push(
        XmlNode::new("shortdesc")
            .attr("lang", "en")
            .with_text(&short_desc),
    );
    if let (Some(locale), Some(translated)) = (locale, &option.short_desc_l10n) {
        if translated != &option.short_desc {
            node.push(
                XmlNode::new("shortdesc")
                    .attr("lang", primary_tag(locale))
                    .with_text(translated),
            );
        }
    }

    if !legacy && option.flags.contains(OptionFlags::DEPRECATED) {
        node.push(XmlNode::new("deprecated"));
    }

    let kind_str = if legacy {
        option.kind.legacy_str()
    } else {
        option.kind.as_str()
    };
    let mut content = XmlNode::new("content").attr("type", kind_str);
    if let Some(default) = &option.default {
        content = content.attr("default", default);
    }
    if option.kind == OptionKind::Select {
        for value in &option.values {
            content.push(XmlNode::new("option").attr("value", value));
        }
    }
    node.push(content);
    node
}

fn bool_attr(set: bool) -> &'static str {
    if set { "1" } else { "0" }
}

fn effective_long_desc(option: &OptionMetadata, legacy: bool) -> String {
    let mut long_desc = option.long_desc.clone().unwrap_or_default();
    if legacy && option.kind == OptionKind::Select && !option.values.is_empty() {
        if !long_desc.is_empty() {
            long_desc.push(' ');
        }
        long_desc.push_str(&format!("Allowed values: {}", option.values.join(", ")));
    }
    long_desc
}

/// The short description, with markers folded in for legacy consumers:
/// "Deprecated", then "Advanced Use Only", then the original text.
fn effective_short_desc(option: &OptionMetadata, legacy: bool) -> String {
    if !legacy {
        return option.short_desc.clone();
    }
    let mut short_desc = String::new();
    if option.flags.contains(OptionFlags::DEPRECATED) {
        short_desc.push_str("*** Deprecated *** ");
    }
    if option.flags.contains(OptionFlags::ADVANCED) {
        short_desc.push_str("*** Advanced Use Only *** ");
    }
    short_desc.push_str(&option.short_desc);
    short_desc
}

/// The primary subtag of a locale name: `de_DE.UTF-8` → `de`.
fn primary_tag(locale: &str) -> &str {
    locale
        .split(['_', '.', '@'])
        .next()
        .unwrap_or(locale)
}
