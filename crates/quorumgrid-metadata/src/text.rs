//! Human-readable option-list output.

use tracing::debug;

use crate::option::{OptionFlags, OptionKind, OptionMetadata};
use crate::sink::OutputSink;

/// Write an option list as text: a header, one entry per option, and
/// trailing groups for advanced and deprecated options.
///
/// Advanced and deprecated options are held out of the main list unless
/// `all` is set or `filter` names their flag. A held-out group is then
/// emitted at the end — except when a non-empty `filter` excludes its
/// flag (and `all` was not requested), which suppresses the group
/// entirely.
pub fn format_option_list_text(
    sink: &mut dyn OutputSink,
    desc_short: &str,
    desc_long: &str,
    options: &[OptionMetadata],
    filter: OptionFlags,
    all: bool,
) {
    let saved_fancy = sink.fancy();
    sink.set_fancy(true);

    sink.line(desc_short);
    sink.line("");
    sink.line(desc_long);
    sink.line("");

    let mut advanced: Vec<&OptionMetadata> = Vec::new();
    let mut deprecated: Vec<&OptionMetadata> = Vec::new();
    for option in options {
        if option.flags.contains(OptionFlags::DEPRECATED)
            && !(all || filter.contains(OptionFlags::DEPRECATED))
        {
            deprecated.push(option);
            continue;
        }
        if option.flags.contains(OptionFlags::ADVANCED)
            && !(all || filter.contains(OptionFlags::ADVANCED))
        {
            advanced.push(option);
            continue;
        }
        emit_option(sink, option);
    }

    let show_group =
        |flag: OptionFlags| all || filter.is_empty() || filter.contains(flag);

    if !advanced.is_empty() && show_group(OptionFlags::ADVANCED) {
        sink.line("");
        sink.line("ADVANCED OPTIONS:");
        sink.line("");
        for option in advanced {
            emit_option(sink, option);
        }
    }
    if !deprecated.is_empty() && show_group(OptionFlags::DEPRECATED) {
        sink.line("");
        sink.line("DEPRECATED OPTIONS (will be removed in a future release):");
        sink.line("");
        for option in deprecated {
            emit_option(sink, option);
        }
    }

    debug!(options = options.len(), all, "formatted option list");
    sink.set_fancy(saved_fancy);
}

fn emit_option(sink: &mut dyn OutputSink, option: &OptionMetadata) {
    let bullet = if sink.fancy() { " * " } else { "  " };
    let nested = if sink.fancy() { "   * " } else { "    " };

    sink.line(&format!("{bullet}{}: {}", option.name, option.short_desc));
    if let Some(long_desc) = &option.long_desc {
        sink.line(&format!("{nested}{long_desc}"));
    }
    sink.line(&format!("{nested}Possible values: {}", possible_values(option)));
}

fn possible_values(option: &OptionMetadata) -> String {
    if option.kind == OptionKind::Select {
        // A select with no default never marks anything as default,
        // even a value that is literally the empty string.
        let mut found_default = option.default.is_none();
        let mut parts = Vec::with_capacity(option.values.len());
        for value in &option.values {
            let mut part = format!("\"{value}\"");
            if !found_default && option.default.as_deref() == Some(value.as_str()) {
                found_default = true;
                part.push_str(" (default)");
            }
            parts.push(part);
        }
        parts.join(", ")
    } else {
        match &option.default {
            Some(default) => format!("{} (default: \"{default}\")", option.kind.as_str()),
            None => format!("{} (no default)", option.kind.as_str()),
        }
    }
}
