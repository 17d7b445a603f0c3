//! quorumgrid option metadata.
//!
//! Models configurable options and formats option lists in the two
//! shapes the product emits: human-readable text and OCF-style XML
//! metadata. Formatters write through an [`OutputSink`] so the actual
//! destination (terminal, daemon response, test buffer) stays outside
//! the core.
//!
//! # Components
//!
//! - **`option`** — the option-metadata model and flags
//! - **`sink`** — the output seam and an in-memory buffer sink
//! - **`text`** — text output with advanced/deprecated trailing groups
//! - **`ocf`** — the `resource-agent` XML document, with legacy mode
//! - **`xml`** — the minimal XML tree handed to sinks

pub mod ocf;
pub mod option;
pub mod sink;
pub mod text;
pub mod xml;

pub use ocf::{OCF_VERSION, format_option_list_xml};
pub use option::{OptionFlags, OptionKind, OptionMetadata};
pub use sink::{BufferSink, OutputSink};
pub use text::format_option_list_text;
pub use xml::XmlNode;
