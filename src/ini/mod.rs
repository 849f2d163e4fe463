//! INI text handling: line filtering, parsing, the document model and list values.

pub mod dialect;
pub mod document;
pub mod list;
pub mod parser;

pub use dialect::{DialectOptions, LineEnding};
pub use document::{DEFAULT_SECTION, Document, KeyCase, RenderConfig, ValueSlot};
pub use list::{ListEdit, ListValue, edit_list};
pub use parser::{ParseOptions, ParseOutcome, parse};
