//! In-memory INI document that re-serializes without losing formatting.
//!
//! Every line read from the input is kept. Lines the caller never touches
//! are written back verbatim; only entries that are added or reassigned are
//! rendered from their parts, using [`RenderConfig`] for the delimiter style.

use crate::error::{EditError, Result};
use crate::storage::checksum::Checksum;

use super::dialect::LineEnding;

/// Name of the implicit section holding keys inherited by every section.
pub const DEFAULT_SECTION: &str = "DEFAULT";

/// Indentation used for continuation lines of a value that had none before.
const CONTINUATION_INDENT: &str = "        ";

/// The value side of a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueSlot {
    /// A value written after a delimiter, possibly empty.
    Present(String),
    /// A flag key written without any delimiter.
    NoDelimiter,
}

impl ValueSlot {
    /// The value text; flag keys read as empty.
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Present(text) => text,
            Self::NoDelimiter => "",
        }
    }

    /// Whether this is a flag key.
    #[must_use]
    pub const fn is_flag(&self) -> bool {
        matches!(self, Self::NoDelimiter)
    }
}

impl From<&str> for ValueSlot {
    fn from(text: &str) -> Self {
        Self::Present(text.to_string())
    }
}

/// How key names are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum KeyCase {
    /// Compare lower-cased names; stored spelling is kept.
    #[default]
    Fold,
    /// Compare names exactly.
    Preserve,
}

impl KeyCase {
    /// Whether `a` and `b` name the same key.
    #[must_use]
    pub fn matches(self, a: &str, b: &str) -> bool {
        match self {
            Self::Fold => a == b || a.to_lowercase() == b.to_lowercase(),
            Self::Preserve => a == b,
        }
    }
}

/// Facts about the raw text a document was parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceMeta {
    /// Line terminator used when rendering.
    pub line_ending: LineEnding,
    /// The input started with an empty line.
    pub has_leading_blank_line: bool,
    /// The input contained a literal `[DEFAULT]` header.
    pub had_explicit_default_header: bool,
    /// The input contained at least one flag key.
    pub has_valueless_keys: bool,
    /// Parsing needed a synthetic `[DEFAULT]` header.
    pub injected_default: bool,
    /// Hash of the input bytes.
    pub checksum: Checksum,
}

/// Serializer switches chosen per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderConfig {
    /// Write new delimiters as ` = ` rather than `=`.
    pub delimiter_spacing: bool,
    /// Write the synthetic `[DEFAULT]` header when no literal one exists.
    pub show_synthetic_default: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            delimiter_spacing: true,
            show_synthetic_default: false,
        }
    }
}

/// A source line kept verbatim, with the terminator it was read with.
///
/// `ending` is `None` for lines created by a mutation and for a final line
/// that had no terminator; those are written with the document's ending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawLine {
    pub(crate) text: String,
    pub(crate) ending: Option<LineEnding>,
}

impl RawLine {
    pub(crate) const fn new(text: String, ending: Option<LineEnding>) -> Self {
        Self { text, ending }
    }

    const fn generated(text: String) -> Self {
        Self { text, ending: None }
    }
}

/// A `;` comment trailing a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct InlineComment {
    /// Character column the comment started at.
    pub(crate) column: usize,
    pub(crate) text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub(crate) key: String,
    pub(crate) value: ValueSlot,
    /// Text between key and value as written; `None` uses the render config.
    pub(crate) separator: Option<String>,
    pub(crate) comment: Option<InlineComment>,
    pub(crate) continuation_indent: Option<String>,
    /// Source lines, dropped once the entry is reassigned.
    pub(crate) raw: Option<Vec<RawLine>>,
}

impl Entry {
    fn added(key: &str, value: ValueSlot) -> Self {
        Self {
            key: key.to_string(),
            value,
            separator: None,
            comment: None,
            continuation_indent: None,
            raw: None,
        }
    }

    fn assign(&mut self, value: ValueSlot) {
        if self.value == value {
            return;
        }
        self.value = value;
        self.raw = None;
    }

    fn render_into(&self, out: &mut Vec<RawLine>, config: RenderConfig) {
        if let Some(raw) = &self.raw {
            out.extend(raw.iter().cloned());
            return;
        }
        let ValueSlot::Present(text) = &self.value else {
            let mut line = self.key.clone();
            self.attach_comment(&mut line);
            out.push(RawLine::generated(line));
            return;
        };
        let separator = self.separator.as_deref().unwrap_or(if config.delimiter_spacing {
            " = "
        } else {
            "="
        });
        let mut parts = text.split('\n');
        let mut line = format!("{}{separator}{}", self.key, parts.next().unwrap_or_default());
        self.attach_comment(&mut line);
        out.push(RawLine::generated(line));

        let indent = self
            .continuation_indent
            .as_deref()
            .unwrap_or(CONTINUATION_INDENT);
        for part in parts {
            let text = if part.is_empty() {
                String::new()
            } else {
                format!("{indent}{part}")
            };
            out.push(RawLine::generated(text));
        }
    }

    fn attach_comment(&self, line: &mut String) {
        let Some(comment) = &self.comment else {
            return;
        };
        line.push(' ');
        let width = line.chars().count();
        if width < comment.column {
            line.extend(std::iter::repeat_n(' ', comment.column - width));
        }
        line.push_str(&comment.text);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Line {
    Blank(RawLine),
    Comment(RawLine),
    Entry(Entry),
}

impl Line {
    fn render_into(&self, out: &mut Vec<RawLine>, config: RenderConfig) {
        match self {
            Self::Blank(raw) | Self::Comment(raw) => out.push(raw.clone()),
            Self::Entry(entry) => entry.render_into(out, config),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Header {
    /// Read from the input; kept verbatim.
    Written(RawLine),
    /// Injected so that sectionless keys have a home.
    Synthetic,
    /// Created by a mutation.
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SectionBlock {
    pub(crate) name: String,
    pub(crate) header: Header,
    pub(crate) header_dropped: bool,
    pub(crate) lines: Vec<Line>,
}

impl SectionBlock {
    pub(crate) const fn new(name: String, header: Header) -> Self {
        Self {
            name,
            header,
            header_dropped: false,
            lines: Vec::new(),
        }
    }

    fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry(entry) => Some(entry),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Block {
    /// Blank or comment lines outside any section body.
    Loose(Line),
    Section(SectionBlock),
}

/// A parsed INI document.
#[derive(Debug, Clone)]
pub struct Document {
    blocks: Vec<Block>,
    key_case: KeyCase,
    meta: SourceMeta,
}

impl Document {
    pub(crate) const fn from_parts(blocks: Vec<Block>, key_case: KeyCase, meta: SourceMeta) -> Self {
        Self {
            blocks,
            key_case,
            meta,
        }
    }

    /// Facts about the text this document was parsed from.
    #[must_use]
    pub const fn meta(&self) -> &SourceMeta {
        &self.meta
    }

    /// Key comparison used by lookups.
    #[must_use]
    pub const fn key_case(&self) -> KeyCase {
        self.key_case
    }

    /// Whether the input used flag keys.
    #[must_use]
    pub const fn has_valueless_keys(&self) -> bool {
        self.meta.has_valueless_keys
    }

    fn blocks_named<'a, 'b>(
        &'a self,
        name: &'b str,
    ) -> impl Iterator<Item = &'a SectionBlock> + use<'a, 'b> {
        self.blocks.iter().filter_map(move |block| match block {
            Block::Section(section) if section.name == name => Some(section),
            _ => None,
        })
    }

    fn blocks_named_mut<'a, 'b>(
        &'a mut self,
        name: &'b str,
    ) -> impl Iterator<Item = &'a mut SectionBlock> + use<'a, 'b> {
        self.blocks.iter_mut().filter_map(move |block| match block {
            Block::Section(section) if section.name == name => Some(section),
            _ => None,
        })
    }

    /// Names of the non-DEFAULT sections, in order of first appearance.
    #[must_use]
    pub fn sections(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for block in &self.blocks {
            if let Block::Section(section) = block
                && section.name != DEFAULT_SECTION
                && !names.contains(&section.name.as_str())
            {
                names.push(&section.name);
            }
        }
        names
    }

    /// Whether `name` exists. DEFAULT always does.
    #[must_use]
    pub fn has_section(&self, name: &str) -> bool {
        name == DEFAULT_SECTION || self.blocks_named(name).next().is_some()
    }

    /// Keys written in `section` itself, in order, with the last value of
    /// any duplicate. `None` when the section does not exist.
    #[must_use]
    pub fn own_items(&self, section: &str) -> Option<Vec<(&str, &ValueSlot)>> {
        if !self.has_section(section) {
            return None;
        }
        let mut items: Vec<(&str, &ValueSlot)> = Vec::new();
        for entry in self.blocks_named(section).flat_map(SectionBlock::entries) {
            match items
                .iter_mut()
                .find(|(key, _)| self.key_case.matches(key, &entry.key))
            {
                Some(item) => item.1 = &entry.value,
                None => items.push((&entry.key, &entry.value)),
            }
        }
        Some(items)
    }

    /// Keys of the DEFAULT section.
    #[must_use]
    pub fn defaults(&self) -> Vec<(&str, &ValueSlot)> {
        self.own_items(DEFAULT_SECTION).unwrap_or_default()
    }

    /// Keys of `section` that are not simply inherited from DEFAULT.
    ///
    /// A key whose value equals DEFAULT's is left out, unless `section`
    /// is DEFAULT itself.
    #[must_use]
    pub fn distinct_items(&self, section: &str) -> Option<Vec<(&str, &ValueSlot)>> {
        let items = self.own_items(section)?;
        if section == DEFAULT_SECTION {
            return Some(items);
        }
        let defaults = self.defaults();
        Some(
            items
                .into_iter()
                .filter(|(key, value)| {
                    !defaults
                        .iter()
                        .any(|(dkey, dvalue)| self.key_case.matches(dkey, key) && dvalue == value)
                })
                .collect(),
        )
    }

    fn find_entry(&self, section: &str, key: &str) -> Option<&Entry> {
        self.blocks_named(section)
            .flat_map(SectionBlock::entries)
            .filter(|entry| self.key_case.matches(&entry.key, key))
            .last()
    }

    /// Value of `key` in `section`, falling back to DEFAULT.
    ///
    /// # Errors
    ///
    /// [`EditError::MissingSection`] when the section does not exist and
    /// [`EditError::MissingParam`] when neither it nor DEFAULT has the key.
    ///
    /// # Examples
    ///
    /// ```
    /// use iniedit_cli::ini::{ParseOptions, parse};
    ///
    /// let doc = parse("[DEFAULT]\nport = 80\n[web]\nhost = x\n", &ParseOptions::default()).unwrap();
    /// assert_eq!(doc.get("web", "host").unwrap().text(), "x");
    /// assert_eq!(doc.get("web", "port").unwrap().text(), "80");
    /// assert!(doc.get("web", "missing").is_err());
    /// ```
    pub fn get(&self, section: &str, key: &str) -> Result<&ValueSlot> {
        if !self.has_section(section) {
            return Err(EditError::MissingSection(section.to_string()));
        }
        self.find_entry(section, key)
            .or_else(|| {
                if section == DEFAULT_SECTION {
                    None
                } else {
                    self.find_entry(DEFAULT_SECTION, key)
                }
            })
            .map(|entry| &entry.value)
            .ok_or_else(|| EditError::MissingParam(key.to_string()))
    }

    /// Assign `value` to `key` in `section`.
    ///
    /// The last occurrence of an existing key is updated in place. A new key
    /// is appended to the last block of the section.
    ///
    /// # Errors
    ///
    /// [`EditError::MissingSection`] when the section does not exist.
    ///
    /// # Examples
    ///
    /// ```
    /// use iniedit_cli::ini::{ParseOptions, RenderConfig, parse};
    ///
    /// let mut doc = parse("[web]\nhost:old ; keep\n", &ParseOptions::default()).unwrap();
    /// doc.set("web", "host", "new".into()).unwrap();
    /// doc.set("web", "port", "8080".into()).unwrap();
    /// assert_eq!(
    ///     doc.render(RenderConfig::default()),
    ///     "[web]\nhost:new ; keep\nport = 8080\n",
    /// );
    /// ```
    pub fn set(&mut self, section: &str, key: &str, value: ValueSlot) -> Result<()> {
        if !self.has_section(section) {
            return Err(EditError::MissingSection(section.to_string()));
        }
        if section == DEFAULT_SECTION {
            self.ensure_default_block();
        }
        let key_case = self.key_case;
        let existing = self
            .blocks_named_mut(section)
            .flat_map(|block| block.lines.iter_mut())
            .filter_map(|line| match line {
                Line::Entry(entry) if key_case.matches(&entry.key, key) => Some(entry),
                _ => None,
            })
            .last();
        if let Some(entry) = existing {
            entry.assign(value);
            return Ok(());
        }
        if let Some(block) = self.blocks_named_mut(section).last() {
            block.lines.push(Line::Entry(Entry::added(key, value)));
        }
        Ok(())
    }

    /// Append an empty section at the end unless it already exists.
    pub fn add_section(&mut self, name: &str) {
        if self.has_section(name) {
            return;
        }
        self.blocks
            .push(Block::Loose(Line::Blank(RawLine::generated(String::new()))));
        self.blocks.push(Block::Section(SectionBlock::new(
            name.to_string(),
            Header::Added,
        )));
    }

    /// Remove every block of section `name`. DEFAULT cannot be removed.
    ///
    /// Returns whether anything was removed.
    pub fn remove_section(&mut self, name: &str) -> bool {
        if name == DEFAULT_SECTION {
            return false;
        }
        let before = self.blocks.len();
        self.blocks
            .retain(|block| !matches!(block, Block::Section(section) if section.name == name));
        self.blocks.len() != before
    }

    /// Remove every occurrence of `key` from `section`.
    ///
    /// Returns whether anything was removed.
    ///
    /// # Errors
    ///
    /// [`EditError::MissingSection`] when the section does not exist.
    pub fn remove_key(&mut self, section: &str, key: &str) -> Result<bool> {
        if !self.has_section(section) {
            return Err(EditError::MissingSection(section.to_string()));
        }
        let key_case = self.key_case;
        let mut removed = false;
        for block in self.blocks_named_mut(section) {
            let before = block.lines.len();
            block
                .lines
                .retain(|line| !matches!(line, Line::Entry(entry) if key_case.matches(&entry.key, key)));
            removed |= block.lines.len() != before;
        }
        Ok(removed)
    }

    /// Remove all DEFAULT keys and stop writing its header.
    pub fn clear_default(&mut self) {
        let mut first = true;
        for block in self.blocks_named_mut(DEFAULT_SECTION) {
            block.lines.retain(|line| !matches!(line, Line::Entry(_)));
            if first {
                block.header_dropped = true;
                first = false;
            }
        }
    }

    fn ensure_default_block(&mut self) {
        if self.blocks_named(DEFAULT_SECTION).next().is_none() {
            self.blocks.insert(
                0,
                Block::Section(SectionBlock::new(
                    DEFAULT_SECTION.to_string(),
                    Header::Synthetic,
                )),
            );
        }
    }

    fn header_line(&self, section: &SectionBlock, config: RenderConfig) -> Option<RawLine> {
        if section.header_dropped {
            return None;
        }
        match &section.header {
            Header::Written(raw) => Some(raw.clone()),
            Header::Added => Some(RawLine::generated(format!("[{}]", section.name))),
            Header::Synthetic => (config.show_synthetic_default
                && !self.meta.had_explicit_default_header)
                .then(|| RawLine::generated(format!("[{DEFAULT_SECTION}]"))),
        }
    }

    /// Serialize the document.
    ///
    /// Lines read from the source keep their own terminator; new lines use
    /// the ending of the first source line. Output ends with a terminator
    /// whenever it is not empty.
    #[must_use]
    pub fn render(&self, config: RenderConfig) -> String {
        let mut lines: Vec<RawLine> = Vec::new();
        let mut leading_header_hidden = false;
        for (index, block) in self.blocks.iter().enumerate() {
            match block {
                Block::Loose(line) => line.render_into(&mut lines, config),
                Block::Section(section) => {
                    match self.header_line(section, config) {
                        Some(header) => lines.push(header),
                        None => leading_header_hidden |= index == 0,
                    }
                    for line in &section.lines {
                        line.render_into(&mut lines, config);
                    }
                }
            }
        }
        if leading_header_hidden
            && !self.meta.has_leading_blank_line
            && lines.first().is_some_and(|line| line.text.is_empty())
        {
            lines.remove(0);
        }
        let mut out = String::new();
        for line in &lines {
            out.push_str(&line.text);
            out.push_str(line.ending.unwrap_or(self.meta.line_ending).as_str());
        }
        out
    }
}
