//! Forgiving INI grammar producing a [`Document`].
//!
//! Parsing happens in two stages. The first reads the text as written; if it
//! finds keys before any `[section]` header, or ends up with an empty DEFAULT
//! section that the text never declared, it reports
//! [`ParseOutcome::NeedsDefaultSection`]. The second stage reads the text again
//! behind a synthetic `[DEFAULT]` header so sectionless keys are addressable.

use crate::error::ParseError;
use crate::storage::checksum::Checksum;

use super::dialect::{
    COMMENT_MARKERS, DELIMITERS, DialectFilter, DialectOptions, FilteredLine, LineEnding,
};
use super::document::{
    Block, DEFAULT_SECTION, Document, Entry, Header, InlineComment, KeyCase, Line, RawLine,
    SectionBlock, SourceMeta, ValueSlot,
};

/// Options controlling how text is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Dialect switches applied by the line filter.
    pub dialect: DialectOptions,
    /// Key comparison stored in the resulting document.
    pub key_case: KeyCase,
}

/// Result of one parse stage.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The text parsed into a usable document.
    Parsed(Document),
    /// The text must be re-read behind a synthetic `[DEFAULT]` header.
    NeedsDefaultSection,
}

/// Parse `input`, re-reading it with a synthetic DEFAULT section if needed.
///
/// # Errors
///
/// Returns a [`ParseError`] naming the first line the grammar rejects.
pub fn parse(input: &str, options: &ParseOptions) -> Result<Document, ParseError> {
    if let ParseOutcome::Parsed(doc) = parse_stage(input, options, false)? {
        return Ok(doc);
    }
    tracing::debug!("re-parsing behind a synthetic [{DEFAULT_SECTION}] header");
    match parse_stage(input, options, true)? {
        ParseOutcome::Parsed(doc) => Ok(doc),
        ParseOutcome::NeedsDefaultSection => Err(ParseError {
            line_number: 1,
            line: input.lines().next().unwrap_or_default().to_string(),
            reason: "no section header",
        }),
    }
}

/// Run a single parse stage.
///
/// With `inject_default` set the DialectFilter yields a `[DEFAULT]` header
/// first and this stage never asks for another.
///
/// # Errors
///
/// Returns a [`ParseError`] naming the first line the grammar rejects.
pub fn parse_stage(
    input: &str,
    options: &ParseOptions,
    inject_default: bool,
) -> Result<ParseOutcome, ParseError> {
    let mut filter = if inject_default {
        DialectFilter::with_default_section(input, options.dialect)
    } else {
        DialectFilter::new(input, options.dialect)
    };
    let Some(blocks) = read_blocks(&mut filter)? else {
        return Ok(ParseOutcome::NeedsDefaultSection);
    };

    let meta = SourceMeta {
        line_ending: filter.line_ending(),
        has_leading_blank_line: input.starts_with('\n') || input.starts_with("\r\n"),
        had_explicit_default_header: input
            .lines()
            .any(|line| line.starts_with("[DEFAULT]")),
        has_valueless_keys: filter.has_valueless_keys(),
        injected_default: inject_default,
        checksum: Checksum::of(input.as_bytes()),
    };
    let doc = Document::from_parts(blocks, options.key_case, meta);

    if !inject_default && doc.defaults().is_empty() && !doc.meta().had_explicit_default_header {
        return Ok(ParseOutcome::NeedsDefaultSection);
    }
    Ok(ParseOutcome::Parsed(doc))
}

/// Group filtered lines into blocks.
///
/// Blank and comment lines are held back until the next line decides where
/// they belong: before an entry they join its section, before a header they
/// stay outside any section. An indented line continues the last entry of
/// the current section, even when it starts with a comment marker; only a
/// comment marker in column 0 ends the entry. Returns `None` when an entry
/// appears before any section header.
fn read_blocks(filter: &mut DialectFilter<'_>) -> Result<Option<Vec<Block>>, ParseError> {
    let mut blocks: Vec<Block> = Vec::new();
    let mut pending: Vec<Line> = Vec::new();
    let mut current: Option<SectionBlock> = None;
    // Whether an indented line may still continue the last entry.
    let mut open_entry = false;

    for line in filter.by_ref() {
        let FilteredLine {
            number,
            text,
            valueless,
            ending,
        } = line;
        let trimmed = text.trim();

        if trimmed.is_empty() {
            pending.push(Line::Blank(RawLine::new(text, ending)));
            continue;
        }
        if text.starts_with(char::is_whitespace) {
            let entry = current.as_mut().and_then(|section| match section.lines.last_mut() {
                Some(Line::Entry(entry)) if open_entry => Some(entry),
                _ => None,
            });
            if let Some(entry) = entry {
                for blank in pending.drain(..) {
                    if let Line::Blank(raw) = blank {
                        entry.continue_value("", raw);
                    }
                }
                let part = trimmed.to_string();
                entry.continue_value(&part, RawLine::new(text, ending));
                continue;
            }
            if !trimmed.starts_with(COMMENT_MARKERS) {
                return Err(reject(number, text, "continuation line without a key"));
            }
        }

        if trimmed.starts_with(COMMENT_MARKERS) {
            pending.push(Line::Comment(RawLine::new(text, ending)));
            open_entry = false;
        } else if text.starts_with('[') {
            let Some(name) = section_name(&text) else {
                return Err(reject(number, text, "malformed section header"));
            };
            let name = name.to_string();
            let header = if number == 0 {
                Header::Synthetic
            } else {
                Header::Written(RawLine::new(text, ending))
            };
            blocks.extend(current.take().map(Block::Section));
            blocks.extend(pending.drain(..).map(Block::Loose));
            current = Some(SectionBlock::new(name, header));
            open_entry = false;
        } else {
            let Some(section) = current.as_mut() else {
                return Ok(None);
            };
            let entry = if valueless {
                flag_entry(RawLine::new(text, ending))
            } else {
                key_entry(&text, ending).ok_or_else(|| reject(number, text, "missing key name"))?
            };
            open_entry = true;
            section.lines.append(&mut pending);
            section.lines.push(Line::Entry(entry));
        }
    }

    blocks.extend(current.map(Block::Section));
    blocks.extend(pending.into_iter().map(Block::Loose));
    Ok(Some(blocks))
}

fn reject(line_number: usize, line: String, reason: &'static str) -> ParseError {
    ParseError {
        line_number,
        line,
        reason,
    }
}

/// `[name]`, optionally followed by a `;` or `#` comment.
fn section_name(text: &str) -> Option<&str> {
    let (name, rest) = text.strip_prefix('[')?.split_once(']')?;
    let rest = rest.trim_start();
    (!name.is_empty() && (rest.is_empty() || rest.starts_with([';', '#']))).then_some(name)
}

fn flag_entry(raw: RawLine) -> Entry {
    Entry {
        key: raw.text.trim_end().to_string(),
        value: ValueSlot::NoDelimiter,
        separator: None,
        comment: None,
        continuation_indent: None,
        raw: Some(vec![raw]),
    }
}

/// Split a `key = value ; comment` line.
fn key_entry(text: &str, ending: Option<LineEnding>) -> Option<Entry> {
    let pos = text.find(DELIMITERS)?;
    let (head, rest) = text.split_at(pos);
    let key = head.trim_end();
    if key.is_empty() {
        return None;
    }
    // Delimiters are ASCII, so the value side starts one byte later.
    let after = rest.get(1..).unwrap_or_default();
    let value_part = after.trim_start();
    let lead = after.len() - value_part.len();
    let separator = format!(
        "{}{}{}",
        head.get(key.len()..).unwrap_or_default(),
        rest.get(..1).unwrap_or_default(),
        after.get(..lead).unwrap_or_default(),
    );
    let value_col = pos + 1 + lead;

    let full = value_part.trim_end();
    let (value, comment) = match full.find(';') {
        Some(offset)
            if offset > 0
                && full
                    .get(..offset)
                    .is_some_and(|before| before.ends_with(char::is_whitespace)) =>
        {
            let column = text
                .get(..value_col + offset)
                .map_or(0, |prefix| prefix.chars().count());
            (
                full.get(..offset).unwrap_or_default().trim_end(),
                Some(InlineComment {
                    column,
                    text: full.get(offset..).unwrap_or_default().to_string(),
                }),
            )
        }
        _ => (full, None),
    };

    Some(Entry {
        key: key.to_string(),
        value: ValueSlot::Present(value.to_string()),
        separator: Some(separator),
        comment,
        continuation_indent: None,
        raw: Some(vec![RawLine::new(text.to_string(), ending)]),
    })
}

impl Entry {
    /// Fold an indented line (or a blank line before one) into the value.
    ///
    /// A flag key that gains a continuation becomes an empty value followed
    /// by the continued text.
    fn continue_value(&mut self, part: &str, raw: RawLine) {
        if self.value.is_flag() {
            self.value = ValueSlot::Present(String::new());
        }
        if let ValueSlot::Present(value) = &mut self.value {
            value.push('\n');
            value.push_str(part);
        }
        if !part.is_empty() && self.continuation_indent.is_none() {
            let text = &raw.text;
            let indent_len = text.len() - text.trim_start().len();
            self.continuation_indent = text.get(..indent_len).map(str::to_string);
        }
        self.raw.get_or_insert_with(Vec::new).push(raw);
    }
}
