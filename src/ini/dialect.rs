//! Line-level pre-processing of raw INI text before it reaches the parser.
//!
//! The filter recognises a few dialect quirks that a strict grammar would
//! reject or lose:
//!
//! - keys written without any `=`/`:` delimiter (flag keys),
//! - the `nospace` dialect, where existing `key = value` lines are tightened
//!   to `key=value`,
//! - files whose first keys sit outside any `[section]`, handled by the
//!   [`DialectFilter::with_default_section`] variant that yields a synthetic
//!   `[DEFAULT]` header before the first real line.

use std::str::SplitInclusive;

use super::document::DEFAULT_SECTION;

/// Characters that start a full-line comment.
pub const COMMENT_MARKERS: [char; 3] = ['%', ';', '#'];

/// Characters that separate a key from its value.
pub const DELIMITERS: [char; 2] = ['=', ':'];

/// Dialect switches that change how existing lines are read and new ones written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DialectOptions {
    /// Write and normalise delimiters without surrounding spaces (`key=value`).
    pub nospace: bool,
}

/// Line terminator used by a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnding {
    /// `\n`
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineEnding {
    /// The host platform's conventional terminator.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(windows) { Self::CrLf } else { Self::Lf }
    }

    /// The terminator as text.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// One line handed from the filter to the parser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilteredLine {
    /// 1-based position in the original input; `0` for a synthesized line.
    pub number: usize,
    /// Line content without its terminator, after dialect normalisation.
    pub text: String,
    /// The line is a key with no delimiter and no value.
    pub valueless: bool,
    /// Terminator the line was read with; `None` for a final unterminated
    /// line and for the synthetic header.
    pub ending: Option<LineEnding>,
}

/// Iterator over the lines of a document with dialect quirks normalised.
///
/// Statistics gathered while iterating (line ending, presence of flag keys)
/// are available once the caller is done with the lines.
#[derive(Debug)]
pub struct DialectFilter<'a> {
    lines: SplitInclusive<'a, char>,
    options: DialectOptions,
    inject_default: bool,
    number: usize,
    line_ending: Option<LineEnding>,
    has_valueless_keys: bool,
}

impl<'a> DialectFilter<'a> {
    /// Filter `input` line by line.
    #[must_use]
    pub fn new(input: &'a str, options: DialectOptions) -> Self {
        Self {
            lines: input.split_inclusive('\n'),
            options,
            inject_default: false,
            number: 0,
            line_ending: None,
            has_valueless_keys: false,
        }
    }

    /// Filter `input`, producing a synthetic `[DEFAULT]` header first.
    ///
    /// The real first line of input is deferred to the following call.
    #[must_use]
    pub fn with_default_section(input: &'a str, options: DialectOptions) -> Self {
        Self {
            inject_default: true,
            ..Self::new(input, options)
        }
    }

    /// Line ending detected from the first line read.
    ///
    /// A document with no lines uses the platform convention.
    #[must_use]
    pub fn line_ending(&self) -> LineEnding {
        self.line_ending.unwrap_or_else(LineEnding::native)
    }

    /// Whether any line read so far was a flag key.
    #[must_use]
    pub const fn has_valueless_keys(&self) -> bool {
        self.has_valueless_keys
    }

    fn filter_line(&mut self, body: &str, ending: Option<LineEnding>) -> FilteredLine {
        let number = self.number;
        if !is_key_line(body) {
            return FilteredLine {
                number,
                text: body.to_string(),
                valueless: false,
                ending,
            };
        }
        let Some(pos) = body.find(DELIMITERS) else {
            self.has_valueless_keys = true;
            return FilteredLine {
                number,
                text: body.to_string(),
                valueless: true,
                ending,
            };
        };
        let text = if self.options.nospace {
            tighten_delimiter(body, pos)
        } else {
            body.to_string()
        };
        FilteredLine {
            number,
            text,
            valueless: false,
            ending,
        }
    }
}

impl Iterator for DialectFilter<'_> {
    type Item = FilteredLine;

    fn next(&mut self) -> Option<FilteredLine> {
        if self.inject_default {
            self.inject_default = false;
            return Some(FilteredLine {
                number: 0,
                text: format!("[{DEFAULT_SECTION}]"),
                valueless: false,
                ending: None,
            });
        }

        let raw = self.lines.next()?;
        self.number += 1;
        let (body, ending) = if let Some(body) = raw.strip_suffix("\r\n") {
            (body, Some(LineEnding::CrLf))
        } else if let Some(body) = raw.strip_suffix('\n') {
            (body, Some(LineEnding::Lf))
        } else {
            (raw.strip_suffix('\r').unwrap_or(raw), None)
        };
        if self.line_ending.is_none() {
            self.line_ending = Some(ending.unwrap_or(LineEnding::Lf));
        }
        Some(self.filter_line(body, ending))
    }
}

/// A key line starts with neither `[`, whitespace nor a comment marker.
fn is_key_line(line: &str) -> bool {
    line.chars()
        .next()
        .is_some_and(|c| c != '[' && !c.is_whitespace() && !COMMENT_MARKERS.contains(&c))
}

/// Remove whitespace on both sides of the delimiter at byte offset `pos`.
fn tighten_delimiter(line: &str, pos: usize) -> String {
    let (key, rest) = line.split_at(pos);
    let mut chars = rest.chars();
    let delimiter = chars.next().unwrap_or('=');
    format!(
        "{}{delimiter}{}",
        key.trim_end(),
        chars.as_str().trim_start()
    )
}
