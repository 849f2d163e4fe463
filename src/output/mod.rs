//! Text renderers for `--get` results.
//!
//! Each `--format` has a [`Renderer`]; [`renderer`] picks one. Renderers
//! write to any [`Write`] so that tests can capture output in memory.

pub mod sh;

use std::io::Write;

use crate::engine::{Item, QueryResult, SectionListing};
use crate::error::{EditError, Result};

/// Output format of `--get`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Bare names and values.
    #[default]
    Plain,
    /// `[section]` headers and `key = value` lines.
    Ini,
    /// One `[ section ] key = value` line per item.
    Lines,
    /// `key=value` shell assignments.
    Sh,
}

impl Format {
    /// Whether a query without a section should list every key of every
    /// section instead of only section names.
    #[must_use]
    pub const fn expands_sections(self) -> bool {
        matches!(self, Self::Lines)
    }
}

/// Writes a [`QueryResult`] in one output format.
pub trait Renderer {
    /// Render `result` to `out`.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Output`] on write failure and, for sh output,
    /// [`EditError::InvalidIdentifier`] before anything is written.
    fn render(&self, result: &QueryResult, out: &mut dyn Write) -> Result<()>;
}

/// Renderer for `format`.
#[must_use]
pub fn renderer(format: Format) -> &'static dyn Renderer {
    match format {
        Format::Plain => &Plain,
        Format::Ini => &Ini,
        Format::Lines => &Lines,
        Format::Sh => &Sh,
    }
}

/// Names, or the bare value of a single key.
#[derive(Debug)]
pub struct Plain;

impl Renderer for Plain {
    fn render(&self, result: &QueryResult, out: &mut dyn Write) -> Result<()> {
        match result {
            QueryResult::SectionNames(names) => {
                for name in names {
                    writeln!(out, "{name}")?;
                }
            }
            QueryResult::Everything(listings) => {
                for listing in listings {
                    writeln!(out, "{}", listing.name)?;
                }
            }
            QueryResult::Section(listing) => {
                for item in &listing.items {
                    writeln!(out, "{}", item.key)?;
                }
            }
            QueryResult::Value { item, .. } => writeln!(out, "{}", item.value.text())?,
        }
        Ok(())
    }
}

/// INI text that can be fed back to `--merge`.
#[derive(Debug)]
pub struct Ini;

impl Ini {
    fn item(out: &mut dyn Write, item: &Item) -> Result<()> {
        let value = item.value.text();
        if value.is_empty() {
            writeln!(out, "{} =", item.key)?;
        } else {
            writeln!(out, "{} = {}", item.key, value.replace('\n', "\n "))?;
        }
        Ok(())
    }

    fn listing(out: &mut dyn Write, listing: &SectionListing) -> Result<()> {
        writeln!(out, "[{}]", listing.name)?;
        for item in &listing.items {
            Self::item(out, item)?;
        }
        Ok(())
    }
}

impl Renderer for Ini {
    fn render(&self, result: &QueryResult, out: &mut dyn Write) -> Result<()> {
        match result {
            QueryResult::SectionNames(names) => {
                for name in names {
                    writeln!(out, "[{name}]")?;
                }
            }
            QueryResult::Everything(listings) => {
                for listing in listings {
                    Self::listing(out, listing)?;
                }
            }
            QueryResult::Section(listing) => Self::listing(out, listing)?,
            QueryResult::Value { item, .. } => Self::item(out, item)?,
        }
        Ok(())
    }
}

/// One line per item, easy to split in shell pipelines.
#[derive(Debug)]
pub struct Lines;

impl Lines {
    fn line(out: &mut dyn Write, section: &str, item: Option<&Item>) -> Result<()> {
        let mut line = format!("[ {section} ]");
        if let Some(item) = item {
            line.push(' ');
            line.push_str(&item.key);
            let value = item.value.text();
            if !value.is_empty() {
                line.push_str(" = ");
                line.push_str(&value.replace('\n', "\\n"));
            }
        }
        writeln!(out, "{line}")?;
        Ok(())
    }

    fn listing(out: &mut dyn Write, listing: &SectionListing) -> Result<()> {
        if listing.items.is_empty() {
            return Self::line(out, &listing.name, None);
        }
        for item in &listing.items {
            Self::line(out, &listing.name, Some(item))?;
        }
        Ok(())
    }
}

impl Renderer for Lines {
    fn render(&self, result: &QueryResult, out: &mut dyn Write) -> Result<()> {
        match result {
            QueryResult::SectionNames(names) => {
                for name in names {
                    Self::line(out, name, None)?;
                }
            }
            QueryResult::Everything(listings) => {
                for listing in listings {
                    Self::listing(out, listing)?;
                }
            }
            QueryResult::Section(listing) => Self::listing(out, listing)?,
            QueryResult::Value { section, item } => Self::line(out, section, Some(item))?,
        }
        Ok(())
    }
}

/// Shell assignments for `eval`.
#[derive(Debug)]
pub struct Sh;

impl Sh {
    fn assignments<'a>(out: &mut dyn Write, items: impl Iterator<Item = &'a Item> + Clone) -> Result<()> {
        if let Some(bad) = items.clone().find(|item| !sh::is_identifier(&item.key)) {
            return Err(EditError::InvalidIdentifier(bad.key.clone()));
        }
        for item in items {
            writeln!(out, "{}={}", item.key, sh::quote(item.value.text()))?;
        }
        Ok(())
    }
}

impl Renderer for Sh {
    fn render(&self, result: &QueryResult, out: &mut dyn Write) -> Result<()> {
        match result {
            QueryResult::SectionNames(names) => {
                for name in names {
                    writeln!(out, "{name}")?;
                }
                Ok(())
            }
            QueryResult::Everything(listings) => {
                Self::assignments(out, listings.iter().flat_map(|listing| listing.items.iter()))
            }
            QueryResult::Section(listing) => Self::assignments(out, listing.items.iter()),
            QueryResult::Value { item, .. } => Self::assignments(out, std::iter::once(item)),
        }
    }
}
