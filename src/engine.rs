//! Executes one [`EditRequest`] against a parsed [`Document`].
//!
//! All state for a run lives in [`RunContext`]: the request, the document
//! being edited and, for `--merge`, the source document read from stdin.
//! Nothing here touches the filesystem, so the engine can be exercised with
//! documents parsed from strings.

use std::fmt;

use crate::error::{EditError, Result};
use crate::ini::{
    DEFAULT_SECTION, DialectOptions, Document, ListEdit, RenderConfig, ValueSlot, edit_list,
};

/// Operation selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Add or update a section or key.
    Set,
    /// Read sections, keys or a value.
    Get,
    /// Remove a section, key or list item.
    Delete,
    /// Merge another document into this one.
    Merge,
}

impl Mode {
    /// Whether the mode writes to the document.
    #[must_use]
    pub const fn is_mutating(self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Set => "--set",
            Self::Get => "--get",
            Self::Delete => "--del",
            Self::Merge => "--merge",
        })
    }
}

/// Which missing items are errors rather than created or ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    /// The file must exist.
    File,
    /// The file and section must exist.
    Section,
    /// The file, section and key must exist.
    Param,
}

/// One invocation's request, validated and normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditRequest {
    /// Operation to run.
    pub mode: Mode,
    /// Target section as given; `""` and `DEFAULT` both mean DEFAULT.
    pub section: Option<String>,
    /// Target key.
    pub key: Option<String>,
    /// Value to assign, or list item to add/remove.
    pub value: Option<String>,
    /// Treat the value as a list item.
    pub list: bool,
    /// List separator; `None` for the comma default, `""` for whitespace.
    pub list_separator: Option<String>,
    /// Existence policy; `None` creates what is missing.
    pub existing: Option<Existence>,
    /// Dialect switches.
    pub dialect: DialectOptions,
}

impl EditRequest {
    /// A request for `mode` with every option at its default.
    #[must_use]
    pub const fn new(mode: Mode) -> Self {
        Self {
            mode,
            section: None,
            key: None,
            value: None,
            list: false,
            list_separator: None,
            existing: None,
            dialect: DialectOptions { nospace: false },
        }
    }

    /// The section to operate on, with `""` mapped to DEFAULT.
    #[must_use]
    pub fn section_name(&self) -> Option<&str> {
        self.section.as_deref().map(|section| {
            if section.is_empty() {
                DEFAULT_SECTION
            } else {
                section
            }
        })
    }

    /// Whether DEFAULT was spelled out rather than given as `""`.
    #[must_use]
    pub fn names_default_explicitly(&self) -> bool {
        self.section.as_deref() == Some(DEFAULT_SECTION)
    }

    /// Whether missing sections (and possibly keys) are errors.
    #[must_use]
    pub const fn requires_section(&self) -> bool {
        matches!(self.existing, Some(Existence::Section | Existence::Param))
    }

    /// Whether the target file may be created when absent.
    #[must_use]
    pub const fn may_create_file(&self) -> bool {
        self.existing.is_none()
    }

    const fn list_edit(&self) -> ListEdit {
        match self.mode {
            Mode::Delete => ListEdit::Remove,
            _ => ListEdit::Insert,
        }
    }
}

/// A key and its value as returned by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Key name as stored, or as requested for single-value queries.
    pub key: String,
    /// Value; flag keys are [`ValueSlot::NoDelimiter`].
    pub value: ValueSlot,
}

/// Keys of one section as returned by a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionListing {
    /// Section name.
    pub name: String,
    /// Visible keys, with values inherited from DEFAULT left out.
    pub items: Vec<Item>,
}

/// Result of a `--get`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    /// Section names, DEFAULT first when it has keys.
    SectionNames(Vec<String>),
    /// The keys of one section.
    Section(SectionListing),
    /// Every section with its keys.
    Everything(Vec<SectionListing>),
    /// A single value.
    Value {
        /// Section queried.
        section: String,
        /// Key and value.
        item: Item,
    },
}

/// Everything one invocation works on.
#[derive(Debug)]
pub struct RunContext {
    /// The request being executed.
    pub request: EditRequest,
    /// The document being edited or queried.
    pub doc: Document,
    merge_source: Option<Document>,
    merge_declares_default: bool,
}

impl RunContext {
    /// Prepare to run `request` against `doc`.
    #[must_use]
    pub const fn new(request: EditRequest, doc: Document) -> Self {
        Self {
            request,
            doc,
            merge_source: None,
            merge_declares_default: false,
        }
    }

    /// Attach the document merged by [`Mode::Merge`].
    #[must_use]
    pub fn with_merge_source(mut self, source: Document) -> Self {
        self.merge_declares_default =
            !source.meta().injected_default && !source.defaults().is_empty();
        self.merge_source = Some(source);
        self
    }

    /// Serializer settings for the result of this run.
    ///
    /// The synthetic DEFAULT header is written when DEFAULT was named
    /// explicitly for a set or merge, or when a merge source declared its
    /// own `[DEFAULT]` keys and no existence policy applies.
    #[must_use]
    pub fn render_config(&self) -> RenderConfig {
        let explicit = self.request.names_default_explicitly()
            && matches!(self.request.mode, Mode::Set | Mode::Merge);
        let from_merge = self.request.mode == Mode::Merge
            && !self.request.requires_section()
            && self.merge_declares_default;
        RenderConfig {
            delimiter_spacing: !self.request.dialect.nospace,
            show_synthetic_default: explicit || from_merge,
        }
    }

    /// Apply the request's mutation to the document.
    ///
    /// [`Mode::Get`] leaves the document alone.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::MissingSection`] or [`EditError::MissingParam`]
    /// when the existence policy requires something that is absent.
    pub fn apply(&mut self) -> Result<()> {
        match self.request.mode {
            Mode::Get => Ok(()),
            Mode::Set => {
                let section = self.target_section()?;
                let key = self.request.key.clone();
                let value = self.request.value.as_deref().map(ValueSlot::from);
                self.set_name_value(&section, key.as_deref(), value)
            }
            Mode::Delete => self.delete(),
            Mode::Merge => self.merge(),
        }
    }

    fn target_section(&self) -> Result<String> {
        self.request
            .section_name()
            .map(str::to_string)
            .ok_or_else(|| EditError::Usage(format!("a section is required with {}", self.request.mode)))
    }

    fn set_name_value(
        &mut self,
        section: &str,
        key: Option<&str>,
        value: Option<ValueSlot>,
    ) -> Result<()> {
        let strict = self.request.requires_section();
        let mut current: Option<ValueSlot> = None;

        if strict {
            match key {
                None if !self.doc.has_section(section) => {
                    return Err(EditError::MissingSection(section.to_string()));
                }
                None => {}
                Some(key) => match self.doc.get(section, key) {
                    Ok(value) => current = Some(value.clone()),
                    Err(EditError::MissingParam(_))
                        if self.request.existing == Some(Existence::Section) => {}
                    Err(e) => return Err(e),
                },
            }
        } else if !self.doc.has_section(section) {
            if self.request.mode == Mode::Delete {
                return Ok(());
            }
            self.doc.add_section(section);
        }

        let Some(key) = key else {
            return Ok(());
        };
        if !strict {
            match self.doc.get(section, key) {
                Ok(value) => current = Some(value.clone()),
                Err(EditError::MissingParam(_)) => {}
                Err(e) => return Err(e),
            }
        }
        if self.request.mode == Mode::Delete && current.is_none() {
            return Ok(());
        }

        // A bare key keeps the shape of the line it replaces; only new keys
        // follow the file's dialect.
        let value = value.unwrap_or_else(|| match &current {
            Some(ValueSlot::NoDelimiter) => ValueSlot::NoDelimiter,
            Some(ValueSlot::Present(_)) => ValueSlot::Present(String::new()),
            None if self.doc.has_valueless_keys() => ValueSlot::NoDelimiter,
            None => ValueSlot::Present(String::new()),
        });
        let value = if self.request.list {
            ValueSlot::Present(edit_list(
                current.as_ref().map_or("", ValueSlot::text),
                self.request.list_separator.as_deref(),
                self.request.list_edit(),
                value.text(),
            ))
        } else {
            value
        };
        self.doc.set(section, key, value)
    }

    fn delete(&mut self) -> Result<()> {
        let section = self.target_section()?;
        let strict = self.request.requires_section();
        match (self.request.key.clone(), self.request.value.clone()) {
            (None, _) if section == DEFAULT_SECTION => {
                self.doc.clear_default();
                Ok(())
            }
            (None, _) => {
                if !self.doc.remove_section(&section) && strict {
                    return Err(EditError::MissingSection(section));
                }
                Ok(())
            }
            (Some(key), None) => match self.doc.remove_key(&section, &key) {
                Ok(false) if self.request.existing == Some(Existence::Param) => {
                    Err(EditError::MissingParam(key))
                }
                Ok(_) => Ok(()),
                Err(EditError::MissingSection(_)) if !strict => Ok(()),
                Err(e) => Err(e),
            },
            (Some(key), Some(item)) => {
                self.set_name_value(&section, Some(&key), Some(ValueSlot::Present(item)))
            }
        }
    }

    fn merge(&mut self) -> Result<()> {
        let Some(source) = self.merge_source.take() else {
            return Ok(());
        };
        let explicit_target = self.request.section_name().map(str::to_string);
        let strict = self.request.requires_section();

        let mut names = vec![DEFAULT_SECTION.to_string()];
        names.extend(source.sections().into_iter().map(str::to_string));

        for name in names {
            let items: Vec<(String, ValueSlot)> = source
                .distinct_items(&name)
                .unwrap_or_default()
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.clone()))
                .collect();
            let target = explicit_target.clone().unwrap_or_else(|| name.clone());

            for (key, value) in &items {
                match self.set_name_value(&target, Some(key), Some(value.clone())) {
                    Err(EditError::MissingParam(_)) => {}
                    Err(EditError::MissingSection(_)) if explicit_target.is_none() && !strict => {}
                    other => other?,
                }
            }
            if items.is_empty() && explicit_target.is_none() {
                self.set_name_value(&name, None, None)?;
            }
        }
        Ok(())
    }

    /// Answer a `--get` request.
    ///
    /// With `expand_sections` and no section given, every section is listed
    /// with its keys rather than by name only.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::MissingSection`] or [`EditError::MissingParam`]
    /// when the queried section or key does not exist.
    pub fn query(&self, expand_sections: bool) -> Result<QueryResult> {
        let Some(section) = self.request.section_name() else {
            let mut names: Vec<String> = Vec::new();
            if !self.doc.defaults().is_empty() {
                names.push(DEFAULT_SECTION.to_string());
            }
            names.extend(self.doc.sections().into_iter().map(str::to_string));
            if !expand_sections {
                return Ok(QueryResult::SectionNames(names));
            }
            return names
                .iter()
                .map(|name| self.listing(name))
                .collect::<Result<Vec<_>>>()
                .map(QueryResult::Everything);
        };

        match &self.request.key {
            None => self.listing(section).map(QueryResult::Section),
            Some(key) => {
                let value = self.doc.get(section, key)?.clone();
                Ok(QueryResult::Value {
                    section: section.to_string(),
                    item: Item {
                        key: key.clone(),
                        value,
                    },
                })
            }
        }
    }

    fn listing(&self, section: &str) -> Result<SectionListing> {
        let items = self
            .doc
            .distinct_items(section)
            .ok_or_else(|| EditError::MissingSection(section.to_string()))?
            .into_iter()
            .map(|(key, value)| Item {
                key: key.to_string(),
                value: value.clone(),
            })
            .collect();
        Ok(SectionListing {
            name: section.to_string(),
            items,
        })
    }
}
