//! Validated settings for one invocation.
//!
//! There is no configuration file: everything comes from the command line.
//! [`Settings::from_cli`] rejects bad flag and argument combinations before
//! any file is touched.

use std::path::PathBuf;

use crate::cli::{Cli, ExistingArg, FormatArg, IniOption};
use crate::engine::{EditRequest, Existence, Mode};
use crate::error::{EditError, Result};
use crate::ini::DialectOptions;
use crate::output::Format;
use crate::storage::CommitStrategy;

/// Where the rendered document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Commit to this path (normally the config file).
    File(PathBuf),
    /// Write the whole document to stdout.
    Stdout,
}

/// Everything an invocation needs, validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// The INI file operated on.
    pub file: PathBuf,
    /// Operation and its arguments.
    pub request: EditRequest,
    /// Destination of the rendered document.
    pub output: OutputTarget,
    /// Output format for `--get`.
    pub format: Format,
    /// Commit strategy.
    pub commit: CommitStrategy,
    /// Write a change report to stderr.
    pub verbose: bool,
}

impl Settings {
    /// Validate parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::Usage`] describing the first invalid combination.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let mode = mode(cli)?;

        if cli.config_file.as_os_str() == "-" {
            return Err(usage("the config file cannot be '-'; stdin is reserved for --merge input"));
        }
        if cli.section.is_none() && matches!(mode, Mode::Set | Mode::Delete) {
            return Err(usage(&format!("a section is required with {mode}")));
        }
        if cli.param.is_some() && mode == Mode::Merge {
            return Err(usage("a param cannot be specified with --merge"));
        }
        if cli.value.is_some() && mode != Mode::Set && !(mode == Mode::Delete && cli.list) {
            return Err(usage(&format!("a value should not be specified with {mode}")));
        }
        if mode == Mode::Merge && cli.format == Some(FormatArg::Sh) {
            return Err(usage("sh format input is not supported at present"));
        }
        if let Some(section) = &cli.section
            && section.contains(['[', ']'])
        {
            return Err(usage(&format!(
                "section names should not contain '[' or ']': {section}"
            )));
        }
        if let Some(param) = &cli.param
            && param.starts_with('[')
        {
            return Err(usage(&format!("param names should not start with '[': {param}")));
        }

        let request = EditRequest {
            mode,
            section: cli.section.clone(),
            key: cli.param.clone(),
            value: cli.value.clone(),
            list: cli.list,
            list_separator: cli.list_sep.clone(),
            existing: cli.existing.map(|existing| match existing {
                ExistingArg::File => Existence::File,
                ExistingArg::Section => Existence::Section,
                ExistingArg::Param => Existence::Param,
            }),
            dialect: DialectOptions {
                nospace: cli.ini_options.contains(&IniOption::Nospace),
            },
        };

        let output = match &cli.output {
            Some(path) if path.as_os_str() == "-" => OutputTarget::Stdout,
            Some(path) => OutputTarget::File(path.clone()),
            None => OutputTarget::File(cli.config_file.clone()),
        };

        Ok(Self {
            file: cli.config_file.clone(),
            request,
            output,
            format: match cli.format {
                None => Format::Plain,
                Some(FormatArg::Ini) => Format::Ini,
                Some(FormatArg::Lines) => Format::Lines,
                Some(FormatArg::Sh) => Format::Sh,
            },
            commit: if cli.inplace {
                CommitStrategy::InPlace
            } else {
                CommitStrategy::Replace
            },
            verbose: cli.verbose,
        })
    }
}

fn mode(cli: &Cli) -> Result<Mode> {
    match (cli.set, cli.get, cli.del, cli.merge) {
        (true, false, false, false) => Ok(Mode::Set),
        (false, true, false, false) => Ok(Mode::Get),
        (false, false, true, false) => Ok(Mode::Delete),
        (false, false, false, true) => Ok(Mode::Merge),
        _ => Err(usage("exactly one of --set, --get, --del or --merge is required")),
    }
}

fn usage(message: &str) -> EditError {
    EditError::Usage(message.to_string())
}
