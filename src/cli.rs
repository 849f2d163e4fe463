//! Command-line surface, parsed with clap.

use std::path::PathBuf;

use clap::{ArgGroup, Parser, ValueEnum};

/// Version reported by `--version`.
pub const VERSION: &str = match option_env!("INIEDIT_VERSION") {
    Some(version) => version,
    None => env!("CARGO_PKG_VERSION"),
};

/// Command-line interface of the INI editor.
#[derive(Parser, Debug)]
#[command(
    name = "iniedit",
    about = "A utility for manipulating ini files",
    version = VERSION,
    after_help = "SECTION can be empty ('') or 'DEFAULT', in which case parameters \
                  not in a section (global parameters) are operated on. If 'DEFAULT' \
                  is used with --set, an explicit [DEFAULT] section is added.",
    group(ArgGroup::new("mode").required(true).args(["set", "get", "del", "merge"]))
)]
pub struct Cli {
    /// Add or update a section or parameter
    #[arg(long)]
    pub set: bool,

    /// Print sections, parameters or a value
    #[arg(long)]
    pub get: bool,

    /// Delete a section, parameter or list item
    #[arg(long)]
    pub del: bool,

    /// Merge ini content read from stdin
    #[arg(long)]
    pub merge: bool,

    /// Fail if the file, section or param is missing (default: param)
    #[arg(
        long,
        value_name = "WHAT",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "param"
    )]
    pub existing: Option<ExistingArg>,

    /// Output format for --get
    #[arg(long, value_name = "FMT")]
    pub format: Option<FormatArg>,

    /// Dialect options for reading and writing
    #[arg(long = "ini-options", value_name = "OPT", value_delimiter = ',')]
    pub ini_options: Vec<IniOption>,

    /// Rewrite the file in place instead of replacing it atomically
    #[arg(long)]
    pub inplace: bool,

    /// Treat the value as an item of a list
    #[arg(long)]
    pub list: bool,

    /// List separator ("" means any whitespace; default ", ")
    #[arg(long = "list-sep", value_name = "STR", allow_hyphen_values = true)]
    pub list_sep: Option<String>,

    /// Write the result to FILE instead ("-" for stdout)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Report on stderr whether the file changed
    #[arg(short, long)]
    pub verbose: bool,

    /// INI file to operate on
    pub config_file: PathBuf,

    /// Section name ("" or DEFAULT for global parameters)
    pub section: Option<String>,

    /// Parameter name
    pub param: Option<String>,

    /// Value to set, or list item to add or remove
    #[arg(allow_hyphen_values = true)]
    pub value: Option<String>,
}

/// Values accepted by `--existing`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExistingArg {
    /// The file must exist
    File,
    /// The file and section must exist
    Section,
    /// The file, section and param must exist
    Param,
}

/// Values accepted by `--format`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    /// `name=value` shell assignments
    Sh,
    /// INI text
    Ini,
    /// `[ section ] name = value` lines
    Lines,
}

/// Values accepted by `--ini-options`.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IniOption {
    /// Write `name=value` without spaces around the delimiter
    Nospace,
}
