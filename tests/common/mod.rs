// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed INI file and a runner that drives a
// full invocation in-process, capturing stdout and stderr, so each test can
// assert on both the printed output and the bytes left on disk.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use clap::Parser as _;
use iniedit_cli::cli::Cli;
use iniedit_cli::commands::{self, Streams};
use iniedit_cli::config::Settings;
use iniedit_cli::error::EditError;

/// What one invocation produced.
pub struct Outcome {
    /// Result of argument validation and the command itself.
    pub result: anyhow::Result<()>,
    /// Everything written to stdout.
    pub stdout: String,
    /// Everything written to stderr.
    pub stderr: String,
}

impl Outcome {
    /// Assert success and return stdout.
    pub fn ok(self) -> String {
        if let Err(e) = &self.result {
            panic!("invocation failed: {e}");
        }
        self.stdout
    }

    /// Assert failure and return the error.
    pub fn err(self) -> anyhow::Error {
        match self.result {
            Ok(()) => panic!("invocation succeeded; stdout: {:?}", self.stdout),
            Err(e) => e,
        }
    }
}

/// An INI file inside an isolated [`tempfile::TempDir`].
///
/// The directory is automatically deleted when dropped.
pub struct IniFixture {
    /// Temporary directory holding the file.
    pub dir: tempfile::TempDir,
    /// Path of the INI file.
    pub path: PathBuf,
}

impl IniFixture {
    /// Create a fixture whose file holds `content`.
    pub fn new(content: &str) -> Self {
        let fixture = Self::missing();
        std::fs::write(&fixture.path, content).expect("write ini file");
        fixture
    }

    /// Create a fixture whose file does not exist yet.
    pub fn missing() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("app.ini");
        Self { dir, path }
    }

    /// Current contents of the file.
    pub fn contents(&self) -> String {
        std::fs::read_to_string(&self.path).expect("read ini file")
    }

    /// Whether the file exists.
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Path of another file in the fixture directory.
    pub fn sibling(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Run `iniedit <flags> <file> <positionals>` with empty stdin.
    pub fn run(&self, flags: &[&str], positionals: &[&str]) -> Outcome {
        self.run_with_stdin(flags, positionals, "")
    }

    /// Run `iniedit <flags> <file> <positionals>` feeding `stdin`.
    pub fn run_with_stdin(&self, flags: &[&str], positionals: &[&str], stdin: &str) -> Outcome {
        invoke(&self.path, flags, positionals, stdin)
    }
}

/// Parse the arguments and run one invocation against `path`.
pub fn invoke(path: &Path, flags: &[&str], positionals: &[&str], stdin: &str) -> Outcome {
    let mut argv: Vec<String> = vec!["iniedit".to_string()];
    argv.extend(flags.iter().map(ToString::to_string));
    argv.push(path.display().to_string());
    argv.extend(positionals.iter().map(ToString::to_string));

    let cli = Cli::try_parse_from(argv).expect("arguments parse");
    let mut input = stdin.as_bytes();
    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let result = Settings::from_cli(&cli).map_err(anyhow::Error::from).and_then(|settings| {
        commands::run(
            &settings,
            &mut Streams {
                stdin: &mut input,
                stdout: &mut stdout,
                stderr: &mut stderr,
            },
        )
    });

    Outcome {
        result,
        stdout: String::from_utf8(stdout).expect("utf-8 stdout"),
        stderr: String::from_utf8(stderr).expect("utf-8 stderr"),
    }
}

/// The [`EditError`] behind an invocation failure.
pub fn edit_error(e: &anyhow::Error) -> &EditError {
    e.downcast_ref::<EditError>().expect("an EditError")
}
