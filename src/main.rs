//! `iniedit` binary: parse arguments, run one invocation, map the outcome
//! to an exit status.

use std::io::{self, BufWriter, Write as _};
use std::process::ExitCode;

use clap::Parser;

use iniedit_cli::commands::{self, Streams};
use iniedit_cli::config::Settings;
use iniedit_cli::error::EditError;
use iniedit_cli::{cli, interrupt, logging};

fn main() -> ExitCode {
    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    logging::init_subscriber(args.verbose);

    if let Err(e) = interrupt::install_handler() {
        tracing::debug!("interrupt handler unavailable: {e}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_broken_pipe(&e) => ExitCode::SUCCESS,
        Err(e) => {
            writeln!(io::stderr(), "{e}").ok();
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli::Cli) -> anyhow::Result<()> {
    let settings = Settings::from_cli(args)?;

    let mut stdin = io::stdin().lock();
    let mut stdout = BufWriter::new(io::stdout().lock());
    let mut stderr = io::stderr();
    commands::run(
        &settings,
        &mut Streams {
            stdin: &mut stdin,
            stdout: &mut stdout,
            stderr: &mut stderr,
        },
    )?;
    stdout.flush().map_err(EditError::from)?;
    Ok(())
}

fn is_broken_pipe(e: &anyhow::Error) -> bool {
    e.downcast_ref::<EditError>()
        .is_some_and(EditError::is_broken_pipe)
}
