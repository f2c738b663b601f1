use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

const BIN_NAME: &str = "tunelog";

impl From<CompletionShell> for Shell {
    fn from(shell: CompletionShell) -> Self {
        match shell {
            CompletionShell::Bash => Self::Bash,
            CompletionShell::Zsh => Self::Zsh,
            CompletionShell::Fish => Self::Fish,
        }
    }
}

pub fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    match output_path {
        Some(path) => {
            let mut file = File::create(path)?;
            write_completions(shell, &mut file);
            file.flush()?;
            println!("{}", path.display());
        }
        None => write_completions(shell, &mut io::stdout().lock()),
    }
    Ok(())
}

fn write_completions(shell: CompletionShell, out: &mut dyn Write) {
    generate(Shell::from(shell), &mut Cli::command(), BIN_NAME, out);
}
