//! completions command - Generate shell completion scripts

use clap::{Args, Command};
use clap_complete::Shell;

use crate::exit_code::ExitCode;

/// Generate a shell completion script
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Write the completion script for `cmd` to stdout
pub fn execute(args: CompletionsArgs, cmd: &mut Command) -> ExitCode {
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, cmd, name, &mut std::io::stdout());
    ExitCode::Success
}
