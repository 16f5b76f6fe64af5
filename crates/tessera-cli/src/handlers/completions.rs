//! Shell completions command handler

use crate::cli::{Cli, CompletionsArgs};
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use clap::CommandFactory;

/// Handle the completions command
///
/// The script goes to the writer verbatim, whatever the output format.
pub fn handle_completions(args: CompletionsArgs, output: &mut OutputWriter) -> Result<()> {
    let script = completion_script(args)?;
    output.write(&script)
}

fn completion_script(args: CompletionsArgs) -> Result<String> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    let mut buffer = Vec::new();
    clap_complete::generate(args.shell.to_clap_shell(), &mut cmd, name, &mut buffer);
    String::from_utf8(buffer).map_err(|e| Error::other(format!("Completion script is not UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Shell;

    #[test]
    fn test_scripts_mention_every_subcommand() {
        for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
            let script = completion_script(CompletionsArgs { shell }).unwrap();
            assert!(script.contains("tessera"));
            assert!(script.contains("validate"));
            assert!(script.contains("completions"));
        }
    }
}
