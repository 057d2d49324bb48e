//! `repo-fleet completions <shell>` prints a tab-completion script on stdout.
//!
//! ```bash
//! repo-fleet completions bash > ~/.local/share/bash-completion/completions/repo-fleet
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::{generate, Shell};
use std::io::{self, Write};
use std::process::ExitCode;

use crate::cli::Cli;

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to write the script for
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn execute(args: CompletionsArgs) -> Result<ExitCode> {
    write_script(args.shell, &mut io::stdout())?;
    Ok(ExitCode::SUCCESS)
}

/// Write the completion script for `shell`, covering every subcommand.
fn write_script(shell: Shell, out: &mut dyn Write) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, out);
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn script(shell: Shell) -> String {
        let mut buf = Vec::new();
        write_script(shell, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_bash_script_registers_binary() {
        let text = script(Shell::Bash);
        assert!(text.contains("complete -F"));
        assert!(text.contains("repo-fleet"));
        for sub in ["pull", "push", "switch", "stash"] {
            assert!(text.contains(sub), "missing {}", sub);
        }
    }

    #[test]
    fn test_fish_script_mentions_cleanup() {
        assert!(script(Shell::Fish).contains("cleanup"));
    }
}
