//! `hbctl completions`: generate shell completion scripts.
//!
//! Usage:
//!   hbctl completions bash > ~/.local/share/bash-completion/completions/hbctl
//!   hbctl completions zsh > "${fpath[1]}/_hbctl"

use std::io::{self, Write};

use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::Cli;
use crate::errors::Result;

/// Write the completion script for `shell` to `out`.
pub fn write_script(shell: Shell, out: &mut dyn Write) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "hbctl", out);
}

/// Execute the `completions` command.
pub fn execute(shell: Shell) -> Result<()> {
    write_script(shell, &mut io::stdout());
    Ok(())
}
