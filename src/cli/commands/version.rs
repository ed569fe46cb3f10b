//! `hbctl version`: display version information.

use console::style;

use crate::errors::Result;

/// Execute the `version` command.
pub fn execute() -> Result<()> {
    println!(
        "hbctl {}",
        style(env!("CARGO_PKG_VERSION")).green().bold()
    );
    Ok(())
}
