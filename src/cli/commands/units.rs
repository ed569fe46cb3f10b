//! `hbctl units`: list units and their elements.

use console::style;

use crate::catalog::Catalog;
use crate::errors::Result;

/// Execute the `units` command.
pub fn execute() -> Result<()> {
    let catalog = Catalog::herringbone();
    for (unit, elements) in &catalog.units {
        println!("{}  {}", style(unit).bold(), style(elements.join(", ")).dim());
    }
    Ok(())
}
