//! `hbctl elements`: list the elements hbctl can start.

use crate::catalog::Catalog;
use crate::cli::output;
use crate::errors::{HbctlError, Result};

/// Execute the `elements` command.
pub fn execute(json: bool, filter: Option<&str>) -> Result<()> {
    let catalog = Catalog::herringbone();
    let elements = catalog.filter_elements(filter.unwrap_or_default());

    if json {
        let out = serde_json::to_string_pretty(&elements)
            .map_err(|e| HbctlError::SerializationError(e.to_string()))?;
        println!("{out}");
    } else {
        output::print_elements_table(&elements);
    }

    Ok(())
}
