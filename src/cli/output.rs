//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::catalog::Element;
use crate::cli::commands::status::ContainerStatus;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print elements as a table (Name, Unit, Description).
pub fn print_elements_table(elements: &[&Element]) {
    if elements.is_empty() {
        info("No elements match.");
        tip("Run `hbctl elements` without --filter to see everything.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Unit", "Description"]);

    for e in elements {
        table.add_row(vec![e.name.clone(), e.unit.clone(), e.description.clone()]);
    }

    println!("{table}");
}

/// Print containers as a table (Name, Service, State, Ports).
pub fn print_status_table(rows: &[&ContainerStatus]) {
    if rows.is_empty() {
        info("No containers found.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Service", "State", "Ports"]);

    for c in rows {
        table.add_row(vec![c.name.clone(), c.service.clone(), c.state.clone(), c.ports()]);
    }

    println!("{table}");
}
