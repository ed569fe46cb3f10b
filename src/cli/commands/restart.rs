//! `hbctl restart`: restart one element or every running service.

use crate::catalog::Catalog;
use crate::cli::{compose_executor, load_settings, output, Cli};
use crate::errors::Result;
use crate::executor::ProcessExecutor;
use crate::orchestrator::blank_env;

/// Compose arguments for `restart`.
pub fn args(project: &str, catalog: &Catalog, element: Option<&str>) -> Vec<String> {
    let mut args = vec!["-p".to_string(), project.to_string()];
    if let Some(el) = element {
        for file in catalog.compose_files(el) {
            args.extend(["-f".to_string(), file]);
        }
    }
    args.push("restart".into());
    args.extend(element.map(str::to_string));
    args
}

/// Execute the `restart` command.
pub fn execute(cli: &Cli, element: Option<&str>) -> Result<()> {
    let settings = load_settings(cli)?;
    let catalog = Catalog::herringbone();

    match element {
        Some(el) => output::info(&format!("Restarting element: {el}")),
        None => output::info("Restarting full Herringbone stack..."),
    }

    compose_executor(&settings).run(&blank_env(), &args(&settings.project, &catalog, element))?;
    output::success("Restarted.");
    Ok(())
}
