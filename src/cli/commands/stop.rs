//! `hbctl stop`: stop one element or take the whole stack down.

use crate::catalog::Catalog;
use crate::cli::{compose_executor, load_settings, output, Cli};
use crate::errors::Result;
use crate::executor::ProcessExecutor;
use crate::orchestrator::blank_env;

/// Compose arguments for `stop`.
pub fn args(project: &str, catalog: &Catalog, element: Option<&str>) -> Vec<String> {
    let mut args = vec!["-p".to_string(), project.to_string()];
    match element {
        Some(el) => {
            for file in catalog.compose_files(el) {
                args.extend(["-f".to_string(), file]);
            }
            args.extend(["stop".to_string(), el.to_string()]);
        }
        None => args.push("down".into()),
    }
    args
}

/// Execute the `stop` command.
pub fn execute(cli: &Cli, element: Option<&str>) -> Result<()> {
    let settings = load_settings(cli)?;
    let catalog = Catalog::herringbone();

    match element {
        Some(el) => output::info(&format!("Stopping element: {el}")),
        None => output::info("Stopping full Herringbone stack..."),
    }

    compose_executor(&settings).run(&blank_env(), &args(&settings.project, &catalog, element))?;
    output::success("Stopped.");
    Ok(())
}
