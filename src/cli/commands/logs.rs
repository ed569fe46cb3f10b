//! `hbctl logs`: show container logs for a unit or named elements.

use crate::catalog::Catalog;
use crate::cli::{compose_executor, load_settings, output, Cli};
use crate::errors::{HbctlError, Result};
use crate::executor::ProcessExecutor;
use crate::orchestrator::blank_env;

/// Compose arguments for `logs` over `elements`.
pub fn args(
    project: &str,
    catalog: &Catalog,
    elements: &[String],
    follow: bool,
    tail: usize,
) -> Vec<String> {
    let mut args = vec!["-p".to_string(), project.to_string()];

    let mut files: Vec<String> = Vec::new();
    for el in elements {
        for file in catalog.compose_files(el) {
            if !files.contains(&file) {
                files.push(file);
            }
        }
    }
    for file in files {
        args.extend(["-f".to_string(), file]);
    }

    args.push("logs".into());
    if follow {
        args.push("-f".into());
    }
    if tail > 0 {
        args.extend(["--tail".to_string(), tail.to_string()]);
    }
    args.extend(elements.iter().cloned());
    args
}

/// Execute the `logs` command.
pub fn execute(
    cli: &Cli,
    unit: Option<&str>,
    elements: &[String],
    follow: bool,
    tail: usize,
) -> Result<()> {
    let settings = load_settings(cli)?;
    let catalog = Catalog::herringbone();

    let elements: Vec<String> = match unit {
        Some(u) => {
            let els = catalog
                .unit(u)
                .ok_or_else(|| HbctlError::UnknownUnit(u.to_string()))?;
            output::info(&format!("Showing logs for unit: {u}"));
            els.to_vec()
        }
        None if !elements.is_empty() => elements.to_vec(),
        None => {
            return Err(HbctlError::CommandFailed(
                "specify --unit or one or more element names".into(),
            ))
        }
    };

    compose_executor(&settings).run(
        &blank_env(),
        &args(&settings.project, &catalog, &elements, follow, tail),
    )
}
