//! `hbctl status`: show the containers of the compose project.
//!
//! Reads `docker compose ps --format json`, which prints one JSON object per
//! line on current Compose releases and a single JSON array on older ones.

use serde::{Deserialize, Deserializer, Serialize};

use crate::catalog::Catalog;
use crate::cli::{compose_executor, load_settings, output, Cli};
use crate::errors::{HbctlError, Result};
use crate::executor::ProcessExecutor;
use crate::orchestrator::blank_env;

/// A published port as reported by compose.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Publisher {
    #[serde(rename = "URL")]
    pub url: String,
    pub target_port: u16,
    pub published_port: u16,
    pub protocol: String,
}

impl Publisher {
    /// `host:published->target/proto`, or `None` when nothing is published.
    fn binding(&self) -> Option<String> {
        if self.published_port == 0 {
            return None;
        }
        let host = if self.url.is_empty() { "0.0.0.0" } else { &self.url };
        Some(format!(
            "{host}:{}->{}/{}",
            self.published_port,
            self.target_port,
            self.protocol.to_lowercase()
        ))
    }
}

/// One row of `docker compose ps`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerStatus {
    pub name: String,
    pub service: String,
    pub state: String,
    pub status: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub publishers: Vec<Publisher>,
}

/// Compose writes `"Publishers": null` for containers without ports.
fn null_as_empty<'de, D>(de: D) -> std::result::Result<Vec<Publisher>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Publisher>>::deserialize(de)?.unwrap_or_default())
}

impl ContainerStatus {
    /// Published ports joined with `, `, or `-` when there are none.
    pub fn ports(&self) -> String {
        let mut bindings: Vec<String> = Vec::new();
        for binding in self.publishers.iter().filter_map(Publisher::binding) {
            if !bindings.contains(&binding) {
                bindings.push(binding);
            }
        }
        if bindings.is_empty() {
            "-".into()
        } else {
            bindings.join(", ")
        }
    }
}

/// Compose arguments for `status`.
pub fn args(project: &str) -> Vec<String> {
    ["-p", project, "ps", "--format", "json"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Parse `docker compose ps --format json` output.
///
/// Lines that do not parse are skipped and described in the second element.
pub fn parse_ps(stdout: &str) -> (Vec<ContainerStatus>, Vec<String>) {
    let trimmed = stdout.trim();
    if trimmed.starts_with('[') {
        return match serde_json::from_str(trimmed) {
            Ok(rows) => (rows, Vec::new()),
            Err(e) => (Vec::new(), vec![format!("cannot parse compose output: {e}")]),
        };
    }

    let mut rows = Vec::new();
    let mut problems = Vec::new();
    for (idx, line) in trimmed.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<ContainerStatus>(line) {
            Ok(row) => rows.push(row),
            Err(e) => problems.push(format!("cannot parse compose output line {}: {e}", idx + 1)),
        }
    }
    (rows, problems)
}

/// Rows whose service belongs to `unit`. The database backs every unit, so
/// it is always kept.
pub fn filter_unit<'a>(
    catalog: &Catalog,
    rows: &'a [ContainerStatus],
    unit: Option<&str>,
) -> Result<Vec<&'a ContainerStatus>> {
    let Some(unit) = unit else {
        return Ok(rows.iter().collect());
    };
    let members = catalog
        .unit(unit)
        .ok_or_else(|| HbctlError::UnknownUnit(unit.to_string()))?;

    Ok(rows
        .iter()
        .filter(|r| r.service == catalog.database_service || members.contains(&r.service))
        .collect())
}

/// Execute the `status` command.
pub fn execute(cli: &Cli, unit: Option<&str>, json: bool) -> Result<()> {
    let settings = load_settings(cli)?;
    let catalog = Catalog::herringbone();

    // Fail on a bad unit before shelling out.
    if let Some(u) = unit {
        catalog
            .unit(u)
            .ok_or_else(|| HbctlError::UnknownUnit(u.to_string()))?;
    }

    let stdout = compose_executor(&settings).capture(&blank_env(), &args(&settings.project))?;
    let (rows, problems) = parse_ps(&stdout);
    for problem in &problems {
        tracing::warn!(%problem, "skipping compose ps row");
        output::warning(problem);
    }

    let rows = filter_unit(&catalog, &rows, unit)?;

    if json {
        let out = serde_json::to_string_pretty(&rows)
            .map_err(|e| HbctlError::SerializationError(e.to_string()))?;
        println!("{out}");
    } else {
        output::print_status_table(&rows);
    }

    Ok(())
}
