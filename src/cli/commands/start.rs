//! `hbctl start`: bring up the stack, a unit, or one element.

use crate::catalog::Catalog;
use crate::cli::{compose_executor, load_settings, open_vault, output, Cli};
use crate::errors::{HbctlError, Result};
use crate::gateway::MongoGateway;
use crate::issuer::HttpIssuer;
use crate::orchestrator::{Collaborators, Orchestrator, StartOptions, StartTarget};

/// Turn the flag combination into a start target.
pub fn target(
    all: bool,
    unit: Option<&str>,
    element: Option<&str>,
    recv_type: Option<&str>,
) -> Result<StartTarget> {
    match (all, unit, element) {
        (true, _, _) => Ok(StartTarget::All),
        (false, Some(u), _) => Ok(StartTarget::Unit(u.to_string())),
        (false, None, Some(e)) => Ok(StartTarget::Element {
            name: e.to_string(),
            receiver_type: recv_type.map(str::to_string),
        }),
        (false, None, None) => Err(HbctlError::NoStartTarget),
    }
}

/// Execute the `start` command.
pub fn execute(
    cli: &Cli,
    all: bool,
    unit: Option<&str>,
    element: Option<&str>,
    recv_type: Option<&str>,
    no_token_create: bool,
) -> Result<()> {
    let opts = StartOptions {
        target: target(all, unit, element, recv_type)?,
        mint_tokens: !no_token_create,
    };

    let settings = load_settings(cli)?;
    let vault = open_vault(cli)?;
    let catalog = Catalog::herringbone();

    let database = MongoGateway::new();
    let executor = compose_executor(&settings);
    let issuer = HttpIssuer::new(settings.issuer_url.clone(), settings.http_timeout());

    let orchestrator = Orchestrator::new(
        &vault,
        &catalog,
        &settings,
        Collaborators {
            database: &database,
            executor: &executor,
            issuer: &issuer,
        },
    );
    orchestrator.run(&opts)?;

    output::success("Start complete.");
    if opts.mint_tokens {
        output::tip(&format!(
            "Runtime secrets: {}",
            orchestrator.runtime().path().display()
        ));
    }
    Ok(())
}
