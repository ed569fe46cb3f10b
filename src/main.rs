use clap::Parser;
use hbctl::cli::{commands, Cli, Commands};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the diagnostic log filter.
const LOG_ENV: &str = "HBCTL_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Login { ref backend } => commands::login::execute(&cli, backend),
        Commands::Start {
            all,
            ref unit,
            ref element,
            ref recv_type,
            no_token_create,
        } => commands::start::execute(
            &cli,
            all,
            unit.as_deref(),
            element.as_deref(),
            recv_type.as_deref(),
            no_token_create,
        ),
        Commands::Stop { ref element } => commands::stop::execute(&cli, element.as_deref()),
        Commands::Restart { ref element } => {
            commands::restart::execute(&cli, element.as_deref())
        }
        Commands::Status { ref unit, json } => {
            commands::status::execute(&cli, unit.as_deref(), json)
        }
        Commands::Logs {
            ref unit,
            ref elements,
            follow,
            tail,
        } => commands::logs::execute(&cli, unit.as_deref(), elements, follow, tail),
        Commands::Elements { json, ref filter } => {
            commands::elements::execute(json, filter.as_deref())
        }
        Commands::Units => commands::units::execute(),
        Commands::Version => commands::version::execute(),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        tracing::debug!(error = ?e, "command failed");
        hbctl::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
