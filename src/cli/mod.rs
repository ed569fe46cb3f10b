//! CLI module: Clap argument parser, output helpers, and command implementations.

pub mod commands;
pub mod output;

use std::path::PathBuf;

use clap::Parser;

use crate::config::{self, Settings};
use crate::errors::Result;
use crate::executor::ComposeExecutor;
use crate::vault::{PassphraseSource, Vault};

/// hbctl: control and manage a local Herringbone stack.
#[derive(Parser)]
#[command(
    name = "hbctl",
    about = "Herringbone control CLI: encrypted credentials and local stack bootstrap",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Compose project name (default from config: herringbone)
    #[arg(short, long, global = true)]
    pub project: Option<String>,

    /// Directory holding the compose.*.yml files
    #[arg(long, global = true)]
    pub compose_dir: Option<PathBuf>,

    /// Vault file (default: ~/.hbctl/secrets.enc)
    #[arg(long, global = true, env = "HBCTL_VAULT")]
    pub vault: Option<PathBuf>,
}

/// All available subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Store encrypted credentials in the vault
    Login {
        #[command(subcommand)]
        backend: LoginBackend,
    },

    /// Start the whole stack, a unit, or a single element
    Start {
        /// Start the full stack and bootstrap service tokens
        #[arg(long, conflicts_with_all = ["unit", "element"])]
        all: bool,

        /// Start every element of a unit
        #[arg(long, conflicts_with = "element")]
        unit: Option<String>,

        /// Start a single element
        #[arg(long)]
        element: Option<String>,

        /// Receiver transport type (required for logingestion-receiver)
        #[arg(long = "type", value_name = "TYPE")]
        recv_type: Option<String>,

        /// Skip runtime secret files and token bootstrap
        #[arg(long)]
        no_token_create: bool,
    },

    /// Stop one element, or bring the whole stack down
    Stop {
        #[arg(long)]
        element: Option<String>,
    },

    /// Restart one element, or the whole stack
    Restart {
        #[arg(long)]
        element: Option<String>,
    },

    /// Show the state of the project's containers
    Status {
        /// Only show containers of this unit
        #[arg(long, visible_alias = "profile")]
        unit: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show container logs for a unit or specific elements
    Logs {
        /// Show logs for every element of a unit
        #[arg(long, conflicts_with = "elements")]
        unit: Option<String>,

        /// Element names
        elements: Vec<String>,

        /// Follow log output
        #[arg(short, long)]
        follow: bool,

        /// Number of lines from the end (0 = all)
        #[arg(long, default_value_t = 0)]
        tail: usize,
    },

    /// List available elements
    Elements {
        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Filter by name, description, or unit
        #[arg(long)]
        filter: Option<String>,
    },

    /// List available units
    Units,

    /// Show hbctl version
    Version,

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Credential kinds `login` can store.
#[derive(clap::Subcommand)]
pub enum LoginBackend {
    /// MongoDB application user
    Mongodb {
        #[arg(long)]
        user: String,

        /// Password (omit for interactive prompt)
        #[arg(long)]
        password: Option<String>,

        /// Host as seen from the service containers
        #[arg(long)]
        host: String,

        #[arg(long, default_value_t = 27017)]
        port: u16,

        #[arg(long, default_value = "herringbone")]
        database: String,

        #[arg(long)]
        collection: Option<String>,

        #[arg(long, default_value = "admin")]
        auth_source: String,

        #[arg(long)]
        replica_set: Option<String>,
    },

    /// Secret used to sign admin credentials
    Jwtsecret {
        /// Secret value (omit for interactive prompt)
        #[arg(long)]
        secret: Option<String>,
    },

    /// RSA keypair the auth service signs service tokens with
    Servicekey {
        /// Path to the public key PEM file
        #[arg(long = "public", value_name = "PATH", conflicts_with = "public_key")]
        public_file: Option<PathBuf>,

        /// Path to the private key PEM file
        #[arg(long = "private", value_name = "PATH", conflicts_with = "private_key")]
        private_file: Option<PathBuf>,

        /// Public key PEM (inline)
        #[arg(long)]
        public_key: Option<String>,

        /// Private key PEM (inline)
        #[arg(long)]
        private_key: Option<String>,

        /// Generate a new RSA keypair instead
        #[arg(long, conflicts_with_all = ["public_file", "private_file", "public_key", "private_key"])]
        generate: bool,

        /// RSA modulus size when generating (default from config: 4096)
        #[arg(long, requires = "generate")]
        bits: Option<usize>,
    },
}

// ---------------------------------------------------------------------------
// Shared helpers used by multiple commands
// ---------------------------------------------------------------------------

/// Load `~/.hbctl/config.toml` and apply command-line overrides.
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = Settings::load(&config::hbctl_dir()?)?;
    if let Some(project) = &cli.project {
        settings.project = project.clone();
    }
    if let Some(dir) = &cli.compose_dir {
        settings.compose_dir = dir.clone();
    }
    Ok(settings)
}

/// Open the vault, taking the passphrase from `HBCTL_PASSPHRASE` when set.
pub fn open_vault(cli: &Cli) -> Result<Vault> {
    let path = match &cli.vault {
        Some(p) => p.clone(),
        None => config::vault_path()?,
    };
    Ok(Vault::new(path, PassphraseSource::from_env()))
}

/// `docker compose` running from the configured compose directory.
pub fn compose_executor(settings: &Settings) -> ComposeExecutor {
    ComposeExecutor::new().in_dir(&settings.compose_dir)
}
