//! Bootstrap orchestrator.
//!
//! A start request is turned into a fixed list of [`Step`]s up front and then
//! driven by a single loop in [`Orchestrator::run`]. Each step is a method
//! that either succeeds or returns an error, which the loop wraps in
//! [`HbctlError::StepFailed`] before aborting. Nothing is rolled back; running
//! the same request again is safe because database provisioning and admin
//! credential minting both short-circuit when their work is already done.

pub mod runtime;

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use rand::RngCore;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::catalog::Catalog;
use crate::cli::output;
use crate::config::Settings;
use crate::crypto::mint_admin_token;
use crate::errors::{HbctlError, Result};
use crate::executor::{Env, ProcessExecutor};
use crate::gateway::{DatabaseGateway, EnsureUser};
use crate::issuer::{self, IssuerApi, RegisterRequest, TokenRequest, DOCS_PATH, HEALTH_PATH};
use crate::vault::{MongoSecret, ServiceKeyPair, SigningSecret, Vault};

pub use runtime::{
    token_file_name, RuntimeDir, ADMIN_TOKEN_FILE, JWT_SECRET_FILE, SERVICE_PRIVATE_KEY_FILE,
    SERVICE_PUBLIC_KEY_FILE,
};

/// Environment keys only the issuer may ever see.
pub const ISSUER_ENV_KEYS: [&str; 3] = [
    "JWT_SECRET",
    "SERVICE_JWT_PRIVATE_KEY",
    "SERVICE_JWT_PUBLIC_KEY",
];

pub const RECEIVER_TYPE_KEY: &str = "RECEIVER_TYPE";
pub const MONGO_ROOT_PASS_KEY: &str = "MONGO_ROOT_PASS";

const ROOT_PASSWORD_LEN: usize = 24;

/// Orchestration states, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    LoadCredentials,
    PrepareRuntime,
    DatabaseReadiness,
    StartIssuer,
    HealthPoll,
    AdminCredential,
    ServiceBootstrap,
    StartServices,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LoadCredentials => "loading credentials",
            Self::PrepareRuntime => "preparing runtime secrets",
            Self::DatabaseReadiness => "database readiness",
            Self::StartIssuer => "starting the credential issuer",
            Self::HealthPoll => "issuer health check",
            Self::AdminCredential => "admin credential",
            Self::ServiceBootstrap => "service bootstrap",
            Self::StartServices => "starting services",
        })
    }
}

/// What to bring up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartTarget {
    /// The whole stack, with service bootstrap.
    All,
    /// Every element of one unit.
    Unit(String),
    /// One element. `receiver_type` is required for the receiver.
    Element {
        name: String,
        receiver_type: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOptions {
    pub target: StartTarget,
    /// Write runtime secrets and mint tokens. Off with `--no-token-create`.
    pub mint_tokens: bool,
}

impl StartOptions {
    pub fn new(target: StartTarget) -> Self {
        Self {
            target,
            mint_tokens: true,
        }
    }

    /// The steps this request runs, in order.
    pub fn plan(&self) -> Vec<Step> {
        let mut steps = vec![Step::LoadCredentials];
        if self.mint_tokens {
            steps.push(Step::PrepareRuntime);
        }
        steps.push(Step::DatabaseReadiness);

        if self.target == StartTarget::All {
            steps.extend([Step::StartIssuer, Step::HealthPoll]);
            if self.mint_tokens {
                steps.extend([Step::AdminCredential, Step::ServiceBootstrap]);
            }
        }

        steps.push(Step::StartServices);
        steps
    }
}

/// Secrets loaded from the vault for one run.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub mongo: MongoSecret,
    pub signing: SigningSecret,
    pub keys: ServiceKeyPair,
}

impl Credentials {
    /// Load all three records with a single passphrase entry.
    pub fn load(vault: &Vault) -> Result<Self> {
        let store = vault.load_store()?;
        Ok(Self {
            mongo: store.get()?,
            signing: store.get()?,
            keys: store.get()?,
        })
    }

    fn issuer_env(&self) -> [(&'static str, String); 3] {
        [
            (ISSUER_ENV_KEYS[0], self.signing.secret.clone()),
            (ISSUER_ENV_KEYS[1], self.keys.private_key.clone()),
            (ISSUER_ENV_KEYS[2], self.keys.public_key.clone()),
        ]
    }
}

/// Keys of the shared service environment.
pub const BASE_ENV_KEYS: [&str; 9] = [
    MONGO_ROOT_PASS_KEY,
    "MONGO_HOST",
    "MONGO_PORT",
    "MONGO_USER",
    "MONGO_PASS",
    "DB_NAME",
    "AUTH_DB",
    RECEIVER_TYPE_KEY,
    "MATCHER_API",
];

/// The shared environment with every value blanked, for commands that
/// touch running services without needing their credentials.
pub fn blank_env() -> Env {
    BASE_ENV_KEYS
        .iter()
        .map(|k| (k.to_string(), String::new()))
        .collect()
}

/// Environment every service start begins from.
pub fn base_env(mongo: &MongoSecret) -> Env {
    [
        (MONGO_ROOT_PASS_KEY, String::new()),
        ("MONGO_HOST", mongo.host.clone()),
        ("MONGO_PORT", mongo.port.to_string()),
        ("MONGO_USER", mongo.user.clone()),
        ("MONGO_PASS", mongo.password.clone()),
        ("DB_NAME", mongo.database.clone()),
        ("AUTH_DB", mongo.auth_source.clone()),
        (RECEIVER_TYPE_KEY, String::new()),
        ("MATCHER_API", String::new()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

/// `len` characters of URL-safe randomness.
fn random_password(len: usize) -> Zeroizing<String> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    rand::rng().fill_bytes(&mut bytes);
    let mut encoded = URL_SAFE_NO_PAD.encode(&*bytes);
    encoded.truncate(len);
    Zeroizing::new(encoded)
}

/// External systems the orchestrator drives.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub database: &'a dyn DatabaseGateway,
    pub executor: &'a dyn ProcessExecutor,
    pub issuer: &'a dyn IssuerApi,
}

/// Mutable state threaded through one run.
#[derive(Default)]
struct RunState {
    creds: Option<Credentials>,
    env: Env,
    admin_token: Option<String>,
}

impl RunState {
    fn creds(&self) -> Result<&Credentials> {
        self.creds
            .as_ref()
            .ok_or_else(|| HbctlError::CommandFailed("credentials not loaded".into()))
    }
}

pub struct Orchestrator<'a> {
    vault: &'a Vault,
    catalog: &'a Catalog,
    settings: &'a Settings,
    runtime: RuntimeDir,
    deps: Collaborators<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        vault: &'a Vault,
        catalog: &'a Catalog,
        settings: &'a Settings,
        deps: Collaborators<'a>,
    ) -> Self {
        Self {
            vault,
            catalog,
            settings,
            runtime: RuntimeDir::new(settings.runtime_dir()),
            deps,
        }
    }

    pub fn runtime(&self) -> &RuntimeDir {
        &self.runtime
    }

    /// Run a start request to completion, stopping at the first failure.
    pub fn run(&self, opts: &StartOptions) -> Result<()> {
        let (services, receiver_type) = self.resolve(&opts.target)?;
        let plan = opts.plan();
        tracing::debug!(?plan, ?services, "start plan");

        if matches!(opts.target, StartTarget::All) {
            output::info("Starting full Herringbone stack...");
        }
        if !opts.mint_tokens {
            output::info("Skipping runtime secrets and token bootstrap (--no-token-create)");
        }

        let mut state = RunState::default();
        for step in plan {
            tracing::debug!(%step, "entering step");
            self.execute(step, &services, &receiver_type, &mut state)
                .map_err(|e| HbctlError::StepFailed {
                    step,
                    source: Box::new(e),
                })?;
        }
        Ok(())
    }

    /// Validate the target and expand it into the elements the final step
    /// starts, plus the receiver transport for this run.
    fn resolve(&self, target: &StartTarget) -> Result<(Vec<String>, String)> {
        let default_type = self.settings.default_receiver_type.to_uppercase();
        match target {
            StartTarget::All => Ok((
                self.catalog
                    .elements
                    .iter()
                    .filter(|e| e.name != self.catalog.issuer)
                    .map(|e| e.name.clone())
                    .collect(),
                default_type,
            )),
            StartTarget::Unit(unit) => {
                let elements = self
                    .catalog
                    .unit(unit)
                    .ok_or_else(|| HbctlError::UnknownUnit(unit.clone()))?;
                Ok((elements.to_vec(), default_type))
            }
            StartTarget::Element {
                name,
                receiver_type,
            } => {
                if self.catalog.element(name).is_none() && *name != self.catalog.database_service
                {
                    return Err(HbctlError::UnknownElement(name.clone()));
                }
                let receiver_type = match receiver_type {
                    Some(t) if !t.trim().is_empty() => t.trim().to_uppercase(),
                    _ if *name == self.catalog.receiver => {
                        return Err(HbctlError::MissingReceiverType)
                    }
                    _ => String::new(),
                };
                Ok((vec![name.clone()], receiver_type))
            }
        }
    }

    fn execute(
        &self,
        step: Step,
        services: &[String],
        receiver_type: &str,
        state: &mut RunState,
    ) -> Result<()> {
        match step {
            Step::LoadCredentials => {
                output::info("Decrypting secrets...");
                let creds = Credentials::load(self.vault)?;
                state.env = base_env(&creds.mongo);
                state.creds = Some(creds);
                Ok(())
            }
            Step::PrepareRuntime => self.prepare_runtime(state.creds()?),
            Step::DatabaseReadiness => self.ensure_database(&state.creds()?.mongo),
            Step::StartIssuer => {
                let creds = state.creds.as_ref().ok_or_else(|| {
                    HbctlError::CommandFailed("credentials not loaded".into())
                })?;
                self.start_element(&mut state.env, &self.catalog.issuer, creds, receiver_type)
            }
            Step::HealthPoll => {
                self.wait_for_issuer();
                Ok(())
            }
            Step::AdminCredential => {
                let token = self.ensure_admin_token(&state.creds()?.signing)?;
                state.admin_token = Some(token);
                Ok(())
            }
            Step::ServiceBootstrap => {
                let token = state.admin_token.as_deref().ok_or_else(|| {
                    HbctlError::CommandFailed("admin credential missing".into())
                })?;
                self.bootstrap_services(token)
            }
            Step::StartServices => {
                let creds = state.creds.as_ref().ok_or_else(|| {
                    HbctlError::CommandFailed("credentials not loaded".into())
                })?;
                for name in services {
                    self.start_element(&mut state.env, name, creds, receiver_type)?;
                }
                Ok(())
            }
        }
    }

    /// Write the signing secret and service keypair for the issuer.
    pub fn prepare_runtime(&self, creds: &Credentials) -> Result<()> {
        output::info("Preparing runtime secrets...");
        self.runtime.write_secret(JWT_SECRET_FILE, &creds.signing.secret)?;
        self.runtime
            .write_secret(SERVICE_PRIVATE_KEY_FILE, &creds.keys.private_key)?;
        self.runtime
            .write_secret(SERVICE_PUBLIC_KEY_FILE, &creds.keys.public_key)?;
        tracing::debug!(dir = %self.runtime.path().display(), "runtime secrets written");
        Ok(())
    }

    /// Make sure the application user can log in, provisioning it if needed.
    pub fn ensure_database(&self, mongo: &MongoSecret) -> Result<()> {
        let host = &self.settings.database_host;

        output::info("Checking MongoDB app user...");
        if self.deps.database.can_connect(&mongo.app_uri(host)) {
            output::success("MongoDB already initialized.");
            return Ok(());
        }

        let root_pass = random_password(ROOT_PASSWORD_LEN);
        let env: Env = [(MONGO_ROOT_PASS_KEY.to_string(), root_pass.to_string())].into();

        output::info("Ensuring MongoDB is running...");
        self.deps.executor.run(&env, &self.database_args())?;

        output::info("Waiting for MongoDB root auth...");
        let root_uri = format!(
            "mongodb://root:{}@{host}:{}/admin?authSource=admin",
            root_pass.as_str(),
            mongo.port
        );
        self.deps.database.wait_for_connect(
            &root_uri,
            self.settings.database_timeout(),
            self.settings.database_interval(),
        )?;

        output::info("Bootstrapping MongoDB user...");
        self.deps.database.ensure_user(&EnsureUser {
            host,
            port: mongo.port,
            root_pass: &root_pass,
            user: &mongo.user,
            pass: &mongo.password,
            db: &mongo.database,
        })?;

        output::success("MongoDB ready.");
        Ok(())
    }

    /// Probe `/health`, falling back to a short `/docs` probe. Never fails;
    /// a dead issuer shows up in the next step instead.
    pub fn wait_for_issuer(&self) {
        let interval = self.settings.health_interval();
        let Err(e) = issuer::wait_healthy(
            self.deps.issuer,
            HEALTH_PATH,
            self.settings.health_timeout(),
            interval,
        ) else {
            return;
        };

        output::warning(&format!("{e}; trying {DOCS_PATH}"));
        if let Err(e) = issuer::wait_healthy(
            self.deps.issuer,
            DOCS_PATH,
            self.settings.docs_timeout(),
            interval,
        ) {
            tracing::warn!(error = %e, "issuer did not answer, continuing anyway");
        }
    }

    /// Reuse the cached admin token, or mint and cache a new one.
    pub fn ensure_admin_token(&self, signing: &SigningSecret) -> Result<String> {
        // TODO: decode the cached token and re-mint once its exp has passed.
        if let Some(token) = self.runtime.read_trimmed(ADMIN_TOKEN_FILE)? {
            tracing::debug!("reusing cached admin token");
            return Ok(token);
        }

        let token = mint_admin_token(signing.secret.as_bytes(), Utc::now())?;
        self.runtime.write_secret(ADMIN_TOKEN_FILE, &token)?;
        output::success("Minted admin token.");
        Ok(token)
    }

    /// Register every bootstrap identity and persist its scoped token.
    pub fn bootstrap_services(&self, admin_token: &str) -> Result<()> {
        for svc in &self.catalog.bootstrap {
            let wrap = |source: HbctlError| HbctlError::ServiceBootstrap {
                service: svc.name.clone(),
                source: Box::new(source),
            };

            let register = RegisterRequest {
                service_id: format!("{}-{}", svc.id, Uuid::new_v4()),
                service_name: svc.name.clone(),
                scopes: svc.scopes.clone(),
            };
            self.deps
                .issuer
                .register(admin_token, &register)
                .map_err(wrap)?;

            let request = TokenRequest {
                service: svc.name.clone(),
                scopes: svc.scopes.clone(),
            };
            let token = self
                .deps
                .issuer
                .service_token(admin_token, &request)
                .map_err(wrap)?;

            self.runtime
                .write_secret(&token_file_name(&svc.name), token.trim())
                .map_err(wrap)?;
            output::success(&format!("Bootstrapped {}", svc.name));
        }
        Ok(())
    }

    /// Start one element with `up -d --no-recreate`.
    ///
    /// Element-specific variables are added to `env` for this call only and
    /// restored afterwards, whether or not the start succeeded.
    pub fn start_element(
        &self,
        env: &mut Env,
        element: &str,
        creds: &Credentials,
        receiver_type: &str,
    ) -> Result<()> {
        let mut scoped: Vec<(&str, String)> = Vec::new();
        if element == self.catalog.issuer {
            scoped.extend(creds.issuer_env());
        }
        if element == self.catalog.receiver {
            scoped.push((RECEIVER_TYPE_KEY, receiver_type.to_string()));
        }

        let saved: Vec<(&str, Option<String>)> = scoped
            .into_iter()
            .map(|(k, v)| (k, env.insert(k.to_string(), v)))
            .collect();
        if !saved.is_empty() {
            tracing::debug!(element, keys = ?saved.iter().map(|(k, _)| *k).collect::<Vec<_>>(), "scoped env injected");
        }

        output::info(&format!("Starting {element}..."));
        let result = self.deps.executor.run(env, &self.up_args(element));

        for (key, previous) in saved {
            match previous {
                Some(v) => env.insert(key.to_string(), v),
                None => env.remove(key),
            };
        }
        result
    }

    fn project_args(&self) -> Vec<String> {
        vec!["-p".into(), self.settings.project.clone()]
    }

    fn database_args(&self) -> Vec<String> {
        let mut args = self.project_args();
        args.extend([
            "-f".into(),
            self.catalog.database_compose_file.clone(),
            "up".into(),
            "-d".into(),
            self.catalog.database_service.clone(),
        ]);
        args
    }

    fn up_args(&self, element: &str) -> Vec<String> {
        let mut args = self.project_args();
        for file in self.catalog.compose_files(element) {
            args.push("-f".into());
            args.push(file);
        }
        args.extend([
            "up".into(),
            "-d".into(),
            "--no-recreate".into(),
            element.to_string(),
        ]);
        args
    }
}
