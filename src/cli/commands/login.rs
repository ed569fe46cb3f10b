//! `hbctl login`: store a credential record in the vault.

use crate::cli::{load_settings, open_vault, output, Cli, LoginBackend};
use crate::errors::{HbctlError, Result};
use crate::vault::{KeyMaterial, MongoSecret, ServiceKeyPair, SigningSecret};

/// Execute the `login` command.
pub fn execute(cli: &Cli, backend: &LoginBackend) -> Result<()> {
    let vault = open_vault(cli)?;

    match backend {
        LoginBackend::Mongodb {
            user,
            password,
            host,
            port,
            database,
            collection,
            auth_source,
            replica_set,
        } => {
            let password = match password {
                Some(p) => {
                    output::warning("Password provided on command line: it may appear in shell history.");
                    p.clone()
                }
                None => prompt_secret("MongoDB password")?,
            };

            vault.save(MongoSecret {
                user: user.clone(),
                password,
                database: database.clone(),
                collection: collection.clone(),
                host: host.clone(),
                port: *port,
                auth_source: auth_source.clone(),
                replica_set: replica_set.clone(),
            })?;
            output::success("MongoDB credentials saved");
        }

        LoginBackend::Jwtsecret { secret } => {
            let secret = match secret {
                Some(s) => s.clone(),
                None => prompt_secret("JWT secret")?,
            };
            vault.save(SigningSecret::new(secret))?;
            output::success("JWT secret saved");
        }

        LoginBackend::Servicekey {
            public_file,
            private_file,
            public_key,
            private_key,
            generate,
            bits,
        } => {
            if *generate {
                let bits = match bits {
                    Some(b) => *b,
                    None => load_settings(cli)?.rsa_bits,
                };
                output::info(&format!("Generating {bits}-bit RSA keypair..."));
                vault.save(ServiceKeyPair::generate(bits)?)?;
                output::success("Service JWT keypair generated and saved");
            } else {
                let public = material(public_key, public_file)?;
                let private = material(private_key, private_file)?;
                vault.save(ServiceKeyPair::load(&public, &private)?)?;
                output::success("Service JWT keypair saved");
            }
        }
    }

    output::tip(&format!("Vault: {}", vault.path().display()));
    Ok(())
}

/// Inline PEM wins over a file path; one of them is required.
fn material(
    inline: &Option<String>,
    file: &Option<std::path::PathBuf>,
) -> Result<KeyMaterial> {
    match (inline, file) {
        (Some(pem), _) => Ok(KeyMaterial::Inline(pem.clone())),
        (None, Some(path)) => Ok(KeyMaterial::File(path.clone())),
        (None, None) => Err(HbctlError::CommandFailed(
            "must provide both public and private keys (or use --generate)".into(),
        )),
    }
}

fn prompt_secret(label: &str) -> Result<String> {
    dialoguer::Password::new()
        .with_prompt(label)
        .interact()
        .map_err(|e| HbctlError::CommandFailed(format!("input prompt: {e}")))
}
