//! MongoDB gateway over the synchronous driver.

use mongodb::bson::doc;
use mongodb::sync::Client;

use super::{redact_uri, DatabaseGateway, EnsureUser};
use crate::errors::{HbctlError, Result};
use crate::vault::records::escape_userinfo;

/// Connection options appended to every URI so a dead server fails fast.
const QUICK_TIMEOUTS: &str = "serverSelectionTimeoutMS=3000&connectTimeoutMS=3000";
const PROVISION_TIMEOUTS: &str = "serverSelectionTimeoutMS=15000&connectTimeoutMS=15000";

/// [`DatabaseGateway`] backed by the synchronous MongoDB driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct MongoGateway;

impl MongoGateway {
    pub fn new() -> Self {
        Self
    }
}

fn with_options(uri: &str, options: &str) -> String {
    let sep = if uri.contains('?') { '&' } else { '?' };
    format!("{uri}{sep}{options}")
}

impl DatabaseGateway for MongoGateway {
    fn can_connect(&self, uri: &str) -> bool {
        let client = match Client::with_uri_str(with_options(uri, QUICK_TIMEOUTS)) {
            Ok(c) => c,
            Err(e) => {
                tracing::debug!(uri = %redact_uri(uri), error = %e, "mongodb client setup failed");
                return false;
            }
        };

        match client.database("admin").run_command(doc! { "ping": 1 }).run() {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(uri = %redact_uri(uri), error = %e, "mongodb ping failed");
                false
            }
        }
    }

    fn ensure_user(&self, req: &EnsureUser<'_>) -> Result<()> {
        let uri = format!(
            "mongodb://root:{}@{}:{}/admin?authSource=admin",
            escape_userinfo(req.root_pass),
            req.host,
            req.port
        );
        let client = Client::with_uri_str(with_options(&uri, PROVISION_TIMEOUTS))
            .map_err(|e| HbctlError::Database(e.to_string()))?;

        let command = doc! {
            "createUser": req.user,
            "pwd": req.pass,
            "roles": [ { "role": "readWrite", "db": req.db } ],
        };

        match client.database(req.db).run_command(command).run() {
            Ok(_) => {
                tracing::info!(user = req.user, db = req.db, "created mongodb user");
                Ok(())
            }
            Err(e) if e.to_string().contains("already exists") => {
                tracing::info!(user = req.user, db = req.db, "mongodb user already exists");
                Ok(())
            }
            Err(e) => Err(HbctlError::Database(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_appended_with_the_right_separator() {
        assert_eq!(
            with_options("mongodb://h:1/db?authSource=db", "a=1"),
            "mongodb://h:1/db?authSource=db&a=1"
        );
        assert_eq!(with_options("mongodb://h:1", "a=1"), "mongodb://h:1?a=1");
    }

    #[test]
    fn malformed_uri_cannot_connect() {
        assert!(!MongoGateway::new().can_connect("not-a-uri"));
    }
}
