//! Static description of the Herringbone stack.
//!
//! The catalog is plain data built once and handed to whoever needs it;
//! nothing in here is mutated after construction.

use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

/// Namespace for deterministic service identifiers.
pub const SERVICE_NAMESPACE: Uuid = Uuid::from_u128(0x8b6c3c94_1c2e_4f8a_9b3e_9f2d8b0c9a11);

/// Deterministic identifier for `name` under `namespace` (UUIDv5, SHA-1).
pub fn identity(namespace: &Uuid, name: &str) -> String {
    Uuid::new_v5(namespace, name.as_bytes()).to_string()
}

/// A runnable element (one compose service).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub name: String,
    pub description: String,
    pub unit: String,
    /// Compose file that defines this element, on top of the database file.
    #[serde(skip)]
    pub compose_file: Option<String>,
}

impl Element {
    fn new(name: &str, description: &str, unit: &str, compose_file: &str) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            unit: unit.into(),
            compose_file: Some(compose_file.into()),
        }
    }
}

/// A service that gets its own identity and scoped token during bootstrap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    pub name: String,
    pub id: String,
    pub scopes: Vec<String>,
}

impl ServiceIdentity {
    pub fn new(name: &str, scopes: &[&str]) -> Self {
        Self {
            name: name.into(),
            id: identity(&SERVICE_NAMESPACE, name),
            scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
        }
    }
}

/// Everything the orchestrator needs to know about the stack layout.
#[derive(Debug, Clone)]
pub struct Catalog {
    /// All elements in start order.
    pub elements: Vec<Element>,
    /// Unit name -> element names.
    pub units: BTreeMap<String, Vec<String>>,
    /// Identities registered with the issuer during bootstrap.
    pub bootstrap: Vec<ServiceIdentity>,
    /// Compose service name of the database.
    pub database_service: String,
    /// Compose file of the database, included in every invocation.
    pub database_compose_file: String,
    /// Element that issues credentials.
    pub issuer: String,
    /// Element that needs a transport type.
    pub receiver: String,
}

impl Catalog {
    /// The Herringbone stack.
    pub fn herringbone() -> Self {
        let elements = vec![
            Element::new(
                "logingestion-receiver",
                "UDP/TCP/HTTP log ingestion receiver",
                "receiver",
                "compose.logingestion.receiver.yml",
            ),
            Element::new("herringbone-logs", "Logs API", "logs", "compose.herringbone.logs.yml"),
            Element::new(
                "herringbone-search",
                "Read-only search API over MongoDB collections",
                "search",
                "compose.herringbone.search.yml",
            ),
            Element::new(
                "herringbone-auth",
                "Standard authentication API",
                "auth",
                "compose.herringbone.auth.yml",
            ),
            Element::new(
                "parser-cardset",
                "Cardset metadata parser service",
                "parser",
                "compose.parser.cardset.yml",
            ),
            Element::new(
                "parser-enrichment",
                "Log enrichment parser service",
                "parser",
                "compose.parser.enrichment.yml",
            ),
            Element::new(
                "parser-extractor",
                "Regex/JSONPath extractor service",
                "parser",
                "compose.parser.extractor.yml",
            ),
            Element::new(
                "detectionengine-detector",
                "Detection engine detector service",
                "detection",
                "compose.detectionengine.detector.yml",
            ),
            Element::new(
                "detectionengine-matcher",
                "Detection engine matcher service",
                "detection",
                "compose.detectionengine.matcher.yml",
            ),
            Element::new(
                "detectionengine-ruleset",
                "Detection engine ruleset service",
                "detection",
                "compose.detectionengine.ruleset.yml",
            ),
            Element::new(
                "incidents-incidentset",
                "Incident aggregation and tracking service",
                "incidents",
                "compose.incidents.incidentset.yml",
            ),
            Element::new(
                "incidents-correlator",
                "Incident correlation engine",
                "incidents",
                "compose.incidents.correlator.yml",
            ),
            Element::new(
                "incidents-orchestrator",
                "Incident orchestration service",
                "incidents",
                "compose.incidents.orchestrator.yml",
            ),
            Element::new(
                "operations-center",
                "Operations Center UI",
                "operations-center",
                "compose.operations.center.yml",
            ),
        ];

        let mut units: BTreeMap<String, Vec<String>> = BTreeMap::new();
        units.insert("database".into(), vec!["mongodb".into()]);
        for e in &elements {
            units.entry(e.unit.clone()).or_default().push(e.name.clone());
        }

        let bootstrap = vec![
            ServiceIdentity::new("parser-enrichment", &["extractor:call", "parser:cards:read"]),
            ServiceIdentity::new("parser-extractor", &["parser:extract"]),
            ServiceIdentity::new(
                "parser-cardset",
                &["parser:cards:read", "parser:cards:write"],
            ),
            ServiceIdentity::new("incidents-incidentset", &["incidents:write"]),
            ServiceIdentity::new(
                "incidents-orchestrator",
                &["incidents:write", "incidents:correlate"],
            ),
            ServiceIdentity::new("incidents-correlator", &["events:read"]),
            ServiceIdentity::new(
                "detectionengine-detector",
                &["incidents:orchestrate", "detectionengine:run"],
            ),
            ServiceIdentity::new("detectionengine-matcher", &["detectionengine:run"]),
            ServiceIdentity::new("detectionengine-ruleset", &["rules:read"]),
        ];

        Self {
            elements,
            units,
            bootstrap,
            database_service: "mongodb".into(),
            database_compose_file: "compose.mongo.yml".into(),
            issuer: "herringbone-auth".into(),
            receiver: "logingestion-receiver".into(),
        }
    }

    pub fn element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name == name)
    }

    /// Elements of `unit`, or `None` for an unknown unit.
    pub fn unit(&self, unit: &str) -> Option<&[String]> {
        self.units
            .get(unit)
            .map(Vec::as_slice)
            .filter(|els| !els.is_empty())
    }

    /// Compose files (bare names) for `element`: the database file first,
    /// then the element's own file if it has one.
    pub fn compose_files(&self, element: &str) -> Vec<String> {
        let mut files = vec![self.database_compose_file.clone()];
        if let Some(file) = self.element(element).and_then(|e| e.compose_file.clone()) {
            files.push(file);
        }
        files
    }

    /// Elements whose name, description, or unit contains `filter`
    /// (case-insensitive).
    pub fn filter_elements(&self, filter: &str) -> Vec<&Element> {
        let needle = filter.to_lowercase();
        self.elements
            .iter()
            .filter(|e| {
                needle.is_empty()
                    || e.name.to_lowercase().contains(&needle)
                    || e.description.to_lowercase().contains(&needle)
                    || e.unit.to_lowercase().contains(&needle)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_stable() {
        // UUIDv5 of the name under the Herringbone namespace.
        let a = identity(&SERVICE_NAMESPACE, "parser-extractor");
        let b = identity(&SERVICE_NAMESPACE, "parser-extractor");
        assert_eq!(a, b);
        assert_eq!(Uuid::parse_str(&a).unwrap().get_version_num(), 5);
    }

    #[test]
    fn identity_differs_per_name() {
        assert_ne!(
            identity(&SERVICE_NAMESPACE, "parser-extractor"),
            identity(&SERVICE_NAMESPACE, "parser-cardset")
        );
    }

    #[test]
    fn identity_depends_on_namespace() {
        let other = Uuid::from_u128(1);
        assert_ne!(
            identity(&SERVICE_NAMESPACE, "parser-extractor"),
            identity(&other, "parser-extractor")
        );
    }

    #[test]
    fn bootstrap_identities_are_unique() {
        let catalog = Catalog::herringbone();
        let mut ids: Vec<_> = catalog.bootstrap.iter().map(|s| s.id.clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.bootstrap.len());
    }

    #[test]
    fn units_group_elements() {
        let catalog = Catalog::herringbone();
        assert_eq!(
            catalog.unit("parser").unwrap(),
            ["parser-cardset", "parser-enrichment", "parser-extractor"]
        );
        assert_eq!(catalog.unit("database").unwrap(), ["mongodb"]);
        assert!(catalog.unit("nope").is_none());
    }

    #[test]
    fn compose_files_always_include_database() {
        let catalog = Catalog::herringbone();
        assert_eq!(
            catalog.compose_files("herringbone-auth"),
            ["compose.mongo.yml", "compose.herringbone.auth.yml"]
        );
        assert_eq!(catalog.compose_files("mongodb"), ["compose.mongo.yml"]);
    }

    #[test]
    fn filter_matches_unit_and_description() {
        let catalog = Catalog::herringbone();
        assert_eq!(catalog.filter_elements("DETECTION").len(), 3);
        assert_eq!(catalog.filter_elements("jsonpath").len(), 1);
        assert_eq!(catalog.filter_elements("").len(), catalog.elements.len());
    }
}
