//! Registry domain types
//!
//! A registry is a set of image-pull credentials keyed by server URL, or a
//! marker for the in-cluster registry service. Everything here is pure:
//! validation, duplicate detection and domain derivation need no cluster.

use base64::Engine;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::error::ValidationError;

/// Annotation carrying the comma-joined server URLs of a registry secret
pub const SERVER_URL_ANNOTATION: &str = "kndp-registry-server-url";

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(
            r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
        )
        .expect("email pattern is a valid regex")
    })
}

/// Credentials for a single registry server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthEntry {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    /// base64 of `username:password`
    #[serde(default)]
    pub auth: String,
    #[serde(default)]
    pub server: String,
}

impl AuthEntry {
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        let username = username.into();
        let password = password.into();
        let auth = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username, password));
        Self {
            username,
            password,
            email: email.into(),
            auth,
            server: server.into(),
        }
    }

    /// Check required fields, email syntax and server URL
    pub fn validate(&self, key: &str) -> Result<(), ValidationError> {
        let missing = |field| ValidationError::MissingField {
            server: key.to_string(),
            field,
        };
        if self.username.is_empty() {
            return Err(missing("username"));
        }
        if self.password.is_empty() {
            return Err(missing("password"));
        }
        if self.auth.is_empty() {
            return Err(missing("auth"));
        }
        if self.email.is_empty() {
            return Err(missing("email"));
        }
        if self.server.is_empty() {
            return Err(missing("server"));
        }
        if !email_regex().is_match(&self.email) {
            return Err(ValidationError::InvalidEmail {
                server: key.to_string(),
                email: self.email.clone(),
            });
        }
        if !is_http_url(&self.server) {
            return Err(ValidationError::InvalidServer {
                server: self.server.clone(),
            });
        }
        Ok(())
    }
}

fn is_http_url(server: &str) -> bool {
    match url::Url::parse(server) {
        Ok(u) => matches!(u.scheme(), "http" | "https") && u.host_str().is_some(),
        Err(_) => false,
    }
}

/// Docker config JSON body: `{"auths": {...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegistryConfig {
    #[serde(default)]
    pub auths: BTreeMap<String, AuthEntry>,
}

/// Domains used when deriving the advertised registry domain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Domains {
    /// Cluster-local DNS name of the in-cluster registry
    pub local: String,
    /// Fallback for a registry without server entries
    pub default_remote: String,
}

impl Domains {
    pub fn new(local: impl Into<String>, default_remote: impl Into<String>) -> Self {
        Self {
            local: local.into(),
            default_remote: default_remote.into(),
        }
    }
}

/// Image-pull credential set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Registry {
    pub config: RegistryConfig,
    pub default: bool,
    pub local: bool,
    /// Secret name, assigned by the cluster on create
    pub name: Option<String>,
    /// Optimistic-concurrency token of the backing secret
    pub resource_version: Option<String>,
    pub annotations: BTreeMap<String, String>,
}

impl Registry {
    /// Create a registry holding a single server entry
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        let server = server.into();
        let mut auths = BTreeMap::new();
        auths.insert(
            server.clone(),
            AuthEntry::new(server.clone(), username, password, email),
        );
        let mut annotations = BTreeMap::new();
        annotations.insert(SERVER_URL_ANNOTATION.to_string(), server);
        Self {
            config: RegistryConfig { auths },
            annotations,
            ..Default::default()
        }
    }

    /// Marker for the in-cluster registry
    pub fn local() -> Self {
        Self {
            local: true,
            ..Default::default()
        }
    }

    pub fn set_default(&mut self, default: bool) {
        self.default = default;
    }

    pub fn set_local(&mut self, local: bool) {
        self.local = local;
    }

    /// Value of the server-URL annotation, if set and non-empty
    pub fn server_url(&self) -> Option<&str> {
        self.annotations
            .get(SERVER_URL_ANNOTATION)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Server keys joined the way the annotation stores them
    pub fn joined_servers(&self) -> String {
        self.config
            .auths
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Drop identity fields that are only valid inside one cluster
    pub fn clear_identity(&mut self) {
        self.name = None;
        self.resource_version = None;
    }

    /// Validate credentials; local registries always pass
    pub fn validate_auths(&self) -> Result<(), ValidationError> {
        if self.local {
            return Ok(());
        }
        if self.config.auths.is_empty() {
            return Err(ValidationError::NoAuths);
        }
        for (key, auth) in &self.config.auths {
            auth.validate(key)?;
        }
        Ok(())
    }

    /// Loose duplicate check against registries already in a context.
    ///
    /// A server key that is contained in, or contains, an existing server-URL
    /// annotation counts as a duplicate, so `ghcr.io` matches
    /// `https://ghcr.io/org` and the other way round. The candidate's own
    /// annotation is checked for containment too.
    pub fn exists_in(&self, existing: &[Registry]) -> bool {
        existing.iter().any(|registry| {
            let Some(existing_url) = registry.server_url() else {
                return false;
            };
            let by_key = self
                .config
                .auths
                .keys()
                .filter(|key| !key.is_empty())
                .any(|key| existing_url.contains(key.as_str()) || key.contains(existing_url));
            let by_annotation = self
                .server_url()
                .is_some_and(|own| existing_url.contains(own));
            by_key || by_annotation
        })
    }

    /// Domain advertised through `--registry=<domain>` when this registry is default.
    ///
    /// Remote registries use the host of the first server key (`scheme://host/...`).
    /// With more than one key the lexicographically first one wins.
    pub fn domain(&self, domains: &Domains) -> String {
        if self.local {
            return domains.local.clone();
        }
        match self.config.auths.keys().next() {
            Some(server) => host_segment(server),
            None => domains.default_remote.clone(),
        }
    }
}

/// Third `/` segment of `scheme://host/path`, or the first segment without a scheme
fn host_segment(server: &str) -> String {
    let segments: Vec<&str> = server.split('/').collect();
    if server.contains("://") {
        segments.get(2).copied().unwrap_or_default().to_string()
    } else {
        segments.first().copied().unwrap_or_default().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> Domains {
        Domains::new("registry.kndp-system.svc.cluster.local", "xpkg.upbound.io")
    }

    fn ghcr() -> Registry {
        Registry::new("https://ghcr.io/org", "octocat", "s3cret", "octocat@github.com")
    }

    #[test]
    fn test_new_registry() {
        let registry = ghcr();
        let auth = &registry.config.auths["https://ghcr.io/org"];
        assert_eq!(auth.auth, "b2N0b2NhdDpzM2NyZXQ=");
        assert_eq!(auth.server, "https://ghcr.io/org");
        assert_eq!(registry.server_url(), Some("https://ghcr.io/org"));
        assert!(!registry.default);
        assert!(!registry.local);
    }

    #[test]
    fn test_validate_ok() {
        assert!(ghcr().validate_auths().is_ok());
    }

    #[test]
    fn test_validate_missing_password() {
        let registry = Registry::new("https://ghcr.io/org", "octocat", "", "octocat@github.com");
        assert_eq!(
            registry.validate_auths(),
            Err(ValidationError::MissingField {
                server: "https://ghcr.io/org".to_string(),
                field: "password",
            })
        );
    }

    #[test]
    fn test_validate_bad_email() {
        for email in ["not-an-email", "user@", "@host.io", "user@host"] {
            let registry = Registry::new("https://ghcr.io/org", "u", "p", email);
            assert!(
                matches!(registry.validate_auths(), Err(ValidationError::InvalidEmail { .. })),
                "{} should be rejected",
                email
            );
        }
    }

    #[test]
    fn test_validate_bad_server() {
        let registry = Registry::new("ghcr.io/org", "u", "p", "u@example.com");
        assert!(matches!(
            registry.validate_auths(),
            Err(ValidationError::InvalidServer { .. })
        ));
    }

    #[test]
    fn test_validate_local_skips_checks() {
        let mut registry = Registry::default();
        registry.set_local(true);
        assert!(registry.validate_auths().is_ok());
        assert_eq!(Registry::default().validate_auths(), Err(ValidationError::NoAuths));
    }

    #[test]
    fn test_exists_candidate_contained_in_existing() {
        let existing = vec![ghcr()];
        let mut candidate = Registry::new("ghcr.io", "u", "p", "u@example.com");
        candidate.annotations.clear();
        assert!(candidate.exists_in(&existing));
    }

    #[test]
    fn test_exists_candidate_contains_existing() {
        let mut existing = Registry::default();
        existing
            .annotations
            .insert(SERVER_URL_ANNOTATION.to_string(), "ghcr.io".to_string());
        let candidate = Registry::new("https://ghcr.io/other-org", "u", "p", "u@example.com");
        assert!(candidate.exists_in(&[existing]));
    }

    #[test]
    fn test_exists_unrelated() {
        let candidate = Registry::new("https://registry.gitlab.com/g", "u", "p", "u@example.com");
        assert!(!candidate.exists_in(&[ghcr()]));
        assert!(!candidate.exists_in(&[]));
    }

    #[test]
    fn test_exists_ignores_registries_without_annotation() {
        let candidate = ghcr();
        assert!(!candidate.exists_in(&[Registry::default()]));
    }

    #[test]
    fn test_domain() {
        assert_eq!(ghcr().domain(&domains()), "ghcr.io");
        assert_eq!(Registry::local().domain(&domains()), "registry.kndp-system.svc.cluster.local");
        assert_eq!(Registry::default().domain(&domains()), "xpkg.upbound.io");
        let bare = Registry::new("index.docker.io/v1", "u", "p", "u@example.com");
        assert_eq!(bare.domain(&domains()), "index.docker.io");
    }

    #[test]
    fn test_clear_identity() {
        let mut registry = ghcr();
        registry.name = Some("registry-server-auth-x1".to_string());
        registry.resource_version = Some("42".to_string());
        registry.clear_identity();
        assert_eq!(registry.name, None);
        assert_eq!(registry.resource_version, None);
        assert_eq!(registry.server_url(), Some("https://ghcr.io/org"));
    }
}
