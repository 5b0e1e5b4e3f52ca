//! Explicit provider configuration context
//!
//! Region, environment and domain are handed to every component constructor
//! instead of being read from process-wide provider configuration.

use crate::naming::{self, NameOptions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Deployment tier label (production, staging, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Environment(String);

impl Environment {
    pub const PRODUCTION: &'static str = "production";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn production() -> Self {
        Self::new(Self::PRODUCTION)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Only the exact label `production` selects production defaults
    pub fn is_production(&self) -> bool {
        self.0 == Self::PRODUCTION
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Environment {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Environment {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Configuration shared by every component of one deployment evaluation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderContext {
    /// Provider region (eu-west-2, nyc3, ...)
    pub region: String,

    /// Deployment tier
    pub environment: Environment,

    /// Apex domain for host names and hosted zones
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Organization owning the stacks, used for stack references
    #[serde(default)]
    pub organization: Option<String>,

    /// Cloud account the stack deploys into, when known up front
    #[serde(default)]
    pub account_id: Option<String>,
}

fn default_domain() -> String {
    naming::DEFAULT_DOMAIN.to_string()
}

impl ProviderContext {
    pub fn new(region: impl Into<String>, environment: impl Into<Environment>) -> Self {
        Self {
            region: region.into(),
            environment: environment.into(),
            domain: default_domain(),
            organization: None,
            account_id: None,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    pub fn with_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// Shared name options for a component called `name`
    pub fn names(&self, name: impl Into<String>) -> NameOptions {
        NameOptions::new(&self.region, self.environment.as_str(), name)
    }

    /// `{name}.{environment}.{domain}`
    pub fn host_name(&self, name: &str) -> String {
        naming::build_host_name_in(&self.domain, self.environment.as_str(), name)
    }

    /// `{environment}.{domain}`, the environment's delegated zone
    pub fn environment_domain(&self) -> String {
        format!("{}.{}", self.environment, self.domain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_production_is_exact() {
        assert!(Environment::production().is_production());
        assert!(!Environment::new("Production").is_production());
        assert!(!Environment::new("prod").is_production());
        assert!(!Environment::new("staging").is_production());
    }

    #[test]
    fn test_context_names() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let names = ctx.names("api");

        assert_eq!(names, NameOptions::new("eu-west-2", "staging", "api"));
        assert_eq!(ctx.host_name("api"), "api.staging.simonnorman.online");
        assert_eq!(ctx.environment_domain(), "staging.simonnorman.online");
    }

    #[test]
    fn test_context_deserializes_with_defaults() {
        let ctx: ProviderContext =
            serde_json::from_str(r#"{"region":"eu-west-2","environment":"production"}"#)
                .unwrap();

        assert!(ctx.environment.is_production());
        assert_eq!(ctx.domain, "simonnorman.online");
        assert!(ctx.organization.is_none());
    }
}
