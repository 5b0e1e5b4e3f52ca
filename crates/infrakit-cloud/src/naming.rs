//! Deterministic resource naming
//!
//! Every declared resource gets a name derived from `{region, environment, name, type}`.
//! Four scoping strategies exist, from most to least specific:
//!
//! | strategy | shape | used for |
//! |---|---|---|
//! | regional | `{environment}-{region}-{type}-{name}` | almost everything |
//! | cross-region | `{environment}-{type}-{name}` | resources shared by all regions of an environment |
//! | cross-environment | `{region}-{type}-{name}` | resources shared by all environments (master DNS zone) |
//! | project-wide | `{type}-{name}` | account-global IAM entities |
//!
//! Names are pure functions of their inputs. Two components that pass the same
//! `name` in the same scope produce the same identifier; nothing here detects that,
//! the engine rejects the second declaration when it is applied.

use serde::{Deserialize, Serialize};

/// Domain used for service host names when the context does not override it
pub const DEFAULT_DOMAIN: &str = "simonnorman.online";

/// Shared name options carried by every regional component
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NameOptions {
    pub region: String,
    pub environment: String,
    pub name: String,
}

impl NameOptions {
    pub fn new(
        region: impl Into<String>,
        environment: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            environment: environment.into(),
            name: name.into(),
        }
    }

    /// Same region and environment, different name
    pub fn with_name(&self, name: impl Into<String>) -> Self {
        Self {
            region: self.region.clone(),
            environment: self.environment.clone(),
            name: name.into(),
        }
    }

    /// Same scope, name extended with `-{suffix}`
    pub fn suffixed(&self, suffix: impl AsRef<str>) -> Self {
        self.with_name(format!("{}-{}", self.name, suffix.as_ref()))
    }
}

/// Scoping strategy for a resource name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NameScope {
    /// Scoped by environment, region, type and name
    Regional,
    /// Scoped by type and name only
    ProjectWide,
    /// Scoped by environment, type and name
    CrossRegion,
    /// Scoped by region, type and name
    CrossEnvironment,
}

/// The full identity tuple a name is derived from
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceIdentity {
    pub region: String,
    pub environment: String,
    pub resource_type: String,
    pub name: String,
}

impl ResourceIdentity {
    pub fn new(opts: &NameOptions, resource_type: impl Into<String>) -> Self {
        Self {
            region: opts.region.clone(),
            environment: opts.environment.clone(),
            resource_type: resource_type.into(),
            name: opts.name.clone(),
        }
    }

    /// Render the identity under the given scoping strategy
    pub fn render(&self, scope: NameScope) -> String {
        match scope {
            NameScope::Regional => format!(
                "{}-{}-{}-{}",
                self.environment, self.region, self.resource_type, self.name
            ),
            NameScope::ProjectWide => {
                build_project_wide_resource_name(&self.resource_type, &self.name)
            }
            NameScope::CrossRegion => build_cross_region_resource_name(
                &self.environment,
                &self.resource_type,
                &self.name,
            ),
            NameScope::CrossEnvironment => build_cross_environment_resource_name(
                &self.region,
                &self.resource_type,
                &self.name,
            ),
        }
    }
}

/// `{environment}-{region}-{type}-{name}`
pub fn build_resource_name(opts: &NameOptions, resource_type: &str) -> String {
    ResourceIdentity::new(opts, resource_type).render(NameScope::Regional)
}

/// `{type}-{name}`
pub fn build_project_wide_resource_name(resource_type: &str, name: &str) -> String {
    format!("{}-{}", resource_type, name)
}

/// `{environment}-{type}-{name}`
pub fn build_cross_region_resource_name(
    environment: &str,
    resource_type: &str,
    name: &str,
) -> String {
    format!("{}-{}-{}", environment, resource_type, name)
}

/// `{region}-{type}-{name}`
pub fn build_cross_environment_resource_name(
    region: &str,
    resource_type: &str,
    name: &str,
) -> String {
    format!("{}-{}-{}", region, resource_type, name)
}

/// `{name}.{environment}.simonnorman.online`
pub fn build_host_name(environment: &str, name: &str) -> String {
    build_host_name_in(DEFAULT_DOMAIN, environment, name)
}

/// `{name}.{environment}.{domain}`
pub fn build_host_name_in(domain: &str, environment: &str, name: &str) -> String {
    format!("{}.{}.{}", name, environment, domain)
}

/// `{provider}:{type}`, the type token of a component
pub fn build_resource_type_name(provider: &str, resource_type: &str) -> String {
    format!("{}:{}", provider, resource_type)
}

/// Regional component name together with the shared options it was derived from
pub fn build_component_name(opts: &NameOptions, resource_type: &str) -> (String, NameOptions) {
    (build_resource_name(opts, resource_type), opts.clone())
}

/// `{organization}/{product}-{region}-{name}/{environment}`
pub fn build_stack_reference(
    organization: &str,
    product: &str,
    region: &str,
    name: &str,
    environment: &str,
) -> String {
    format!(
        "{}/{}-{}-{}/{}",
        organization, product, region, name, environment
    )
}
