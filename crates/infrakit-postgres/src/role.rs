//! Roles and role memberships

use crate::error::{PostgresError, Result};
use crate::resource_types::tokens;
use chrono::{DateTime, Duration, Utc};
use infrakit_cloud::{DeclareOptions, Input, Properties, ResourceHandle, Scope};
use tracing::debug;

/// Login role settings
#[derive(Debug, Clone)]
pub struct RoleArgs {
    /// Role name inside the database
    pub name: String,
    pub login: bool,
    pub password: Option<Input>,
    /// `VALID UNTIL` timestamp, see [`valid_until`]
    pub valid_until: Option<String>,
}

impl RoleArgs {
    pub fn login(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            login: true,
            password: None,
            valid_until: None,
        }
    }

    pub fn with_password(mut self, password: impl Into<Input>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn valid_until(mut self, timestamp: impl Into<String>) -> Self {
        self.valid_until = Some(timestamp.into());
        self
    }
}

/// Timestamp `minutes` after `now`, as `YYYY-MM-DD HH:MM:SS.mmm`
pub fn valid_until(now: DateTime<Utc>, minutes: i64) -> String {
    (now + Duration::minutes(minutes))
        .format("%Y-%m-%d %H:%M:%S%.3f")
        .to_string()
}

pub fn declare_role(
    scope: &mut Scope<'_>,
    resource_name: &str,
    args: RoleArgs,
    options: DeclareOptions,
) -> Result<ResourceHandle> {
    if args.name.is_empty() {
        return Err(PostgresError::InvalidRole(format!(
            "role declared as {} has no name",
            resource_name
        )));
    }

    debug!(role = %args.name, "Declaring role");
    let properties = Properties::new()
        .with("name", args.name)
        .with("login", args.login)
        .with_opt("password", args.password)
        .with_opt("validUntil", args.valid_until);

    Ok(scope.resource_with(tokens::ROLE, resource_name, properties, options)?)
}

/// Grant membership of `grant_role` (e.g. `rds_iam`) to `role`
pub fn declare_role_grant(
    scope: &mut Scope<'_>,
    resource_name: &str,
    grant_role: &str,
    role: impl Into<Input>,
    options: DeclareOptions,
) -> Result<ResourceHandle> {
    let properties = Properties::new()
        .with("grantRole", grant_role)
        .with("role", role);

    Ok(scope.resource_with(tokens::GRANT_ROLE, resource_name, properties, options)?)
}
