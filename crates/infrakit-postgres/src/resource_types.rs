//! PostgreSQL naming kinds and type tokens

use std::fmt;

/// Name segment of a PostgreSQL declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostgresResourceType {
    Database,
    Role,
    RoleGrant,
}

impl PostgresResourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            PostgresResourceType::Database => "database",
            PostgresResourceType::Role => "role",
            PostgresResourceType::RoleGrant => "role-grant",
        }
    }
}

impl fmt::Display for PostgresResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `postgresql:{kind}`, the component type token
pub fn postgres_resource_type(kind: PostgresResourceType) -> String {
    infrakit_cloud::naming::build_resource_type_name("postgresql", kind.as_str())
}

/// Provider type tokens of the declared resources
pub mod tokens {
    pub const PROVIDER: &str = "pulumi:providers:postgresql";
    pub const DATABASE: &str = "postgresql:index/database:Database";
    pub const ROLE: &str = "postgresql:index/role:Role";
    pub const GRANT: &str = "postgresql:index/grant:Grant";
    pub const GRANT_ROLE: &str = "postgresql:index/grantRole:GrantRole";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_tokens() {
        assert_eq!(
            postgres_resource_type(PostgresResourceType::RoleGrant),
            "postgresql:role-grant"
        );
        assert_eq!(PostgresResourceType::Database.to_string(), "database");
    }
}
