//! Privilege grants

use crate::error::{PostgresError, Result};
use crate::resource_types::tokens;
use infrakit_cloud::{DeclareOptions, Input, Properties, ResourceHandle, Scope};
use serde::{Deserialize, Serialize};

/// Object class a grant applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantObjectType {
    Database,
    Schema,
    Table,
    Sequence,
    Function,
    Procedure,
    Type,
}

impl GrantObjectType {
    pub fn as_str(self) -> &'static str {
        match self {
            GrantObjectType::Database => "database",
            GrantObjectType::Schema => "schema",
            GrantObjectType::Table => "table",
            GrantObjectType::Sequence => "sequence",
            GrantObjectType::Function => "function",
            GrantObjectType::Procedure => "procedure",
            GrantObjectType::Type => "type",
        }
    }

    fn needs_schema(self) -> bool {
        !matches!(self, GrantObjectType::Database)
    }
}

/// One grant of a role, without the role itself
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantArgs {
    pub object_type: GrantObjectType,
    pub privileges: Vec<String>,
    #[serde(default)]
    pub schema: Option<String>,
    /// Specific objects; empty means every object of the type in the schema
    #[serde(default)]
    pub objects: Vec<String>,
}

impl GrantArgs {
    pub fn new<I, S>(object_type: GrantObjectType, privileges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            object_type,
            privileges: privileges.into_iter().map(Into::into).collect(),
            schema: None,
            objects: Vec::new(),
        }
    }

    pub fn in_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn on_objects<I, S>(mut self, objects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.objects = objects.into_iter().map(Into::into).collect();
        self
    }

    /// Check the grant is expressible before it is declared
    pub fn validate(&self, role: &str) -> Result<()> {
        let invalid = |reason: &str| PostgresError::InvalidGrant {
            role: role.to_string(),
            reason: reason.to_string(),
        };

        if self.privileges.is_empty() {
            return Err(invalid("no privileges"));
        }
        if self.object_type.needs_schema() && self.schema.is_none() {
            return Err(invalid(&format!(
                "{} grants need a schema",
                self.object_type.as_str()
            )));
        }
        if self.object_type == GrantObjectType::Database && !self.objects.is_empty() {
            return Err(invalid("database grants cannot name objects"));
        }
        Ok(())
    }
}

/// Declare `grant` for `role` on `database`
pub fn declare_grant(
    scope: &mut Scope<'_>,
    resource_name: &str,
    database: impl Into<Input>,
    role: &str,
    grant: &GrantArgs,
    options: DeclareOptions,
) -> Result<ResourceHandle> {
    grant.validate(role)?;

    let properties = Properties::new()
        .with("database", database)
        .with("role", role)
        .with("objectType", grant.object_type.as_str())
        .with("privileges", grant.privileges.clone())
        .with_opt("schema", grant.schema.clone())
        .with_opt(
            "objects",
            (!grant.objects.is_empty()).then(|| grant.objects.clone()),
        );

    Ok(scope.resource_with(tokens::GRANT, resource_name, properties, options)?)
}
