//! PostgreSQL on RDS, prepared for a Prisma application
//!
//! Declaration order:
//!
//! 1. security group admitting 5432 from the given groups
//! 2. subnet group
//! 3. the instance, with its master password managed by RDS
//! 4. a lookup of the generated master credential
//! 5. an administrative PostgreSQL provider using that credential
//! 6. a short-lived login role, then the optional migration command
//! 7. application roles, their grants and their `rds_iam` membership
//!
//! Step 7 waits for the migration through explicit edges: the migration
//! produces nothing the roles read, but the objects they are granted on only
//! exist once it has run.

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use chrono::Utc;
use infrakit_cloud::naming::build_resource_name;
use infrakit_cloud::{
    Component, DeclareOptions, Input, Layered, OutputRef, Properties, ProviderContext,
    ResourceGraph, ResourceHandle, Scope, SecretRef, resolve,
};
use infrakit_postgres::{
    DEFAULT_PORT, GrantArgs, PostgresProvider, PostgresProviderArgs, PostgresResourceType,
    RoleArgs, declare_grant, declare_role, declare_role_grant, valid_until,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Lifetime of the temporary role and the role passwords
pub const CREDENTIAL_TTL_MINUTES: i64 = 30;
/// Role granting IAM database authentication
pub const RDS_IAM_ROLE: &str = "rds_iam";
const GENERATED_PASSWORD_LENGTH: u32 = 32;

/// Instance sizing and engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RdsInstanceSettings {
    pub engine: String,
    pub engine_version: String,
    pub instance_class: String,
    pub allocated_storage: u32,
    pub max_allocated_storage: u32,
    pub username: String,
}

impl Default for RdsInstanceSettings {
    fn default() -> Self {
        Self {
            engine: "postgres".into(),
            engine_version: "16.1".into(),
            instance_class: "db.t3.micro".into(),
            allocated_storage: 20,
            max_allocated_storage: 100,
            username: "postgres".into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RdsInstanceOverrides {
    pub engine: Option<String>,
    pub engine_version: Option<String>,
    pub instance_class: Option<String>,
    pub allocated_storage: Option<u32>,
    pub max_allocated_storage: Option<u32>,
    pub username: Option<String>,
}

impl Layered for RdsInstanceSettings {
    type Overrides = RdsInstanceOverrides;

    fn overlay(self, overrides: &RdsInstanceOverrides) -> Self {
        Self {
            engine: overrides.engine.clone().unwrap_or(self.engine),
            engine_version: overrides.engine_version.clone().unwrap_or(self.engine_version),
            instance_class: overrides.instance_class.clone().unwrap_or(self.instance_class),
            allocated_storage: overrides.allocated_storage.unwrap_or(self.allocated_storage),
            max_allocated_storage: overrides
                .max_allocated_storage
                .unwrap_or(self.max_allocated_storage),
            username: overrides.username.clone().unwrap_or(self.username),
        }
    }
}

/// An application role and what it may do
#[derive(Debug, Clone)]
pub struct RdsRole {
    pub name: String,
    pub grants: Vec<GrantArgs>,
    /// Login password; generated when absent
    pub password: Option<SecretRef>,
}

/// Schema migration run against the new database
///
/// The command receives the connection string of the temporary role in
/// `DATABASE_URL`. A non-zero exit fails the apply.
#[derive(Debug, Clone)]
pub struct MigrationCommand {
    pub command: String,
    pub working_dir: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RdsPrismaPostgresDbArgs {
    pub name: String,
    pub database_name: String,
    pub availability_zone: Input,
    pub subnet_ids: Input,
    pub vpc_id: Input,
    /// Groups allowed to connect on 5432
    pub security_group_ids: Input,
    pub roles: Vec<RdsRole>,
    pub migration: Option<MigrationCommand>,
    pub settings: RdsInstanceOverrides,
    /// Extra instance properties; the managed fields always win over these
    pub extra: Properties,
}

/// Declarations made for one application role
#[derive(Debug, Clone)]
pub struct RdsRoleHandles {
    pub original_name: String,
    pub role: ResourceHandle,
    pub grants: Vec<ResourceHandle>,
    pub iam_grant: ResourceHandle,
}

#[derive(Debug, Clone)]
pub struct RdsPrismaPostgresDb {
    handle: ResourceHandle,
    pub settings: RdsInstanceSettings,
    pub security_group: ResourceHandle,
    pub subnet_group: ResourceHandle,
    pub db: ResourceHandle,
    pub master_secret: ResourceHandle,
    pub provider: PostgresProvider,
    pub temp_role: ResourceHandle,
    pub migration: Option<ResourceHandle>,
    pub roles: Vec<RdsRoleHandles>,
}

impl RdsPrismaPostgresDb {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: RdsPrismaPostgresDbArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::DatabaseInstance;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;
        let settings = resolve(RdsInstanceSettings::default(), &args.settings);

        let security_group = scope.resource(
            tokens::SECURITY_GROUP,
            scope.name_for(
                AwsResourceType::SecurityGroup.as_str(),
                &format!("{}-rds", args.name),
            ),
            Properties::new()
                .with("vpcId", args.vpc_id)
                .with("description", "Allow traffic from within subnet and Fargate")
                .with(
                    "ingress",
                    vec![Input::from(
                        Properties::new()
                            .with("protocol", "tcp")
                            .with("fromPort", DEFAULT_PORT)
                            .with("toPort", DEFAULT_PORT)
                            .with("securityGroups", args.security_group_ids),
                    )],
                ),
        )?;

        let subnet_group = scope.resource(
            tokens::RDS_SUBNET_GROUP,
            scope.name(AwsResourceType::SubnetGroup.as_str()),
            Properties::new().with("subnetIds", args.subnet_ids),
        )?;

        let rds_name = scope.name(kind.as_str());
        let managed = Properties::new()
            .with("allocatedStorage", settings.allocated_storage)
            .with("maxAllocatedStorage", settings.max_allocated_storage)
            .with("dbName", args.database_name.as_str())
            .with("identifier", rds_name.as_str())
            .with("engine", settings.engine.as_str())
            .with("username", settings.username.as_str())
            .with("engineVersion", settings.engine_version.as_str())
            .with("instanceClass", settings.instance_class.as_str())
            .with("availabilityZone", args.availability_zone)
            .with("manageMasterUserPassword", true)
            .with("iamDatabaseAuthenticationEnabled", true)
            .with("dbSubnetGroupName", subnet_group.output("name"))
            .with("vpcSecurityGroupIds", vec![security_group.output("id")]);
        let db = scope.resource(tokens::RDS_INSTANCE, rds_name.as_str(), resolve(args.extra, &managed))?;

        let master_secret = scope.lookup(
            tokens::GET_SECRET_VERSION,
            format!("{}-master-secret", rds_name),
            Properties::new().with(
                "secretId",
                db.output("masterUserSecrets").index(0).field("secretArn"),
            ),
        )?;
        let credential = SecretRef::output(master_secret.output("secretString"));

        let provider = PostgresProvider::declare(
            &mut scope,
            "pg-provider",
            PostgresProviderArgs::new(
                db.output("address"),
                credential.clone().field("username"),
                credential.field("password"),
                args.database_name.as_str(),
            ),
        )?;
        scope.use_provider(&provider.handle);

        let expires = valid_until(Utc::now(), CREDENTIAL_TTL_MINUTES);
        let temp_role_resource = scope.name(PostgresResourceType::Role.as_str());
        let temp_role_name = format!("{}-{}", temp_role_resource, Uuid::new_v4());
        let temp_password = SecretRef::generated(
            format!("{}-password", temp_role_resource),
            GENERATED_PASSWORD_LENGTH,
        );
        let temp_role = declare_role(
            &mut scope,
            &temp_role_resource,
            RoleArgs::login(temp_role_name.as_str())
                .with_password(temp_password.clone())
                .valid_until(expires.as_str()),
            DeclareOptions::new(),
        )?;

        let migration = match &args.migration {
            Some(migration) => {
                info!(database = %rds_name, command = %migration.command, "Declaring migration");
                let url = Input::concat([
                    Input::from("postgresql://"),
                    temp_role_name.as_str().into(),
                    ":".into(),
                    temp_password.clone().into(),
                    "@".into(),
                    db.output("endpoint").into(),
                    "/".into(),
                    args.database_name.as_str().into(),
                ]);
                let properties = Properties::new()
                    .with("create", migration.command.as_str())
                    .with("environment", Properties::new().with("DATABASE_URL", url))
                    .with_opt("dir", migration.working_dir.clone());
                Some(scope.resource_with(
                    tokens::COMMAND,
                    scope.name(AwsResourceType::Migration.as_str()),
                    properties,
                    DeclareOptions::new().depends_on(&db).depends_on(&temp_role),
                )?)
            }
            None => None,
        };

        let gate = || match &migration {
            Some(migration) => DeclareOptions::new().depends_on(migration),
            None => DeclareOptions::new(),
        };

        let mut roles = Vec::with_capacity(args.roles.len());
        for role in &args.roles {
            let role_name = build_resource_name(
                &scope.names().with_name(role.name.as_str()),
                PostgresResourceType::Role.as_str(),
            );
            debug!(role = %role_name, grants = role.grants.len(), "Declaring application role");

            let handle = declare_role(
                &mut scope,
                &role_name,
                RoleArgs::login(role_name.as_str())
                    .with_password(role.password.clone().unwrap_or_else(|| {
                        SecretRef::generated(
                            format!("{}-password", role_name),
                            GENERATED_PASSWORD_LENGTH,
                        )
                    }))
                    .valid_until(expires.as_str()),
                gate(),
            )?;

            let mut grants = Vec::with_capacity(role.grants.len());
            for (index, grant) in role.grants.iter().enumerate() {
                grants.push(declare_grant(
                    &mut scope,
                    &format!("{}-{}-{}", role_name, grant.object_type.as_str(), index),
                    db.output("dbName"),
                    &role_name,
                    grant,
                    gate().depends_on(&handle),
                )?);
            }

            let iam_name = build_resource_name(
                &scope.names().with_name(format!("{}-iam", role.name)),
                PostgresResourceType::RoleGrant.as_str(),
            );
            let iam_grant = declare_role_grant(
                &mut scope,
                &iam_name,
                RDS_IAM_ROLE,
                role_name.as_str(),
                gate().depends_on(&handle),
            )?;

            roles.push(RdsRoleHandles {
                original_name: role.name.clone(),
                role: handle,
                grants,
                iam_grant,
            });
        }

        Ok(Self {
            handle: scope.finish(),
            settings,
            security_group,
            subnet_group,
            db,
            master_secret,
            provider,
            temp_role,
            migration,
            roles,
        })
    }

    pub fn address(&self) -> OutputRef {
        self.db.output("address")
    }

    pub fn endpoint(&self) -> OutputRef {
        self.db.output("endpoint")
    }

    /// ARN of the Secrets Manager secret RDS keeps the master credential in
    pub fn master_secret_arn(&self) -> OutputRef {
        self.db.output("masterUserSecrets").index(0).field("secretArn")
    }

    /// Master password generated and stored by RDS
    pub fn master_password(&self) -> SecretRef {
        SecretRef::output(self.master_secret.output("secretString")).field("password")
    }

    pub fn role(&self, original_name: &str) -> Option<&RdsRoleHandles> {
        self.roles.iter().find(|r| r.original_name == original_name)
    }
}

impl Component for RdsPrismaPostgresDb {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrakit_cloud::DeclarationKind;
    use infrakit_postgres::GrantObjectType;

    fn args(migration: Option<MigrationCommand>) -> RdsPrismaPostgresDbArgs {
        RdsPrismaPostgresDbArgs {
            name: "shop".into(),
            database_name: "shop".into(),
            availability_zone: "eu-west-2a".into(),
            subnet_ids: vec!["subnet-a", "subnet-b"].into(),
            vpc_id: "vpc-1".into(),
            security_group_ids: vec!["sg-api"].into(),
            roles: vec![RdsRole {
                name: "api".into(),
                grants: vec![
                    GrantArgs::new(GrantObjectType::Table, ["SELECT", "INSERT"]).in_schema("public"),
                    GrantArgs::new(GrantObjectType::Sequence, ["USAGE"]).in_schema("public"),
                ],
                password: None,
            }],
            migration,
            settings: RdsInstanceOverrides::default(),
            extra: Properties::new(),
        }
    }

    #[test]
    fn test_settings_defaults_and_overrides() {
        let defaults = RdsInstanceSettings::default();
        assert_eq!(defaults.engine_version, "16.1");
        assert_eq!(defaults.allocated_storage, 20);
        assert_eq!(defaults.max_allocated_storage, 100);

        let resolved = resolve(
            RdsInstanceSettings::default(),
            &RdsInstanceOverrides {
                instance_class: Some("db.t3.medium".into()),
                ..Default::default()
            },
        );
        assert_eq!(resolved.instance_class, "db.t3.medium");
        assert_eq!(resolved.engine, "postgres");
    }

    #[test]
    fn test_managed_fields_win_over_extra() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let mut args = args(None);
        args.extra = Properties::new()
            .with("manageMasterUserPassword", false)
            .with("backupRetentionPeriod", 7u32);
        let rds = RdsPrismaPostgresDb::new(&mut graph, &ctx, args, DeclareOptions::new()).unwrap();

        let db = graph.get(rds.db.id()).unwrap();
        assert_eq!(db.name, "staging-eu-west-2-database-instance-shop");
        assert_eq!(
            db.properties.get("manageMasterUserPassword").and_then(Input::as_literal),
            Some(&serde_json::Value::Bool(true))
        );
        assert!(db.properties.contains_key("backupRetentionPeriod"));
        assert_eq!(rds.security_group.name(), "staging-eu-west-2-security-group-shop-rds");
    }

    #[test]
    fn test_roles_wait_for_migration() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let rds = RdsPrismaPostgresDb::new(
            &mut graph,
            &ctx,
            args(Some(MigrationCommand {
                command: "npx prisma migrate deploy".into(),
                working_dir: None,
            })),
            DeclareOptions::new(),
        )
        .unwrap();

        let migration = rds.migration.as_ref().unwrap();
        let migration_deps = graph.dependencies_of(migration.id());
        assert!(migration_deps.contains(&rds.db.id()));
        assert!(migration_deps.contains(&rds.temp_role.id()));

        let api = rds.role("api").unwrap();
        assert_eq!(api.role.name(), "staging-eu-west-2-role-api");
        assert_eq!(api.iam_grant.name(), "staging-eu-west-2-role-grant-api-iam");
        assert_eq!(api.grants[1].name(), "staging-eu-west-2-role-api-sequence-1");
        for id in std::iter::once(api.role.id())
            .chain(api.grants.iter().map(ResourceHandle::id))
            .chain(std::iter::once(api.iam_grant.id()))
        {
            assert!(graph.dependencies_of(id).contains(&migration.id()));
        }

        let url = graph.get(migration.id()).unwrap().properties.get("environment").unwrap();
        assert!(url.is_secret());
    }

    #[test]
    fn test_temp_role_is_unique_and_expires() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let rds = RdsPrismaPostgresDb::new(&mut graph, &ctx, args(None), DeclareOptions::new()).unwrap();

        let temp = graph.get(rds.temp_role.id()).unwrap();
        assert_eq!(temp.name, "staging-eu-west-2-role-shop");
        let role_name = temp.properties.get("name").and_then(Input::as_str).unwrap();
        assert!(role_name.starts_with("staging-eu-west-2-role-shop-"));
        assert_eq!(role_name.len(), "staging-eu-west-2-role-shop-".len() + 36);
        assert!(temp.properties.get("password").unwrap().is_secret());
        assert!(temp.properties.contains_key("validUntil"));
        assert!(rds.migration.is_none());
    }

    #[test]
    fn test_credentials_come_from_lookup() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let rds = RdsPrismaPostgresDb::new(&mut graph, &ctx, args(None), DeclareOptions::new()).unwrap();

        let lookup = graph.get(rds.master_secret.id()).unwrap();
        assert_eq!(lookup.kind, DeclarationKind::Lookup);
        assert!(graph.dependencies_of(lookup.id).contains(&rds.db.id()));

        let provider = graph.get(rds.provider.handle.id()).unwrap();
        assert!(provider.properties.get("password").unwrap().is_secret());
        assert!(graph.dependencies_of(provider.id).contains(&rds.master_secret.id()));
        assert_eq!(
            graph.get(rds.temp_role.id()).unwrap().options.provider,
            Some(rds.provider.handle.id())
        );
    }
}
