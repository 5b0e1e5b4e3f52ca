//! FusionAuth on EC2 backed by its own PostgreSQL instance
//!
//! The database is a child [`RdsPrismaPostgresDb`] with a `fusionauth` role
//! that owns everything in `fusion_auth`. At boot the instance reads that
//! role's password from Secrets Manager, so its IAM role may read the
//! FusionAuth secret and the RDS master credential.

use crate::arn::managed_policy;
use crate::database::{MigrationCommand, RdsPrismaPostgresDb, RdsPrismaPostgresDbArgs, RdsRole};
use crate::error::Result;
use crate::policy::{PolicyDocument, PolicyStatement};
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use crate::services::fusion_auth_server::{
    DEFAULT_AMI, Ec2Sizing, Ec2SizingOverrides, FUSIONAUTH_PORT,
};
use infrakit_cloud::{
    Component, DeclareOptions, Input, Properties, ProviderContext, ResourceGraph, ResourceHandle,
    Scope, SecretRef, resolve_for_environment,
};
use infrakit_postgres::{GrantArgs, GrantObjectType};
use tracing::debug;

/// Secret holding the `fusionauth` role password under `PASSWORD`
pub const FUSIONAUTH_SECRET_NAME: &str = "fusion-auth-rds-secret/doppler";
pub const FUSIONAUTH_DATABASE: &str = "fusion_auth";
pub const FUSIONAUTH_DB_ROLE: &str = "fusionauth";
const MIGRATION_SCRIPT: &str = "./migration-script.sh";
const USER_DATA_BODY: &str = include_str!("fusion_auth_db_user_data.sh");

/// Placement of the database
#[derive(Debug, Clone)]
pub struct FusionAuthDatabaseArgs {
    pub availability_zone: Input,
    pub subnet_ids: Input,
}

#[derive(Debug, Clone)]
pub struct FusionAuthDbServerArgs {
    pub name: String,
    pub vpc_id: Input,
    pub subnet_id: Input,
    /// Password of the `fusionauth` database role
    pub fusion_auth_password: SecretRef,
    pub database: FusionAuthDatabaseArgs,
    pub migration: Option<MigrationCommand>,
    pub ami: String,
    pub sizing: Ec2SizingOverrides,
}

impl FusionAuthDbServerArgs {
    pub fn new(
        name: impl Into<String>,
        vpc_id: impl Into<Input>,
        subnet_id: impl Into<Input>,
        fusion_auth_password: SecretRef,
        database: FusionAuthDatabaseArgs,
    ) -> Self {
        Self {
            name: name.into(),
            vpc_id: vpc_id.into(),
            subnet_id: subnet_id.into(),
            fusion_auth_password,
            database,
            migration: Some(MigrationCommand {
                command: MIGRATION_SCRIPT.into(),
                working_dir: None,
            }),
            ami: DEFAULT_AMI.into(),
            sizing: Ec2SizingOverrides::default(),
        }
    }
}

fn in_public(object_type: GrantObjectType, privileges: &[&str]) -> GrantArgs {
    GrantArgs::new(object_type, privileges.iter().copied()).in_schema("public")
}

/// Everything FusionAuth needs to own its schema
fn fusion_auth_grants() -> Vec<GrantArgs> {
    vec![
        in_public(GrantObjectType::Table, &["ALL"]),
        in_public(GrantObjectType::Sequence, &["ALL"]),
        in_public(GrantObjectType::Function, &["ALL"]),
        in_public(GrantObjectType::Procedure, &["ALL"]),
        in_public(GrantObjectType::Type, &["USAGE"]),
        in_public(GrantObjectType::Schema, &["CREATE", "USAGE"]),
        GrantArgs::new(GrantObjectType::Database, ["ALL"]),
    ]
}

#[derive(Debug, Clone)]
pub struct FusionAuthDbServer {
    handle: ResourceHandle,
    pub sizing: Ec2Sizing,
    pub security_group: ResourceHandle,
    pub db: RdsPrismaPostgresDb,
    pub fusion_auth_secret: ResourceHandle,
    pub role: ResourceHandle,
    pub role_policy: ResourceHandle,
    pub instance_profile: ResourceHandle,
    pub instance: ResourceHandle,
}

impl FusionAuthDbServer {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: FusionAuthDbServerArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::FusionAuthServer;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;
        let server_name = scope.component().name().to_string();
        debug!(server = %server_name, database = FUSIONAUTH_DATABASE, "Declaring FusionAuth host");

        let security_group = scope.resource(
            tokens::SECURITY_GROUP,
            scope.name_for(AwsResourceType::SecurityGroup.as_str(), "fusion-auth-server"),
            Properties::new()
                .with("vpcId", args.vpc_id.clone())
                .with(
                    "ingress",
                    vec![
                        Properties::new()
                            .with("protocol", "tcp")
                            .with("fromPort", FUSIONAUTH_PORT)
                            .with("toPort", FUSIONAUTH_PORT)
                            .with("cidrBlocks", vec!["0.0.0.0/0"]),
                    ],
                )
                .with(
                    "egress",
                    vec![
                        Properties::new()
                            .with("protocol", "-1")
                            .with("fromPort", 0u16)
                            .with("toPort", 0u16)
                            .with("cidrBlocks", vec!["0.0.0.0/0"]),
                    ],
                ),
        )?;

        let child_options = scope.child_options();
        let db = RdsPrismaPostgresDb::new(
            scope.graph(),
            ctx,
            RdsPrismaPostgresDbArgs {
                name: "fusion-auth-db-instance".into(),
                database_name: FUSIONAUTH_DATABASE.into(),
                availability_zone: args.database.availability_zone,
                subnet_ids: args.database.subnet_ids,
                vpc_id: args.vpc_id,
                security_group_ids: vec![security_group.output("id")].into(),
                roles: vec![RdsRole {
                    name: FUSIONAUTH_DB_ROLE.into(),
                    grants: fusion_auth_grants(),
                    password: Some(args.fusion_auth_password),
                }],
                migration: args.migration,
                settings: Default::default(),
                extra: Properties::new().with("publiclyAccessible", true),
            },
            child_options,
        )?;

        let fusion_auth_secret = scope.lookup(
            tokens::GET_SECRET,
            FUSIONAUTH_SECRET_NAME,
            Properties::new().with("name", FUSIONAUTH_SECRET_NAME),
        )?;

        let role = scope.resource(
            tokens::IAM_ROLE,
            scope.name_for(AwsResourceType::Role.as_str(), "fusion-auth-db-agent-role"),
            Properties::new().with(
                "assumeRolePolicy",
                Input::json(PolicyDocument::assume_role_by_service("ec2.amazonaws.com")),
            ),
        )?;
        let role_policy = scope.resource(
            tokens::IAM_ROLE_POLICY,
            scope.name_for(AwsResourceType::RolePolicy.as_str(), "fusion-auth-server-policy"),
            Properties::new().with("role", role.output("id")).with(
                "policy",
                PolicyDocument::new().statement(
                    PolicyStatement::allow(["secretsmanager:GetSecretValue"])
                        .on(fusion_auth_secret.output("arn"))
                        .on(db.master_secret_arn()),
                ),
            ),
        )?;
        scope.resource(
            tokens::IAM_ROLE_POLICY_ATTACHMENT,
            scope.name_for(AwsResourceType::PolicyAttachment.as_str(), "fusion-auth-db-ssm-agent"),
            Properties::new()
                .with("role", role.output("name"))
                .with("policyArn", managed_policy("service-role/AmazonEC2RoleforSSM")),
        )?;
        let instance_profile = scope.resource(
            tokens::IAM_INSTANCE_PROFILE,
            scope.name_for(AwsResourceType::InstanceProfile.as_str(), "fusion-auth-db-profile"),
            Properties::new().with("role", role.output("name")),
        )?;

        let user_data = Input::concat([
            Input::from("#!/bin/bash\nSECRET_ID=\""),
            fusion_auth_secret.output("arn").into(),
            Input::from("\"\n"),
            Input::from(USER_DATA_BODY),
        ]);

        let sizing: Ec2Sizing = resolve_for_environment(&ctx.environment, &args.sizing);
        let instance_name = format!("{}-instance", server_name);
        // Boot reads the secret, so the policy must exist first
        let instance = scope.resource_with(
            tokens::INSTANCE,
            instance_name.as_str(),
            Properties::new()
                .with("ami", args.ami.as_str())
                .with("instanceType", sizing.instance_type.as_str())
                .with("vpcSecurityGroupIds", vec![security_group.output("id")])
                .with("iamInstanceProfile", instance_profile.output("name"))
                .with("userData", user_data)
                .with("subnetId", args.subnet_id)
                .with("userDataReplaceOnChange", true)
                .with("tags", Properties::new().with("Name", instance_name.as_str())),
            DeclareOptions::new()
                .depends_on(&role_policy)
                .replace_on_changes(["userData"]),
        )?;

        Ok(Self {
            handle: scope.finish(),
            sizing,
            security_group,
            db,
            fusion_auth_secret,
            role,
            role_policy,
            instance_profile,
            instance,
        })
    }
}

impl Component for FusionAuthDbServer {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
