//! Account-global IAM roles and user groups
//!
//! IAM entities are not regional, so everything here is named with the
//! project-wide strategy (`user-group-local-admin`).

use crate::arn::managed_policy;
use crate::error::Result;
use crate::policy::{PolicyDocument, PolicyStatement};
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::naming::build_project_wide_resource_name;
use infrakit_cloud::{
    Component, DeclareOptions, Properties, ProviderContext, ResourceGraph, ResourceHandle, Scope,
};
use tracing::debug;

fn open_project_wide<'g>(
    graph: &'g mut ResourceGraph,
    ctx: &'g ProviderContext,
    kind: AwsResourceType,
    name: &str,
    options: DeclareOptions,
) -> Result<(Scope<'g>, String)> {
    let resource_name = build_project_wide_resource_name(kind.as_str(), name);
    let scope = Scope::open_named(
        graph,
        ctx,
        &aws_resource_type(kind),
        ctx.names(name),
        resource_name.clone(),
        options,
    )?;
    Ok((scope, resource_name))
}

/// Role that other AWS accounts may assume, with one permissions policy
#[derive(Debug, Clone)]
pub struct CrossAccountAccessRole {
    handle: ResourceHandle,
    pub role: ResourceHandle,
    pub policy: ResourceHandle,
}

#[derive(Debug, Clone)]
pub struct CrossAccountAccessRoleArgs {
    pub name: String,
    pub trusted_account_ids: Vec<String>,
    pub policy: PolicyDocument,
}

impl CrossAccountAccessRole {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: CrossAccountAccessRoleArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let (mut scope, role_name) =
            open_project_wide(graph, ctx, AwsResourceType::Role, &args.name, options)?;

        let role = scope.resource(
            tokens::IAM_ROLE,
            role_name.as_str(),
            Properties::new()
                .with("name", role_name.as_str())
                .with(
                    "assumeRolePolicy",
                    PolicyDocument::assume_role_by_accounts(&args.trusted_account_ids),
                ),
        )?;

        let policy_name =
            build_project_wide_resource_name(AwsResourceType::PermissionsPolicy.as_str(), &args.name);
        let policy = scope.resource(
            tokens::IAM_POLICY,
            policy_name.as_str(),
            Properties::new()
                .with("name", policy_name.as_str())
                .with("policy", args.policy),
        )?;

        scope.resource(
            tokens::IAM_ROLE_POLICY_ATTACHMENT,
            build_project_wide_resource_name(AwsResourceType::PolicyAttachment.as_str(), &args.name),
            Properties::new()
                .with("role", role.output("name"))
                .with("policyArn", policy.output("arn")),
        )?;

        Ok(Self {
            handle: scope.finish(),
            role,
            policy,
        })
    }
}

impl Component for CrossAccountAccessRole {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// Attach each managed policy to `group` as `{group}-{suffix}-access`
fn attach_managed_policies(
    scope: &mut Scope<'_>,
    group: &ResourceHandle,
    policies: &[(&str, &str)],
) -> Result<Vec<ResourceHandle>> {
    let mut attachments = Vec::with_capacity(policies.len());
    for (suffix, policy) in policies {
        debug!(group = %group.name(), policy = %policy, "Attaching managed policy");
        attachments.push(scope.resource(
            tokens::IAM_GROUP_POLICY_ATTACHMENT,
            format!("{}-{}-access", group.name(), suffix),
            Properties::new()
                .with("policyArn", managed_policy(policy))
                .with("group", group.output("name")),
        )?);
    }
    Ok(attachments)
}

const CI_CD_POLICIES: &[(&str, &str)] = &[
    ("vpc", "AmazonVPCFullAccess"),
    ("ecs", "AmazonECS_FullAccess"),
    ("rds", "AmazonRDSFullAccess"),
    ("alb", "ElasticLoadBalancingFullAccess"),
    ("route53", "AmazonRoute53FullAccess"),
    ("acm", "AWSCertificateManagerFullAccess"),
    ("ecr", "AmazonEC2ContainerRegistryFullAccess"),
    ("cloudwatch", "CloudWatchLogsFullAccess"),
    ("iam", "IAMReadOnlyAccess"),
];

const LOCAL_ADMIN_POLICIES: &[(&str, &str)] = &[
    ("vpc", "AmazonVPCFullAccess"),
    ("iam", "IAMFullAccess"),
    ("ecs", "AmazonECS_FullAccess"),
    ("rds", "AmazonRDSFullAccess"),
    ("alb", "ElasticLoadBalancingFullAccess"),
    ("route53", "AmazonRoute53FullAccess"),
    ("ecr", "AmazonEC2ContainerRegistryFullAccess"),
    ("secrets", "SecretsManagerReadWrite"),
    ("cloudwatch", "CloudWatchLogsFullAccess"),
];

/// Group for pipeline users deploying the stacks
#[derive(Debug, Clone)]
pub struct CiCdUserGroup {
    handle: ResourceHandle,
    pub group: ResourceHandle,
    pub attachments: Vec<ResourceHandle>,
}

impl CiCdUserGroup {
    pub const GROUP_NAME: &'static str = "ci-cd-user-group";

    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        options: DeclareOptions,
    ) -> Result<Self> {
        let (mut scope, group_name) =
            open_project_wide(graph, ctx, AwsResourceType::UserGroup, Self::GROUP_NAME, options)?;

        let group = scope.resource(tokens::IAM_GROUP, group_name, Properties::new())?;
        let attachments = attach_managed_policies(&mut scope, &group, CI_CD_POLICIES)?;

        Ok(Self {
            handle: scope.finish(),
            group,
            attachments,
        })
    }
}

impl Component for CiCdUserGroup {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// Client VPN, certificate, EC2 and queue permissions for local administrators
pub fn vpn_management_policy() -> PolicyDocument {
    PolicyDocument::new()
        .statement(
            PolicyStatement::allow([
                "ec2:CreateClientVpnEndpoint",
                "ec2:DeleteClientVpnEndpoint",
                "ec2:DescribeClientVpnEndpoints",
                "ec2:ModifyClientVpnEndpoint",
                "ec2:AuthorizeClientVpnIngress",
                "ec2:RevokeClientVpnIngress",
                "ec2:CreateClientVpnRoute",
                "ec2:DeleteClientVpnRoute",
                "ec2:DescribeClientVpnRoutes",
                "ec2:DescribeClientVpnTargetNetworks",
                "ec2:AssociateClientVpnTargetNetwork",
                "ec2:DisassociateClientVpnTargetNetwork",
                "ec2:CreateClientVpnAuthorizationRule",
                "ec2:DeleteClientVpnAuthorizationRule",
                "ec2:DescribeClientVpnAuthorizationRules",
            ])
            .on_any(),
        )
        .statement(
            PolicyStatement::allow([
                "acm:DescribeCertificate",
                "acm:ListCertificates",
                "acm:DeleteCertificate",
                "acm:GetCertificate",
                "acm:ListTagsForCertificate",
                "acm:GetAccountConfiguration",
                "acm:RequestCertificate",
            ])
            .on_any(),
        )
        .statement(PolicyStatement::allow(["ec2:*"]).on_any())
        .statement(
            PolicyStatement::allow([
                "lambda:ListLayerVersions",
                "lambda:ListLayers",
                "lambda:CreateFunction",
                "lambda:CreateEventSourceMapping",
                "lambda:ListEventSourceMappings",
                "lambda:DeleteEventSourceMapping",
                "sqs:CreateQueue",
                "sqs:DeleteQueue",
                "sqs:ListQueues",
                "sqs:ListQueueTags",
                "sqs:GetQueueAttributes",
                "sqs:SetQueueAttributes",
                "sqs:SendMessage",
                "sqs:ReceiveMessage",
                "sqs:DeleteMessage",
                "sqs:PurgeQueue",
                "lambda:GetLayerVersion",
            ])
            .on_any(),
        )
}

/// Group for engineers administering the account from their machines
#[derive(Debug, Clone)]
pub struct LocalAdminUserGroup {
    handle: ResourceHandle,
    pub group: ResourceHandle,
    pub attachments: Vec<ResourceHandle>,
    pub vpn_management_policy: ResourceHandle,
}

impl LocalAdminUserGroup {
    pub const GROUP_NAME: &'static str = "local-admin";

    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        options: DeclareOptions,
    ) -> Result<Self> {
        let (mut scope, group_name) =
            open_project_wide(graph, ctx, AwsResourceType::UserGroup, Self::GROUP_NAME, options)?;

        let group = scope.resource(tokens::IAM_GROUP, group_name.as_str(), Properties::new())?;
        let mut attachments = attach_managed_policies(&mut scope, &group, LOCAL_ADMIN_POLICIES)?;

        let vpn_management_policy = scope.resource(
            tokens::IAM_POLICY,
            format!("{}-vpn-management-policy", group_name),
            Properties::new().with("policy", vpn_management_policy()),
        )?;
        attachments.push(scope.resource(
            tokens::IAM_GROUP_POLICY_ATTACHMENT,
            format!("{}-vpn-mgmt-attach", group_name),
            Properties::new()
                .with("policyArn", vpn_management_policy.output("arn"))
                .with("group", group.output("name")),
        )?);

        Ok(Self {
            handle: scope.finish(),
            group,
            attachments,
            vpn_management_policy,
        })
    }
}

impl Component for LocalAdminUserGroup {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrakit_cloud::Input;

    #[test]
    fn test_ci_cd_group_is_project_wide() {
        let mut graph = ResourceGraph::new();
        let staging = ProviderContext::new("eu-west-2", "staging");
        let group = CiCdUserGroup::new(&mut graph, &staging, DeclareOptions::new()).unwrap();

        assert_eq!(group.group.name(), "user-group-ci-cd-user-group");
        assert_eq!(group.attachments.len(), 9);
        assert_eq!(
            group.attachments[8].name(),
            "user-group-ci-cd-user-group-iam-access"
        );
        let iam = graph.get(group.attachments[8].id()).unwrap();
        assert_eq!(
            iam.properties.get("policyArn").and_then(Input::as_str),
            Some("arn:aws:iam::aws:policy/IAMReadOnlyAccess")
        );
    }

    #[test]
    fn test_local_admin_group_has_vpn_policy() {
        let mut graph = ResourceGraph::new();
        let ctx = ProviderContext::new("eu-west-2", "production");
        let group = LocalAdminUserGroup::new(&mut graph, &ctx, DeclareOptions::new()).unwrap();

        assert_eq!(group.group.name(), "user-group-local-admin");
        assert_eq!(group.attachments.len(), 10);
        assert_eq!(
            group.vpn_management_policy.name(),
            "user-group-local-admin-vpn-management-policy"
        );
        let attach = graph
            .find(tokens::IAM_GROUP_POLICY_ATTACHMENT, "user-group-local-admin-vpn-mgmt-attach");
        assert!(graph
            .dependencies_of(attach[0].id)
            .contains(&group.vpn_management_policy.id()));
        assert_eq!(vpn_management_policy().statements().len(), 4);
    }

    #[test]
    fn test_cross_account_role() {
        let mut graph = ResourceGraph::new();
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let role = CrossAccountAccessRole::new(
            &mut graph,
            &ctx,
            CrossAccountAccessRoleArgs {
                name: "deployer".into(),
                trusted_account_ids: vec!["123456789012".into()],
                policy: PolicyDocument::new()
                    .statement(PolicyStatement::allow(["s3:GetObject"]).on_any()),
            },
            DeclareOptions::new(),
        )
        .unwrap();

        assert_eq!(role.role.name(), "role-deployer");
        assert_eq!(role.policy.name(), "permissions-policy-deployer");
        assert_eq!(
            graph
                .find(tokens::IAM_ROLE_POLICY_ATTACHMENT, "policy-attachment-deployer")
                .len(),
            1
        );
        assert_eq!(role.component_type(), "aws:role");
    }
}
