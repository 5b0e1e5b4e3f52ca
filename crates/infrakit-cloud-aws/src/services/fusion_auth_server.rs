//! Self-hosted FusionAuth on EC2, published through an HTTP API
//!
//! The instance runs FusionAuth with docker compose from its user data. An
//! HTTP API proxies every path to port 9011 on the instance's public address
//! and is served on `{name}.{environment}.{domain}`.

use crate::arn::managed_policy;
use crate::error::Result;
use crate::policy::PolicyDocument;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use crate::services::lambda::api::{DEFAULT_STAGE, PROXY_ROUTE_KEY};
use infrakit_cloud::{
    Component, DeclareOptions, Environment, EnvironmentDefaults, Input, Layered, OutputRef,
    Properties, ProviderContext, ResourceGraph, ResourceHandle, Scope, resolve_for_environment,
};

pub const FUSIONAUTH_PORT: u16 = 9011;
/// Amazon Linux 2 image the server is built from
pub const DEFAULT_AMI: &str = "ami-0b2ed2e3df8cf9080";
const USER_DATA: &str = include_str!("fusion_auth_user_data.sh");

/// EC2 instance size by environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ec2Sizing {
    pub instance_type: String,
}

#[derive(Debug, Clone, Default)]
pub struct Ec2SizingOverrides {
    pub instance_type: Option<String>,
}

impl EnvironmentDefaults for Ec2Sizing {
    fn for_environment(environment: &Environment) -> Self {
        let instance_type = if environment.is_production() {
            "t2.medium"
        } else {
            "t2.micro"
        };
        Self {
            instance_type: instance_type.into(),
        }
    }
}

impl Layered for Ec2Sizing {
    type Overrides = Ec2SizingOverrides;

    fn overlay(self, overrides: &Ec2SizingOverrides) -> Self {
        Self {
            instance_type: overrides
                .instance_type
                .clone()
                .unwrap_or(self.instance_type),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FusionAuthServerArgs {
    pub name: String,
    pub subnet_id: Input,
    pub hosted_zone_id: Input,
    pub certificate_arn: Input,
    pub ami: String,
    pub sizing: Ec2SizingOverrides,
}

impl FusionAuthServerArgs {
    pub fn new(
        name: impl Into<String>,
        subnet_id: impl Into<Input>,
        hosted_zone_id: impl Into<Input>,
        certificate_arn: impl Into<Input>,
    ) -> Self {
        Self {
            name: name.into(),
            subnet_id: subnet_id.into(),
            hosted_zone_id: hosted_zone_id.into(),
            certificate_arn: certificate_arn.into(),
            ami: DEFAULT_AMI.into(),
            sizing: Ec2SizingOverrides::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FusionAuthServer {
    handle: ResourceHandle,
    pub sizing: Ec2Sizing,
    pub host_name: String,
    pub role: ResourceHandle,
    pub instance_profile: ResourceHandle,
    pub instance: ResourceHandle,
    pub api: ResourceHandle,
    pub integration: ResourceHandle,
    pub deployment: ResourceHandle,
    pub route: ResourceHandle,
    pub stage: ResourceHandle,
    pub domain_name: ResourceHandle,
    pub dns_record: ResourceHandle,
    pub api_mapping: ResourceHandle,
}

impl FusionAuthServer {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: FusionAuthServerArgs,
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

        let role = scope.resource(
            tokens::IAM_ROLE,
            scope.name_for(AwsResourceType::Role.as_str(), "fusion-auth-server-role"),
            Properties::new().with(
                "assumeRolePolicy",
                Input::json(PolicyDocument::assume_role_by_service("ec2.amazonaws.com")),
            ),
        )?;
        scope.resource(
            tokens::IAM_ROLE_POLICY_ATTACHMENT,
            scope.name_for(AwsResourceType::PolicyAttachment.as_str(), "ec2-ssm-agent"),
            Properties::new()
                .with("role", role.output("name"))
                .with("policyArn", managed_policy("service-role/AmazonEC2RoleforSSM")),
        )?;
        let instance_profile = scope.resource(
            tokens::IAM_INSTANCE_PROFILE,
            scope.name_for(AwsResourceType::InstanceProfile.as_str(), "fusion-auth-policy"),
            Properties::new().with("role", role.output("name")),
        )?;

        let sizing: Ec2Sizing = resolve_for_environment(&ctx.environment, &args.sizing);
        let instance_name = format!("{}-instance", server_name);
        let instance = scope.resource_with(
            tokens::INSTANCE,
            instance_name.as_str(),
            Properties::new()
                .with("ami", args.ami.as_str())
                .with("instanceType", sizing.instance_type.as_str())
                .with("iamInstanceProfile", instance_profile.output("name"))
                .with("userData", USER_DATA)
                .with("subnetId", args.subnet_id)
                .with("userDataReplaceOnChange", true)
                .with("tags", Properties::new().with("Name", instance_name.as_str())),
            DeclareOptions::new().replace_on_changes(["userData"]),
        )?;

        let api = scope.resource(
            tokens::API,
            scope.name_for(AwsResourceType::ApiGateway.as_str(), "fusion-auth-api"),
            Properties::new()
                .with("protocolType", "HTTP")
                .with("description", "API Gateway for FusionAuth"),
        )?;

        let integration = scope.resource(
            tokens::API_INTEGRATION,
            scope.name(AwsResourceType::ApiGatewayIntegration.as_str()),
            Properties::new()
                .with("apiId", api.output("id"))
                .with("integrationType", "HTTP_PROXY")
                .with(
                    "integrationUri",
                    Input::concat([
                        Input::from("http://"),
                        instance.output("publicIp").into(),
                        format!(":{}/{{proxy}}", FUSIONAUTH_PORT).into(),
                    ]),
                )
                .with("integrationMethod", "ANY")
                .with("payloadFormatVersion", "1.0")
                .with(
                    "requestParameters",
                    Properties::new().with("integration.request.path.proxy", "$request.path.proxy"),
                ),
        )?;

        let deployment = scope.resource_with(
            tokens::API_DEPLOYMENT,
            scope.name_for(
                AwsResourceType::ApiGatewayDeployment.as_str(),
                "fusion-auth-deployment",
            ),
            Properties::new()
                .with("restApi", api.output("id"))
                .with("description", "Production deployment for FusionAuth API"),
            DeclareOptions::new().depends_on(&integration),
        )?;

        let route = scope.resource(
            tokens::API_ROUTE,
            scope.name(AwsResourceType::ApiGatewayRoute.as_str()),
            Properties::new()
                .with("apiId", api.output("id"))
                .with("routeKey", PROXY_ROUTE_KEY)
                .with(
                    "target",
                    Input::concat([Input::from("integrations/"), integration.output("id").into()]),
                ),
        )?;

        let stage = scope.resource(
            tokens::API_STAGE,
            scope.name(AwsResourceType::ApiGatewayStage.as_str()),
            Properties::new()
                .with("apiId", api.output("id"))
                .with("name", DEFAULT_STAGE)
                .with("autoDeploy", true),
        )?;

        let host_name = ctx.host_name(&args.name);
        let domain_name = scope.resource(
            tokens::API_DOMAIN_NAME,
            scope.name(AwsResourceType::ApiGatewayDomainName.as_str()),
            Properties::new().with("domainName", host_name.as_str()).with(
                "domainNameConfiguration",
                Properties::new()
                    .with("certificateArn", args.certificate_arn)
                    .with("endpointType", "REGIONAL")
                    .with("securityPolicy", "TLS_1_2"),
            ),
        )?;

        let target = domain_name.output("domainNameConfiguration");
        let dns_record = scope.resource(
            tokens::DNS_RECORD,
            scope.name(AwsResourceType::DnsARecord.as_str()),
            Properties::new()
                .with("name", host_name.as_str())
                .with("type", "A")
                .with("zoneId", args.hosted_zone_id)
                .with(
                    "aliases",
                    vec![Input::from(
                        Properties::new()
                            .with("name", target.field("targetDomainName"))
                            .with("zoneId", target.field("hostedZoneId"))
                            .with("evaluateTargetHealth", true),
                    )],
                ),
        )?;

        let api_mapping = scope.resource(
            tokens::API_MAPPING,
            scope.name(AwsResourceType::ApiGatewayMapping.as_str()),
            Properties::new()
                .with("apiId", api.output("id"))
                .with("domainName", domain_name.output("id"))
                .with("stage", stage.output("id")),
        )?;

        Ok(Self {
            handle: scope.finish(),
            sizing,
            host_name,
            role,
            instance_profile,
            instance,
            api,
            integration,
            deployment,
            route,
            stage,
            domain_name,
            dns_record,
            api_mapping,
        })
    }

    /// Default endpoint of the API, before the custom domain
    pub fn api_endpoint(&self) -> OutputRef {
        self.api.output("apiEndpoint")
    }
}

impl Component for FusionAuthServer {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrakit_cloud::resolve;

    fn args() -> FusionAuthServerArgs {
        FusionAuthServerArgs::new("auth", "subnet-a", "Z123", "arn:aws:acm:eu-west-2:1:certificate/x")
    }

    #[test]
    fn test_ec2_sizing() {
        assert_eq!(
            Ec2Sizing::for_environment(&Environment::production()).instance_type,
            "t2.medium"
        );
        assert_eq!(
            Ec2Sizing::for_environment(&Environment::new("staging")).instance_type,
            "t2.micro"
        );

        let overridden = resolve(
            Ec2Sizing::for_environment(&Environment::production()),
            &Ec2SizingOverrides {
                instance_type: Some("t3.large".into()),
            },
        );
        assert_eq!(overridden.instance_type, "t3.large");
    }

    #[test]
    fn test_server_wiring() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let server = FusionAuthServer::new(&mut graph, &ctx, args(), DeclareOptions::new()).unwrap();

        assert_eq!(server.sizing.instance_type, "t2.micro");
        assert_eq!(server.instance.name(), "staging-eu-west-2-fusion-auth-server-auth-instance");
        assert_eq!(server.role.name(), "staging-eu-west-2-role-fusion-auth-server-role");
        assert_eq!(server.host_name, "auth.staging.simonnorman.online");

        assert!(graph.dependencies_of(server.instance.id()).contains(&server.instance_profile.id()));
        assert!(graph.dependencies_of(server.integration.id()).contains(&server.instance.id()));
        assert!(graph.dependencies_of(server.deployment.id()).contains(&server.integration.id()));

        let instance = graph.get(server.instance.id()).unwrap();
        assert!(
            instance
                .properties
                .get("userData")
                .and_then(Input::as_str)
                .unwrap()
                .contains("docker-compose up -d")
        );
    }
}
