//! Fargate service published through the shared load balancer
//!
//! The service gets its own target group, a host-header rule on the HTTPS
//! listener and an alias A record `{name}.{environment}.{domain}` pointing at
//! the load balancer. Task sizing follows the environment unless overridden.

use crate::error::Result;
use crate::policy::{PolicyDocument, PolicyStatement};
use crate::region::AwsRegion;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use crate::services::ecr::{EcrRepoImage, EcrRepoImageArgs};
use crate::services::env::{
    EnvVariable, SecretInput, container_environment, container_secrets, service_secret_name,
};
use infrakit_cloud::{
    Component, DeclareOptions, Environment, EnvironmentDefaults, Input, Layered, Properties,
    ProviderContext, ResourceGraph, ResourceHandle, Scope, resolve, resolve_for_environment,
};
use tracing::debug;

pub const HEALTH_CHECK_PATH: &str = "/health";
pub const UNHEALTHY_THRESHOLD: u32 = 5;
pub const DEREGISTRATION_DELAY_SECONDS: u32 = 120;

/// Task count and size of a service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FargateSizing {
    pub desired_count: u32,
    /// CPU units, as the task definition expects them ("256")
    pub cpu: String,
    /// Memory in MiB ("512")
    pub memory: String,
}

#[derive(Debug, Clone, Default)]
pub struct FargateSizingOverrides {
    pub desired_count: Option<u32>,
    pub cpu: Option<String>,
    pub memory: Option<String>,
}

impl EnvironmentDefaults for FargateSizing {
    fn for_environment(environment: &Environment) -> Self {
        if environment.is_production() {
            Self {
                desired_count: 2,
                cpu: "512".into(),
                memory: "1024".into(),
            }
        } else {
            Self {
                desired_count: 1,
                cpu: "256".into(),
                memory: "512".into(),
            }
        }
    }
}

impl Layered for FargateSizing {
    type Overrides = FargateSizingOverrides;

    fn overlay(self, overrides: &FargateSizingOverrides) -> Self {
        Self {
            desired_count: overrides.desired_count.unwrap_or(self.desired_count),
            cpu: overrides.cpu.clone().unwrap_or(self.cpu),
            memory: overrides.memory.clone().unwrap_or(self.memory),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PublicFargateServiceArgs {
    pub name: String,
    /// Environment whose secrets the service reads, when it differs from the
    /// deployment environment (preview environments)
    pub base_environment: Option<String>,
    pub cluster_arn: Input,
    pub vpc_id: Input,
    pub service_port: u16,
    pub subnets: Input,
    pub security_groups: Input,
    pub assign_public_ip: bool,
    pub listener_arn: Input,
    pub environment_hosted_zone_id: Input,
    pub load_balancer_dns_name: Input,
    pub docker_context: String,
    pub dockerfile: String,
    pub docker_target: Option<String>,
    pub environment_variables: Vec<EnvVariable>,
    pub secrets: Vec<SecretInput>,
    pub sizing: FargateSizingOverrides,
    /// Service properties replacing the derived ones
    pub overrides: Properties,
}

#[derive(Debug, Clone)]
pub struct PublicFargateService {
    handle: ResourceHandle,
    pub sizing: FargateSizing,
    pub host_name: String,
    pub image: EcrRepoImage,
    pub target_group: ResourceHandle,
    pub listener_rule: ResourceHandle,
    pub service_secret: ResourceHandle,
    pub secret_access_policy: ResourceHandle,
    pub service: ResourceHandle,
    pub dns_record: ResourceHandle,
}

impl PublicFargateService {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: PublicFargateServiceArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let region: AwsRegion = ctx.region.parse()?;
        let kind = AwsResourceType::FargateService;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;
        let service_name = scope.component().name().to_string();

        let child_options = scope.child_options();
        let image = EcrRepoImage::new(
            scope.graph(),
            ctx,
            EcrRepoImageArgs {
                name: args.name.clone(),
                docker_context: args.docker_context,
                dockerfile: args.dockerfile,
                target: args.docker_target,
            },
            child_options,
        )?;

        let target_group_name = scope.name(AwsResourceType::TargetGroup.as_str());
        let target_group = scope.resource_with(
            tokens::TARGET_GROUP,
            target_group_name.as_str(),
            Properties::new()
                .with(
                    "healthCheck",
                    Properties::new()
                        .with("enabled", true)
                        .with("unhealthyThreshold", UNHEALTHY_THRESHOLD)
                        .with("path", HEALTH_CHECK_PATH),
                )
                .with("vpcId", args.vpc_id)
                .with("port", args.service_port)
                .with("deregistrationDelay", DEREGISTRATION_DELAY_SECONDS)
                .with("protocol", "HTTP")
                .with("name", target_group_name.as_str())
                .with("targetType", "ip")
                .with("loadBalancingAlgorithmType", "least_outstanding_requests"),
            DeclareOptions::new().delete_before_replace(),
        )?;

        let host_name = ctx.host_name(&args.name);
        let listener_rule = scope.resource(
            tokens::LISTENER_RULE,
            scope.name(AwsResourceType::LbListenerRule.as_str()),
            Properties::new()
                .with("listenerArn", args.listener_arn)
                .with(
                    "actions",
                    vec![Input::from(
                        Properties::new()
                            .with("type", "forward")
                            .with("targetGroupArn", target_group.output("arn")),
                    )],
                )
                .with(
                    "conditions",
                    vec![Input::from(Properties::new().with(
                        "hostHeader",
                        Properties::new().with("values", vec![host_name.as_str()]),
                    ))],
                ),
        )?;

        let secret_environment = args
            .base_environment
            .as_deref()
            .unwrap_or(ctx.environment.as_str());
        let secret_name = service_secret_name(&args.name, secret_environment);
        debug!(service = %service_name, secret = %secret_name, "Granting secret access");
        let service_secret = scope.lookup(
            tokens::GET_SECRET,
            secret_name.as_str(),
            Properties::new().with("name", secret_name.as_str()),
        )?;
        let secret_access_policy = scope.resource(
            tokens::IAM_POLICY,
            scope.name_for(
                AwsResourceType::PermissionsPolicy.as_str(),
                &format!("{}-secrets", args.name),
            ),
            Properties::new()
                .with(
                    "description",
                    "Policy that grants access to the application's secrets in AWS Secrets Manager",
                )
                .with(
                    "policy",
                    PolicyDocument::new().statement(
                        PolicyStatement::allow([
                            "secretsmanager:GetSecretValue",
                            "secretsmanager:DescribeSecret",
                        ])
                        .on(service_secret.output("arn")),
                    ),
                ),
        )?;

        let sizing: FargateSizing = resolve_for_environment(&ctx.environment, &args.sizing);
        let task_family = scope.name(AwsResourceType::TaskDefinition.as_str());
        let container_name = scope.name(AwsResourceType::ServiceContainer.as_str());
        let container = Properties::new()
            .with("name", container_name.as_str())
            .with("image", image.image_uri())
            .with("environment", container_environment(&args.environment_variables))
            .with("secrets", container_secrets(&args.secrets))
            .with(
                "portMappings",
                vec![Input::from(
                    Properties::new().with("containerPort", args.service_port),
                )],
            );
        let derived = Properties::new()
            .with("name", service_name.as_str())
            .with("cluster", args.cluster_arn)
            .with(
                "loadBalancers",
                vec![Input::from(
                    Properties::new()
                        .with("targetGroupArn", target_group.output("arn"))
                        .with("containerName", container_name.as_str())
                        .with("containerPort", args.service_port),
                )],
            )
            .with(
                "networkConfiguration",
                Properties::new()
                    .with("assignPublicIp", args.assign_public_ip)
                    .with("subnets", args.subnets)
                    .with("securityGroups", args.security_groups),
            )
            .with("forceNewDeployment", true)
            .with("desiredCount", sizing.desired_count)
            .with(
                "taskDefinitionArgs",
                Properties::new()
                    .with("cpu", sizing.cpu.as_str())
                    .with("memory", sizing.memory.as_str())
                    .with("family", task_family)
                    .with(
                        "taskRole",
                        Properties::new().with(
                            "args",
                            Properties::new().with(
                                "managedPolicyArns",
                                vec![secret_access_policy.output("arn")],
                            ),
                        ),
                    )
                    .with(
                        "containers",
                        Properties::new().with(container_name.as_str(), container),
                    ),
            );
        let service = scope.resource(
            tokens::FARGATE_SERVICE,
            service_name.as_str(),
            resolve(derived, &args.overrides),
        )?;

        let dns_record = scope.resource(
            tokens::DNS_RECORD,
            scope.name(AwsResourceType::DnsARecord.as_str()),
            Properties::new()
                .with("name", host_name.as_str())
                .with("zoneId", args.environment_hosted_zone_id)
                .with("type", "A")
                .with(
                    "aliases",
                    vec![Input::from(
                        Properties::new()
                            .with("name", args.load_balancer_dns_name)
                            .with("zoneId", region.elb_hosted_zone_id())
                            .with("evaluateTargetHealth", true),
                    )],
                ),
        )?;

        Ok(Self {
            handle: scope.finish(),
            sizing,
            host_name,
            image,
            target_group,
            listener_rule,
            service_secret,
            secret_access_policy,
            service,
            dns_record,
        })
    }
}

impl Component for PublicFargateService {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(name: &str) -> PublicFargateServiceArgs {
        PublicFargateServiceArgs {
            name: name.into(),
            base_environment: None,
            cluster_arn: "arn:aws:ecs:eu-west-2:1:cluster/apps".into(),
            vpc_id: "vpc-1".into(),
            service_port: 3000,
            subnets: vec!["subnet-a"].into(),
            security_groups: vec!["sg-1"].into(),
            assign_public_ip: false,
            listener_arn: "arn:listener".into(),
            environment_hosted_zone_id: "Z123".into(),
            load_balancer_dns_name: "alb.eu-west-2.elb.amazonaws.com".into(),
            docker_context: ".".into(),
            dockerfile: "Dockerfile".into(),
            docker_target: None,
            environment_variables: vec![EnvVariable::new("PORT", "3000")],
            secrets: Vec::new(),
            sizing: FargateSizingOverrides::default(),
            overrides: Properties::new(),
        }
    }

    #[test]
    fn test_sizing_by_environment() {
        let prod = FargateSizing::for_environment(&Environment::production());
        assert_eq!(prod.desired_count, 2);
        assert_eq!(prod.cpu, "512");
        assert_eq!(prod.memory, "1024");

        let staging = FargateSizing::for_environment(&Environment::new("staging"));
        assert_eq!(staging.desired_count, 1);
        assert_eq!(staging.cpu, "256");
        assert_eq!(staging.memory, "512");
    }

    #[test]
    fn test_service_wiring() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let svc =
            PublicFargateService::new(&mut graph, &ctx, args("api"), DeclareOptions::new()).unwrap();

        assert_eq!(svc.host_name, "api.staging.simonnorman.online");
        assert_eq!(svc.service.name(), "staging-eu-west-2-fargate-service-api");
        assert_eq!(
            svc.secret_access_policy.name(),
            "staging-eu-west-2-permissions-policy-api-secrets"
        );
        assert_eq!(svc.service_secret.name(), "api-staging/doppler");

        let deps = graph.dependencies_of(svc.service.id());
        assert!(deps.contains(&svc.target_group.id()));
        assert!(deps.contains(&svc.secret_access_policy.id()));
        assert!(deps.contains(&svc.image.image.id()));

        let tg = graph.get(svc.target_group.id()).unwrap();
        assert!(tg.options.delete_before_replace);

        let record = graph.get(svc.dns_record.id()).unwrap();
        let alias = Input::list([Properties::new()
            .with("name", "alb.eu-west-2.elb.amazonaws.com")
            .with("zoneId", "ZHURV8PSTC4K8")
            .with("evaluateTargetHealth", true)]);
        assert_eq!(record.properties.get("aliases"), Some(&alias));
    }

    #[test]
    fn test_base_environment_selects_secret() {
        let ctx = ProviderContext::new("eu-west-2", "pr-42");
        let mut graph = ResourceGraph::new();
        let mut args = args("api");
        args.base_environment = Some("staging".into());
        let svc = PublicFargateService::new(&mut graph, &ctx, args, DeclareOptions::new()).unwrap();
        assert_eq!(svc.service_secret.name(), "api-staging/doppler");
    }

    #[test]
    fn test_explicit_sizing_wins_in_production() {
        let ctx = ProviderContext::new("eu-west-2", "production");
        let mut graph = ResourceGraph::new();
        let mut args = args("api");
        args.sizing.desired_count = Some(4);
        let svc = PublicFargateService::new(&mut graph, &ctx, args, DeclareOptions::new()).unwrap();

        assert_eq!(svc.sizing.desired_count, 4);
        assert_eq!(svc.sizing.cpu, "512");
        let decl = graph.get(svc.service.id()).unwrap();
        assert_eq!(
            decl.properties.get("desiredCount").and_then(Input::as_literal),
            Some(&serde_json::json!(4))
        );
    }

    #[test]
    fn test_unknown_region_rejected() {
        let ctx = ProviderContext::new("mars-north-1", "staging");
        let mut graph = ResourceGraph::new();
        let err = PublicFargateService::new(&mut graph, &ctx, args("api"), DeclareOptions::new());
        assert!(matches!(err, Err(crate::error::AwsError::UnsupportedRegion(_))));
        assert!(graph.is_empty());
    }
}
