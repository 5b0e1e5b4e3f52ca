//! A staging stack assembled from the catalog, planned and applied with the
//! dry-run engine.

use infrakit_cloud::{
    CloudError, DeclareOptions, DryRunEngine, Engine, Input, Properties, ProviderContext,
    ResourceGraph,
};
use infrakit_cloud_aws::access::{
    SecurityGroupArgs, SecurityGroupInboundPrivateOutboundAll,
    SecurityGroupInboundPublicTlsOutboundAll,
};
use infrakit_cloud_aws::database::{
    MigrationCommand, RdsInstanceOverrides, RdsPrismaPostgresDb, RdsPrismaPostgresDbArgs, RdsRole,
};
use infrakit_cloud_aws::network::{SubnetType, Vpc, VpcArgs};
use infrakit_cloud_aws::resource_types::tokens;
use infrakit_cloud_aws::routing::{
    ApplicationLoadBalancer, ApplicationLoadBalancerArgs, EnvironmentHostedZone,
    EnvironmentHostedZoneArgs, HttpsCertificate, HttpsCertificateArgs, MasterHostedZone,
    MasterHostedZoneArgs,
};
use infrakit_cloud_aws::services::{
    EcsCluster, EcsClusterArgs, EnvVariable, FargateSizingOverrides, PublicFargateService,
    PublicFargateServiceArgs,
};
use infrakit_postgres::{GrantArgs, GrantObjectType};

struct Stack {
    vpc: Vpc,
    rds: RdsPrismaPostgresDb,
    service: PublicFargateService,
}

fn declare_stack(graph: &mut ResourceGraph, ctx: &ProviderContext) -> Stack {
    let vpc = Vpc::new(graph, ctx, VpcArgs::new("core"), DeclareOptions::new()).unwrap();

    let alb_group = SecurityGroupInboundPublicTlsOutboundAll::new(
        graph,
        ctx,
        SecurityGroupArgs::new("alb", vpc.vpc_id()),
        DeclareOptions::new(),
    )
    .unwrap();
    let service_group = SecurityGroupInboundPrivateOutboundAll::new(
        graph,
        ctx,
        SecurityGroupArgs::new("services", vpc.vpc_id()),
        alb_group.security_group.output("id"),
        DeclareOptions::new(),
    )
    .unwrap();

    let rds = RdsPrismaPostgresDb::new(
        graph,
        ctx,
        RdsPrismaPostgresDbArgs {
            name: "shop".into(),
            database_name: "shop".into(),
            availability_zone: "eu-west-2a".into(),
            subnet_ids: vpc.subnet_ids(SubnetType::Isolated).into(),
            vpc_id: vpc.vpc_id().into(),
            security_group_ids: vec![service_group.security_group.output("id")].into(),
            roles: vec![RdsRole {
                name: "api".into(),
                grants: vec![
                    GrantArgs::new(GrantObjectType::Table, ["SELECT", "INSERT", "UPDATE"])
                        .in_schema("public"),
                ],
                password: None,
            }],
            migration: Some(MigrationCommand {
                command: "npx prisma migrate deploy".into(),
                working_dir: Some("apps/api".into()),
            }),
            settings: RdsInstanceOverrides::default(),
            extra: Properties::new(),
        },
        DeclareOptions::new(),
    )
    .unwrap();

    let master = MasterHostedZone::new(
        graph,
        ctx,
        MasterHostedZoneArgs { name: "apex".into(), ..Default::default() },
        DeclareOptions::new(),
    )
    .unwrap();
    let zone = EnvironmentHostedZone::new(
        graph,
        ctx,
        EnvironmentHostedZoneArgs {
            name: "apex".into(),
            master_zone_id: master.zone_id().into(),
            overrides: Properties::new(),
        },
        DeclareOptions::new(),
    )
    .unwrap();
    let certificate = HttpsCertificate::new(
        graph,
        ctx,
        HttpsCertificateArgs {
            name: "web".into(),
            route53_zone_id: zone.zone_id().into(),
            overrides: Properties::new(),
        },
        DeclareOptions::new(),
    )
    .unwrap();
    let alb = ApplicationLoadBalancer::new(
        graph,
        ctx,
        ApplicationLoadBalancerArgs {
            name: "public".into(),
            subnet_ids: vpc.subnet_ids(SubnetType::Public).into(),
            security_group: alb_group.security_group.output("id").into(),
            internal: false,
            https_certificate_arn: certificate.certificate_arn().into(),
            overrides: Properties::new(),
        },
        DeclareOptions::new(),
    )
    .unwrap();
    let cluster = EcsCluster::new(
        graph,
        ctx,
        EcsClusterArgs { name: "apps".into(), ..Default::default() },
        DeclareOptions::new(),
    )
    .unwrap();

    let service = PublicFargateService::new(
        graph,
        ctx,
        PublicFargateServiceArgs {
            name: "api".into(),
            base_environment: None,
            cluster_arn: cluster.arn().into(),
            vpc_id: vpc.vpc_id().into(),
            service_port: 3000,
            subnets: vpc.subnet_ids(SubnetType::Private).into(),
            security_groups: vec![service_group.security_group.output("id")].into(),
            assign_public_ip: false,
            listener_arn: alb.listener_arn().into(),
            environment_hosted_zone_id: zone.zone_id().into(),
            load_balancer_dns_name: alb.dns_name().into(),
            docker_context: ".".into(),
            dockerfile: "apps/api/Dockerfile".into(),
            docker_target: Some("runner".into()),
            environment_variables: vec![EnvVariable::new(
                "DATABASE_HOST",
                rds.address(),
            )],
            secrets: Vec::new(),
            sizing: FargateSizingOverrides::default(),
            overrides: Properties::new(),
        },
        DeclareOptions::new().depends_on(rds.migration.as_ref().unwrap()),
    )
    .unwrap();

    Stack { vpc, rds, service }
}

fn key(graph: &ResourceGraph, id: infrakit_cloud::DeclarationId) -> String {
    graph.get(id).unwrap().key()
}

#[test]
fn stack_orders_network_database_then_service() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    let stack = declare_stack(&mut graph, &ctx);

    graph.validate().unwrap();
    let order = graph.topological_order().unwrap();
    let pos = |id| order.iter().position(|x| *x == id).unwrap();

    let migration = stack.rds.migration.as_ref().unwrap();
    assert!(pos(stack.vpc.vpc.id()) < pos(stack.rds.db.id()));
    assert!(pos(stack.rds.db.id()) < pos(migration.id()));
    assert!(pos(migration.id()) < pos(stack.rds.roles[0].role.id()));
    assert!(pos(migration.id()) < pos(stack.service.service.id()));

    let summary = graph.plan().unwrap().summary();
    assert_eq!(summary.providers, 1);
    assert!(summary.lookups >= 2);
}

#[test]
fn secrets_never_appear_as_literals() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    let stack = declare_stack(&mut graph, &ctx);

    let provider = graph.get(stack.rds.provider.handle.id()).unwrap();
    for field in ["username", "password"] {
        assert!(provider.properties.get(field).unwrap().is_secret());
    }
    for role in graph.by_type(infrakit_postgres::resource_types::tokens::ROLE) {
        assert!(matches!(role.properties.get("password"), Some(Input::Secret(_))));
    }
}

#[tokio::test]
async fn stack_applies_cleanly() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    declare_stack(&mut graph, &ctx);

    let result = DryRunEngine::new().apply(&graph.plan().unwrap()).await.unwrap();
    assert!(result.is_success(), "failed: {:?}", result.failed);
    assert_eq!(result.succeeded.len(), graph.len());
}

#[tokio::test]
async fn failed_migration_skips_roles_and_service() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    let stack = declare_stack(&mut graph, &ctx);

    let migration = key(&graph, stack.rds.migration.as_ref().unwrap().id());
    let engine = DryRunEngine::new().fail_on(migration.clone(), "exit status 1");
    let result = engine.apply(&graph.plan().unwrap()).await.unwrap();

    assert!(!result.is_success());
    assert_eq!(result.failed.len(), 1);
    assert_eq!(result.failed[0].key, migration);
    let api = &stack.rds.roles[0];
    assert!(result.was_skipped(&key(&graph, api.role.id())));
    assert!(result.was_skipped(&key(&graph, api.iam_grant.id())));
    assert!(result.was_skipped(&key(&graph, stack.service.service.id())));
    assert!(result.was_applied(&key(&graph, stack.rds.db.id())));
}

#[tokio::test]
async fn name_collisions_surface_at_apply() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    for _ in 0..2 {
        EcsCluster::new(
            &mut graph,
            &ctx,
            EcsClusterArgs { name: "apps".into(), ..Default::default() },
            DeclareOptions::new(),
        )
        .unwrap();
    }

    assert_eq!(
        graph.find(tokens::ECS_CLUSTER, "staging-eu-west-2-cluster-apps").len(),
        2
    );
    let result = DryRunEngine::new().apply(&graph.plan().unwrap()).await.unwrap();
    assert!(!result.is_success());
    assert!(
        result.failed[0]
            .error
            .as_deref()
            .unwrap()
            .starts_with("Resource already exists")
    );
}

#[test]
fn cycle_between_components_is_rejected() {
    let ctx = ProviderContext::new("eu-west-2", "staging");
    let mut graph = ResourceGraph::new();
    let stack = declare_stack(&mut graph, &ctx);

    graph
        .add_dependency(stack.vpc.vpc.id(), stack.service.service.id())
        .unwrap();
    assert!(matches!(graph.validate(), Err(CloudError::CycleDetected(_))));
    assert!(graph.plan().is_err());
}
