//! Lambda behind an HTTP API on `{name}.{environment}.{domain}`

use super::{LambdaFunction, LambdaFunctionArgs};
use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, Properties, ProviderContext, ResourceGraph, ResourceHandle,
    Scope,
};

pub const PROXY_ROUTE_KEY: &str = "ANY /{proxy+}";
pub const DEFAULT_STAGE: &str = "$default";

#[derive(Debug, Clone)]
pub struct ApiGatewayLambdaArgs {
    pub function: LambdaFunctionArgs,
    pub certificate_arn: Input,
    /// Zone the A record is written to
    pub hosted_zone_id: Input,
}

#[derive(Debug, Clone)]
pub struct ApiGatewayLambda {
    handle: ResourceHandle,
    pub host_name: String,
    pub lambda: LambdaFunction,
    pub api: ResourceHandle,
    pub domain_name: ResourceHandle,
    pub integration: ResourceHandle,
    pub route: ResourceHandle,
    pub stage: ResourceHandle,
    pub api_mapping: ResourceHandle,
    pub permission: ResourceHandle,
    pub dns_record: ResourceHandle,
}

impl ApiGatewayLambda {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: ApiGatewayLambdaArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::ApiGatewayLambda;
        let name = args.function.name.clone();
        let mut scope = Scope::open(graph, ctx, &aws_resource_type(kind), kind.as_str(), &name, options)?;

        let child_options = scope.child_options();
        let lambda = LambdaFunction::new(scope.graph(), ctx, args.function, child_options)?;

        let api_name = scope.name(AwsResourceType::ApiGateway.as_str());
        let api = scope.resource(
            tokens::API,
            api_name.as_str(),
            Properties::new()
                .with("protocolType", "HTTP")
                .with("name", api_name.as_str()),
        )?;

        let host_name = ctx.host_name(&name);
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

        let integration = scope.resource(
            tokens::API_INTEGRATION,
            scope.name(AwsResourceType::ApiGatewayIntegration.as_str()),
            Properties::new()
                .with("apiId", api.output("id"))
                .with("integrationType", "AWS_PROXY")
                .with("integrationUri", lambda.arn())
                .with("integrationMethod", "POST")
                .with("payloadFormatVersion", "2.0"),
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

        let api_mapping = scope.resource(
            tokens::API_MAPPING,
            scope.name(AwsResourceType::ApiGatewayMapping.as_str()),
            Properties::new()
                .with("apiId", api.output("id"))
                .with("domainName", domain_name.output("id"))
                .with("stage", stage.output("id")),
        )?;

        let permission = scope.resource(
            tokens::LAMBDA_PERMISSION,
            scope.name_for(
                AwsResourceType::LambdaPermission.as_str(),
                &format!("{}-apigw-permission", name),
            ),
            Properties::new()
                .with("action", "lambda:InvokeFunction")
                .with("function", lambda.function_name())
                .with("principal", "apigateway.amazonaws.com")
                .with(
                    "sourceArn",
                    Input::concat([Input::from(api.output("executionArn")), "/*".into()]),
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

        Ok(Self {
            handle: scope.finish(),
            host_name,
            lambda,
            api,
            domain_name,
            integration,
            route,
            stage,
            api_mapping,
            permission,
            dns_record,
        })
    }
}

impl Component for ApiGatewayLambda {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lambda::tests::function_args;

    #[test]
    fn test_api_routes_to_function() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let api = ApiGatewayLambda::new(
            &mut graph,
            &ctx,
            ApiGatewayLambdaArgs {
                function: function_args("webhooks"),
                certificate_arn: "arn:aws:acm:eu-west-2:1:certificate/x".into(),
                hosted_zone_id: "Z123".into(),
            },
            DeclareOptions::new(),
        )
        .unwrap();

        assert_eq!(api.host_name, "webhooks.staging.simonnorman.online");
        assert_eq!(
            api.permission.name(),
            "staging-eu-west-2-lambda-permission-webhooks-apigw-permission"
        );
        assert_eq!(graph.get(api.lambda.id()).unwrap().options.parent, Some(api.id()));

        let integration = graph.get(api.integration.id()).unwrap();
        assert_eq!(
            integration.properties.get("integrationUri"),
            Some(&Input::from(api.lambda.arn()))
        );
        let route = graph.get(api.route.id()).unwrap();
        assert!(graph.dependencies_of(route.id).contains(&api.integration.id()));

        let mapping_deps = graph.dependencies_of(api.api_mapping.id());
        assert!(mapping_deps.contains(&api.domain_name.id()));
        assert!(mapping_deps.contains(&api.stage.id()));
        assert!(graph.dependencies_of(api.dns_record.id()).contains(&api.domain_name.id()));
    }
}
