//! Application load balancer with an HTTPS listener
//!
//! The listener answers 404 until services add host-header rules to it.

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope, resolve,
};

pub const HTTPS_PORT: u16 = 443;
pub const TLS_POLICY: &str = "ELBSecurityPolicy-TLS-1-2-Ext-2018-06";
pub const NOT_FOUND_BODY: &str = "Sorry, we could not find what you were looking for";

#[derive(Debug, Clone)]
pub struct ApplicationLoadBalancerArgs {
    pub name: String,
    pub subnet_ids: Input,
    pub security_group: Input,
    pub internal: bool,
    pub https_certificate_arn: Input,
    pub overrides: Properties,
}

#[derive(Debug, Clone)]
pub struct ApplicationLoadBalancer {
    handle: ResourceHandle,
    pub load_balancer: ResourceHandle,
    pub listener: ResourceHandle,
}

impl ApplicationLoadBalancer {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: ApplicationLoadBalancerArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::LoadBalancer;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let lb_name = scope.name(kind.as_str());
        let defaults = Properties::new()
            .with("name", lb_name.as_str())
            .with("subnetIds", args.subnet_ids)
            .with("securityGroups", vec![args.security_group])
            .with("internal", args.internal)
            .with("ipAddressType", "ipv4");
        let load_balancer =
            scope.resource(tokens::LOAD_BALANCER, lb_name, resolve(defaults, &args.overrides))?;

        let not_found = Properties::new()
            .with("type", "fixed-response")
            .with(
                "fixedResponse",
                Properties::new()
                    .with("contentType", "text/plain")
                    .with("messageBody", NOT_FOUND_BODY)
                    .with("statusCode", "404"),
            );
        let listener = scope.resource(
            tokens::LISTENER,
            scope.name(AwsResourceType::LbListener.as_str()),
            Properties::new()
                .with("loadBalancerArn", load_balancer.output("loadBalancer").field("arn"))
                .with("protocol", "HTTPS")
                .with("port", HTTPS_PORT)
                .with("sslPolicy", TLS_POLICY)
                .with("certificateArn", args.https_certificate_arn)
                .with("defaultActions", vec![Input::from(not_found)]),
        )?;

        Ok(Self {
            handle: scope.finish(),
            load_balancer,
            listener,
        })
    }

    pub fn listener_arn(&self) -> OutputRef {
        self.listener.output("arn")
    }

    pub fn dns_name(&self) -> OutputRef {
        self.load_balancer.output("loadBalancer").field("dnsName")
    }
}

impl Component for ApplicationLoadBalancer {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listener_defaults_to_not_found() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let alb = ApplicationLoadBalancer::new(
            &mut graph,
            &ctx,
            ApplicationLoadBalancerArgs {
                name: "public".into(),
                subnet_ids: vec!["subnet-a", "subnet-b"].into(),
                security_group: "sg-1".into(),
                internal: false,
                https_certificate_arn: "arn:aws:acm:eu-west-2:1:certificate/x".into(),
                overrides: Properties::new(),
            },
            DeclareOptions::new(),
        )
        .unwrap();

        assert_eq!(alb.load_balancer.name(), "staging-eu-west-2-load-balancer-public");
        assert_eq!(alb.listener.name(), "staging-eu-west-2-lb-listener-public");

        let listener = graph.get(alb.listener.id()).unwrap();
        assert_eq!(listener.properties.get("sslPolicy").and_then(Input::as_str), Some(TLS_POLICY));
        assert_eq!(
            listener.properties.get("port").and_then(Input::as_literal),
            Some(&serde_json::json!(443))
        );
        assert!(graph.dependencies_of(alb.listener.id()).contains(&alb.load_balancer.id()));
        assert_eq!(alb.dns_name().attribute, "loadBalancer.dnsName");
    }
}
