//! Security groups with fixed rule sets
//!
//! The group and each rule are separate declarations. Rules are named after
//! the group (`{group}-egressrule-alltraffic-ipv4`) and read the group id, so
//! they always follow it.

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, Properties, ProviderContext, ResourceGraph, ResourceHandle,
    Scope,
};

const ANY_IPV4: &str = "0.0.0.0/0";
const ANY_IPV6: &str = "::/0";
const ALL_PROTOCOLS: &str = "-1";

/// Port private services listen on behind a load balancer
pub const PRIVATE_HTTP_PORT: u16 = 3000;
pub const TLS_PORT: u16 = 443;

#[derive(Debug, Clone)]
pub struct SecurityGroupArgs {
    pub name: String,
    pub vpc_id: Input,
}

impl SecurityGroupArgs {
    pub fn new(name: impl Into<String>, vpc_id: impl Into<Input>) -> Self {
        Self {
            name: name.into(),
            vpc_id: vpc_id.into(),
        }
    }
}

/// Scope of a security group component with its group already declared
fn open_group<'g>(
    graph: &'g mut ResourceGraph,
    ctx: &'g ProviderContext,
    args: &SecurityGroupArgs,
    description: &str,
    options: DeclareOptions,
) -> Result<(Scope<'g>, ResourceHandle)> {
    let kind = AwsResourceType::SecurityGroup;
    let mut scope = Scope::open(
        graph,
        ctx,
        &aws_resource_type(kind),
        kind.as_str(),
        &args.name,
        options,
    )?;

    let group_name = scope.name(kind.as_str());
    let group = scope.resource(
        tokens::SECURITY_GROUP,
        group_name.as_str(),
        Properties::new()
            .with("name", group_name.as_str())
            .with("vpcId", args.vpc_id.clone())
            .with("description", description),
    )?;
    Ok((scope, group))
}

fn egress_all(scope: &mut Scope<'_>, group: &ResourceHandle, ipv6: bool) -> Result<ResourceHandle> {
    let (suffix, cidr_key, cidr) = if ipv6 {
        ("ipv6", "cidrIpv6", ANY_IPV6)
    } else {
        ("ipv4", "cidrIpv4", ANY_IPV4)
    };
    Ok(scope.resource(
        tokens::EGRESS_RULE,
        format!("{}-egressrule-alltraffic-{}", group.name(), suffix),
        Properties::new()
            .with("securityGroupId", group.output("id"))
            .with(cidr_key, cidr)
            .with("ipProtocol", ALL_PROTOCOLS),
    )?)
}

/// No inbound traffic, all outbound traffic
#[derive(Debug, Clone)]
pub struct SecurityGroupInboundNoneOutboundAll {
    handle: ResourceHandle,
    pub security_group: ResourceHandle,
}

impl SecurityGroupInboundNoneOutboundAll {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: SecurityGroupArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let (mut scope, security_group) = open_group(
            graph,
            ctx,
            &args,
            "No traffic in, allow all traffic out",
            options,
        )?;
        egress_all(&mut scope, &security_group, false)?;

        Ok(Self {
            handle: scope.finish(),
            security_group,
        })
    }
}

impl Component for SecurityGroupInboundNoneOutboundAll {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// HTTP on port 3000 from one other security group, all outbound traffic
#[derive(Debug, Clone)]
pub struct SecurityGroupInboundPrivateOutboundAll {
    handle: ResourceHandle,
    pub security_group: ResourceHandle,
}

impl SecurityGroupInboundPrivateOutboundAll {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: SecurityGroupArgs,
        source_security_group_id: impl Into<Input>,
        options: DeclareOptions,
    ) -> Result<Self> {
        let (mut scope, security_group) = open_group(
            graph,
            ctx,
            &args,
            "Allow http traffic from another security group and allow all outbound traffic",
            options,
        )?;

        scope.resource(
            tokens::INGRESS_RULE,
            format!("{}-ingress-rule-http-ipv4", security_group.name()),
            Properties::new()
                .with("securityGroupId", security_group.output("id"))
                .with("fromPort", PRIVATE_HTTP_PORT)
                .with("toPort", PRIVATE_HTTP_PORT)
                .with("ipProtocol", "tcp")
                .with("referencedSecurityGroupId", source_security_group_id),
        )?;
        egress_all(&mut scope, &security_group, false)?;

        Ok(Self {
            handle: scope.finish(),
            security_group,
        })
    }
}

impl Component for SecurityGroupInboundPrivateOutboundAll {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

/// Public TLS inbound on IPv4 and IPv6, all outbound traffic
///
/// Mainly for internet-facing load balancers.
#[derive(Debug, Clone)]
pub struct SecurityGroupInboundPublicTlsOutboundAll {
    handle: ResourceHandle,
    pub security_group: ResourceHandle,
}

impl SecurityGroupInboundPublicTlsOutboundAll {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: SecurityGroupArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let (mut scope, security_group) = open_group(
            graph,
            ctx,
            &args,
            "Allow public TLS inbound traffic and all outbound traffic - mainly for publicly exposed load balancers",
            options,
        )?;

        for (suffix, cidr_key, cidr) in [("ipv4", "cidrIpv4", ANY_IPV4), ("ipv6", "cidrIpv6", ANY_IPV6)] {
            scope.resource(
                tokens::INGRESS_RULE,
                format!("{}-ingressrule-publictls-{}", security_group.name(), suffix),
                Properties::new()
                    .with("securityGroupId", security_group.output("id"))
                    .with(cidr_key, cidr)
                    .with("fromPort", TLS_PORT)
                    .with("toPort", TLS_PORT)
                    .with("ipProtocol", "tcp"),
            )?;
        }
        egress_all(&mut scope, &security_group, false)?;
        egress_all(&mut scope, &security_group, true)?;

        Ok(Self {
            handle: scope.finish(),
            security_group,
        })
    }
}

impl Component for SecurityGroupInboundPublicTlsOutboundAll {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ProviderContext {
        ProviderContext::new("eu-west-2", "staging")
    }

    #[test]
    fn test_inbound_none_names() {
        let ctx = ctx();
        let mut graph = ResourceGraph::new();
        let sg = SecurityGroupInboundNoneOutboundAll::new(
            &mut graph,
            &ctx,
            SecurityGroupArgs::new("core", "vpc-123"),
            DeclareOptions::new(),
        )
        .unwrap();

        assert_eq!(sg.security_group.name(), "staging-eu-west-2-security-group-core");
        assert_eq!(
            graph
                .find(
                    tokens::EGRESS_RULE,
                    "staging-eu-west-2-security-group-core-egressrule-alltraffic-ipv4"
                )
                .len(),
            1
        );
        assert_eq!(sg.component_type(), "aws:security-group");
    }

    #[test]
    fn test_private_group_reads_source_group() {
        let ctx = ctx();
        let mut graph = ResourceGraph::new();
        let public = SecurityGroupInboundPublicTlsOutboundAll::new(
            &mut graph,
            &ctx,
            SecurityGroupArgs::new("lb", "vpc-123"),
            DeclareOptions::new(),
        )
        .unwrap();
        let private = SecurityGroupInboundPrivateOutboundAll::new(
            &mut graph,
            &ctx,
            SecurityGroupArgs::new("api", "vpc-123"),
            public.security_group.output("id"),
            DeclareOptions::new(),
        )
        .unwrap();

        let ingress = graph.find(
            tokens::INGRESS_RULE,
            "staging-eu-west-2-security-group-api-ingress-rule-http-ipv4",
        );
        assert_eq!(ingress.len(), 1);
        assert!(graph
            .dependencies_of(ingress[0].id)
            .contains(&public.security_group.id()));
        assert_eq!(graph.children_of(private.id()).len(), 3);
    }

    #[test]
    fn test_public_tls_rules() {
        let ctx = ctx();
        let mut graph = ResourceGraph::new();
        let public = SecurityGroupInboundPublicTlsOutboundAll::new(
            &mut graph,
            &ctx,
            SecurityGroupArgs::new("lb", "vpc-123"),
            DeclareOptions::new(),
        )
        .unwrap();

        assert_eq!(graph.by_type(tokens::INGRESS_RULE).len(), 2);
        assert_eq!(graph.by_type(tokens::EGRESS_RULE).len(), 2);
        let v6 = graph.find(
            tokens::INGRESS_RULE,
            "staging-eu-west-2-security-group-lb-ingressrule-publictls-ipv6",
        );
        assert_eq!(v6[0].properties.get("cidrIpv6").and_then(Input::as_str), Some("::/0"));
        assert_eq!(graph.children_of(public.id()).len(), 5);
    }
}
