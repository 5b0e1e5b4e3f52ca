//! Client VPN into a [`Vpc`]
//!
//! Two endpoints share one security group: SAML single sign-on for people
//! and mutual TLS for machines. Each is authorized for the whole VPC range
//! and associated with every private subnet. A small instance in an isolated
//! subnet gives VPN users something to check connectivity against.

use crate::access::{SecurityGroupArgs, SecurityGroupInboundNoneOutboundAll};
use crate::error::Result;
use crate::network::vpc::{SubnetType, Vpc};
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, Properties, ProviderContext, ResourceGraph, ResourceHandle,
    Scope,
};
use tracing::debug;

pub const CLIENT_CIDR_BLOCK: &str = "192.168.0.0/22";
pub const CONNECTIVITY_CHECK_INSTANCE_TYPE: &str = "t3.nano";
pub const AMAZON_LINUX_2_AMI: &str = "amzn2-ami-hvm-*-x86_64-ebs";

#[derive(Debug, Clone)]
pub struct VpnArgs {
    pub name: String,
    /// Identity provider the SAML endpoint federates with
    pub saml_provider_arn: String,
    pub saml_server_certificate_arn: Input,
    /// Directory group allowed through the SAML endpoint; every group when unset
    pub saml_access_group_id: Option<String>,
    pub cert_server_certificate_arn: Input,
    /// Root of the chain client certificates must be signed by
    pub cert_client_certificate_arn: Input,
}

/// One client VPN endpoint with its authorization and subnet associations
#[derive(Debug, Clone)]
pub struct VpnEndpoint {
    pub endpoint: ResourceHandle,
    pub auth_rule: ResourceHandle,
    pub associations: Vec<ResourceHandle>,
}

enum Authentication {
    Saml { provider_arn: String },
    Certificate { root_chain_arn: Input },
}

impl Authentication {
    fn suffix(&self) -> &'static str {
        match self {
            Authentication::Saml { .. } => "saml",
            Authentication::Certificate { .. } => "cert",
        }
    }

    fn description(&self) -> &'static str {
        match self {
            Authentication::Saml { .. } => "SAML single sign-on VPN endpoint for remoting into VPC",
            Authentication::Certificate { .. } => "Two way SSL VPN endpoint for remoting into VPC",
        }
    }

    fn options(&self) -> Input {
        let option = match self {
            Authentication::Saml { provider_arn } => Properties::new()
                .with("type", "federated-authentication")
                .with("samlProviderArn", provider_arn.as_str()),
            Authentication::Certificate { root_chain_arn } => Properties::new()
                .with("type", "certificate-authentication")
                .with("rootCertificateChainArn", root_chain_arn.clone()),
        };
        vec![Input::from(option)].into()
    }
}

#[derive(Debug, Clone)]
pub struct Vpn {
    handle: ResourceHandle,
    pub endpoint_security_group: SecurityGroupInboundNoneOutboundAll,
    pub saml: VpnEndpoint,
    pub cert: VpnEndpoint,
    pub check_security_group: ResourceHandle,
    pub check_instance: ResourceHandle,
}

impl Vpn {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        vpc: &Vpc,
        args: VpnArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::Vpn;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let child_options = scope.child_options();
        let endpoint_security_group = SecurityGroupInboundNoneOutboundAll::new(
            scope.graph(),
            ctx,
            SecurityGroupArgs::new(&args.name, vpc.vpc_id()),
            child_options,
        )?;
        let security_group_id = endpoint_security_group.security_group.output("id");

        let saml = declare_endpoint(
            &mut scope,
            vpc,
            &args.name,
            Authentication::Saml {
                provider_arn: args.saml_provider_arn.clone(),
            },
            args.saml_server_certificate_arn.clone(),
            args.saml_access_group_id.as_deref(),
            security_group_id.clone().into(),
        )?;
        let cert = declare_endpoint(
            &mut scope,
            vpc,
            &args.name,
            Authentication::Certificate {
                root_chain_arn: args.cert_client_certificate_arn.clone(),
            },
            args.cert_server_certificate_arn.clone(),
            None,
            security_group_id.into(),
        )?;

        let (check_security_group, check_instance) =
            declare_connectivity_check(&mut scope, vpc, &args.name)?;

        Ok(Self {
            handle: scope.finish(),
            endpoint_security_group,
            saml,
            cert,
            check_security_group,
            check_instance,
        })
    }
}

impl Component for Vpn {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

fn declare_endpoint(
    scope: &mut Scope<'_>,
    vpc: &Vpc,
    name: &str,
    authentication: Authentication,
    server_certificate_arn: Input,
    access_group_id: Option<&str>,
    security_group_id: Input,
) -> Result<VpnEndpoint> {
    let suffix = authentication.suffix();
    let endpoint_name = format!("{}-{}", name, suffix);

    let endpoint = scope.resource(
        tokens::VPN_ENDPOINT,
        scope.name_for(AwsResourceType::VpnEndpoint.as_str(), &endpoint_name),
        Properties::new()
            .with("description", authentication.description())
            .with("serverCertificateArn", server_certificate_arn)
            .with("clientCidrBlock", CLIENT_CIDR_BLOCK)
            .with("authenticationOptions", authentication.options())
            .with("connectionLogOptions", Properties::new().with("enabled", false))
            .with("splitTunnel", true)
            .with("vpcId", vpc.vpc_id())
            .with("securityGroupIds", vec![security_group_id]),
    )?;

    let mut rule = Properties::new()
        .with("clientVpnEndpointId", endpoint.output("id"))
        .with("targetNetworkCidr", vpc.cidr_block());
    match access_group_id {
        Some(group) => rule.set("accessGroupId", group),
        None => rule.set("authorizeAllGroups", true),
    }
    let auth_rule = scope.resource(
        tokens::VPN_AUTH_RULE,
        scope.name_for(AwsResourceType::VpnAuthRule.as_str(), &endpoint_name),
        rule,
    )?;

    let mut associations = Vec::with_capacity(vpc.subnet_count());
    for index in 0..vpc.subnet_count() {
        let association_name = scope.name_for(
            AwsResourceType::NetworkAssociation.as_str(),
            &format!("{}-private-subnet-{}-{}", name, index, suffix),
        );
        debug!(endpoint = %endpoint.name(), subnet = index, "Associating VPN endpoint");
        associations.push(scope.resource(
            tokens::VPN_NETWORK_ASSOCIATION,
            association_name,
            Properties::new()
                .with("clientVpnEndpointId", endpoint.output("id"))
                .with("subnetId", vpc.subnet_id(SubnetType::Private, index)),
        )?);
    }

    Ok(VpnEndpoint {
        endpoint,
        auth_rule,
        associations,
    })
}

fn declare_connectivity_check(
    scope: &mut Scope<'_>,
    vpc: &Vpc,
    name: &str,
) -> Result<(ResourceHandle, ResourceHandle)> {
    let security_group = scope.resource(
        tokens::SECURITY_GROUP,
        scope.name_for(AwsResourceType::SecurityGroup.as_str(), &format!("{}-ec2", name)),
        Properties::new()
            .with("description", "Allow internal VPC traffic")
            .with("vpcId", vpc.vpc_id())
            .with(
                "ingress",
                vec![Input::from(
                    Properties::new()
                        .with("protocol", "-1")
                        .with("fromPort", 0u32)
                        .with("toPort", 0u32)
                        .with("cidrBlocks", vec![vpc.cidr_block()]),
                )],
            ),
    )?;

    let instance_name = scope.name_for(AwsResourceType::Ec2.as_str(), &format!("{}-vpncheck", name));
    let ami = scope.lookup(
        tokens::AMI,
        format!("{}-ami", instance_name),
        Properties::new()
            .with("owners", vec!["amazon"])
            .with("mostRecent", true)
            .with(
                "filters",
                vec![Input::from(
                    Properties::new()
                        .with("name", "name")
                        .with("values", vec![AMAZON_LINUX_2_AMI]),
                )],
            ),
    )?;

    let instance = scope.resource(
        tokens::INSTANCE,
        instance_name,
        Properties::new()
            .with("instanceType", CONNECTIVITY_CHECK_INSTANCE_TYPE)
            .with("ami", ami.output("id"))
            .with("subnetId", vpc.subnet_id(SubnetType::Isolated, 0))
            .with("vpcSecurityGroupIds", vec![security_group.output("id")]),
    )?;

    Ok((security_group, instance))
}
