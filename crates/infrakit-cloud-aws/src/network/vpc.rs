//! Virtual private cloud with public, private and isolated subnets

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope, resolve,
};

pub const VPC_CIDR_BLOCK: &str = "10.0.0.0/16";
pub const AVAILABILITY_ZONES: usize = 2;
pub const SUBNET_CIDR_MASK: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetType {
    Public,
    Private,
    /// No route to the internet
    Isolated,
}

impl SubnetType {
    pub const ALL: [SubnetType; 3] = [SubnetType::Public, SubnetType::Private, SubnetType::Isolated];

    pub fn as_str(self) -> &'static str {
        match self {
            SubnetType::Public => "Public",
            SubnetType::Private => "Private",
            SubnetType::Isolated => "Isolated",
        }
    }

    /// Output holding the subnet ids of this type (`privateSubnetIds`)
    fn output_attribute(self) -> &'static str {
        match self {
            SubnetType::Public => "publicSubnetIds",
            SubnetType::Private => "privateSubnetIds",
            SubnetType::Isolated => "isolatedSubnetIds",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VpcArgs {
    pub name: String,
    /// Extra VPC properties; the CIDR block, zone count and subnet layout
    /// always win over these
    pub extra: Properties,
}

impl VpcArgs {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extra: Properties::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Vpc {
    handle: ResourceHandle,
    pub vpc: ResourceHandle,
}

impl Vpc {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: VpcArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::Vpc;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let subnet_specs: Vec<Input> = SubnetType::ALL
            .iter()
            .map(|subnet| {
                Properties::new()
                    .with("type", subnet.as_str())
                    .with("cidrMask", SUBNET_CIDR_MASK)
                    .into()
            })
            .collect();
        let layout = Properties::new()
            .with("subnetStrategy", "Auto")
            .with("cidrBlock", VPC_CIDR_BLOCK)
            .with("numberOfAvailabilityZones", AVAILABILITY_ZONES as u32)
            .with("subnetSpecs", subnet_specs);

        let vpc_name = scope.name(kind.as_str());
        let vpc = scope.resource(tokens::VPC, vpc_name, resolve(args.extra, &layout))?;

        Ok(Self {
            handle: scope.finish(),
            vpc,
        })
    }

    pub fn vpc_id(&self) -> OutputRef {
        self.vpc.output("vpcId")
    }

    pub fn cidr_block(&self) -> &'static str {
        VPC_CIDR_BLOCK
    }

    /// One subnet per availability zone
    pub fn subnet_count(&self) -> usize {
        AVAILABILITY_ZONES
    }

    pub fn subnet_ids(&self, subnet: SubnetType) -> OutputRef {
        self.vpc.output(subnet.output_attribute())
    }

    pub fn subnet_id(&self, subnet: SubnetType, index: usize) -> OutputRef {
        self.subnet_ids(subnet).index(index)
    }
}

impl Component for Vpc {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vpc_layout_wins_over_extra() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let vpc = Vpc::new(
            &mut graph,
            &ctx,
            VpcArgs {
                name: "core".into(),
                extra: Properties::new()
                    .with("cidrBlock", "172.16.0.0/12")
                    .with("enableDnsHostnames", true),
            },
            DeclareOptions::new(),
        )
        .unwrap();

        assert_eq!(vpc.vpc.name(), "staging-eu-west-2-vpc-core");
        let decl = graph.get(vpc.vpc.id()).unwrap();
        assert_eq!(decl.properties.get("cidrBlock").and_then(Input::as_str), Some("10.0.0.0/16"));
        assert!(decl.properties.contains_key("enableDnsHostnames"));
        let Some(Input::List(specs)) = decl.properties.get("subnetSpecs") else {
            panic!("subnet specs are a list");
        };
        assert_eq!(specs.len(), 3);
    }

    #[test]
    fn test_subnet_outputs() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let vpc = Vpc::new(&mut graph, &ctx, VpcArgs::new("core"), DeclareOptions::new()).unwrap();

        assert_eq!(vpc.subnet_id(SubnetType::Isolated, 0).attribute, "isolatedSubnetIds[0]");
        assert_eq!(vpc.subnet_ids(SubnetType::Private).attribute, "privateSubnetIds");
        assert_eq!(vpc.vpc_id().resource, vpc.vpc.id());
    }
}
