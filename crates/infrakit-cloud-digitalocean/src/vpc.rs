//! Private network in one DigitalOcean region

use crate::error::Result;
use crate::region::DigitalOceanRegion;
use crate::resource_types::{DigitalOceanResourceType, digital_ocean_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope, resolve,
};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct VpcArgs {
    pub name: String,
    /// VPC fields (`ipRange`, `description`), applied over the region
    pub overrides: Properties,
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
        let region: DigitalOceanRegion = ctx.region.parse()?;

        let kind = DigitalOceanResourceType::Vpc;
        let mut scope = Scope::open(
            graph,
            ctx,
            &digital_ocean_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let vpc_name = scope.component().name().to_string();
        debug!(vpc = %vpc_name, region = %region, "Declaring DigitalOcean VPC");
        let derived = Properties::new().with("region", region.as_str());
        let vpc = scope.resource(tokens::VPC, vpc_name, resolve(derived, &args.overrides))?;

        Ok(Self {
            handle: scope.finish(),
            vpc,
        })
    }

    pub fn vpc_id(&self) -> OutputRef {
        self.vpc.output("id")
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
    use infrakit_cloud::Input;

    #[test]
    fn test_vpc_region_and_overrides() {
        let ctx = ProviderContext::new("nyc3", "staging");
        let mut graph = ResourceGraph::new();
        let vpc = Vpc::new(
            &mut graph,
            &ctx,
            VpcArgs {
                name: "core".into(),
                overrides: Properties::new().with("ipRange", "10.10.10.0/24"),
            },
            DeclareOptions::new(),
        )
        .unwrap();

        assert_eq!(vpc.vpc.name(), "staging-nyc3-vpc-core");
        let decl = graph.get(vpc.vpc.id()).unwrap();
        assert_eq!(decl.properties.get("region").and_then(Input::as_str), Some("nyc3"));
        assert_eq!(
            decl.properties.get("ipRange").and_then(Input::as_str),
            Some("10.10.10.0/24")
        );
    }
}
