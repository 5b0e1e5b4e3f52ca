//! ECS cluster

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope, resolve,
};

#[derive(Debug, Clone, Default)]
pub struct EcsClusterArgs {
    pub name: String,
    pub overrides: Properties,
}

#[derive(Debug, Clone)]
pub struct EcsCluster {
    handle: ResourceHandle,
    pub cluster: ResourceHandle,
}

impl EcsCluster {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: EcsClusterArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::Cluster;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let cluster_name = scope.name(kind.as_str());
        let defaults = Properties::new().with("name", cluster_name.as_str());
        let cluster = scope.resource(
            tokens::ECS_CLUSTER,
            cluster_name,
            resolve(defaults, &args.overrides),
        )?;

        Ok(Self {
            handle: scope.finish(),
            cluster,
        })
    }

    pub fn arn(&self) -> OutputRef {
        self.cluster.output("arn")
    }
}

impl Component for EcsCluster {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
