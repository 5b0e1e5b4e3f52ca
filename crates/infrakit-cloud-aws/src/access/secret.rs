//! Secrets Manager secret

use crate::error::Result;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Properties, ProviderContext, ResourceGraph, ResourceHandle, Scope,
    SecretRef,
};

#[derive(Debug, Clone, Default)]
pub struct SecretArgs {
    pub name: String,
    /// Secret properties (description, kmsKeyId, ...), passed through
    pub secret: Properties,
}

/// A regional secret whose value is managed outside the stack
#[derive(Debug, Clone)]
pub struct Secret {
    handle: ResourceHandle,
    pub secret: ResourceHandle,
}

impl Secret {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: SecretArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::Secret;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let name = scope.name(kind.as_str());
        let secret = scope.resource(tokens::SECRET, name, args.secret)?;

        Ok(Self {
            handle: scope.finish(),
            secret,
        })
    }

    /// Reference to the stored value, by ARN
    pub fn value(&self) -> SecretRef {
        SecretRef::managed(self.secret.output("arn"))
    }
}

impl Component for Secret {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
