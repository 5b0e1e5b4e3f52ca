//! Component scope
//!
//! A component is a named group of declarations. Its constructor opens a
//! [`Scope`], declares its children through it and keeps the handles it wants
//! to expose to the rest of the stack.

use crate::context::ProviderContext;
use crate::error::Result;
use crate::graph::{DeclarationId, DeclarationKind, DeclareOptions, ResourceGraph, ResourceHandle};
use crate::input::{OutputRef, Properties};
use crate::naming::{self, NameOptions};
use tracing::info;

/// A constructed component
pub trait Component {
    /// Type token of the component declaration (`aws:vpc`)
    fn component_type(&self) -> &str {
        self.handle().resource_type()
    }

    /// Handle of the component declaration itself
    fn handle(&self) -> &ResourceHandle;

    fn id(&self) -> DeclarationId {
        self.handle().id()
    }
}

/// Declaration context for the children of one component
pub struct Scope<'g> {
    graph: &'g mut ResourceGraph,
    ctx: &'g ProviderContext,
    names: NameOptions,
    component: ResourceHandle,
    provider: Option<DeclarationId>,
}

impl<'g> Scope<'g> {
    /// Declare the component node and return a scope for its children
    ///
    /// The component is named `build_resource_name(ctx.names(name), name_type)`.
    pub fn open(
        graph: &'g mut ResourceGraph,
        ctx: &'g ProviderContext,
        component_type: &str,
        name_type: &str,
        name: &str,
        options: DeclareOptions,
    ) -> Result<Self> {
        let names = ctx.names(name);
        let component_name = naming::build_resource_name(&names, name_type);
        Self::open_named(graph, ctx, component_type, names, component_name, options)
    }

    /// Same as [`Scope::open`] for components named under another strategy
    /// (project-wide IAM entities, cross-environment zones)
    pub fn open_named(
        graph: &'g mut ResourceGraph,
        ctx: &'g ProviderContext,
        component_type: &str,
        names: NameOptions,
        component_name: String,
        options: DeclareOptions,
    ) -> Result<Self> {
        let provider = options.provider;
        let component = graph.declare(
            DeclarationKind::Component,
            component_type,
            component_name,
            Properties::new(),
            options,
        )?;

        info!(
            component = %component.resource_type(),
            name = %component.name(),
            "Constructing component"
        );

        Ok(Self {
            graph,
            ctx,
            names,
            component,
            provider,
        })
    }

    /// Provider every later child is declared with
    pub fn use_provider(&mut self, provider: impl Into<DeclarationId>) {
        self.provider = Some(provider.into());
    }

    pub fn context(&self) -> &'g ProviderContext {
        self.ctx
    }

    pub fn names(&self) -> &NameOptions {
        &self.names
    }

    pub fn component(&self) -> &ResourceHandle {
        &self.component
    }

    /// Regional name of a child of this component
    pub fn name(&self, resource_type: &str) -> String {
        naming::build_resource_name(&self.names, resource_type)
    }

    /// Regional name of a child with its own name segment
    pub fn name_for(&self, resource_type: &str, name: &str) -> String {
        naming::build_resource_name(&self.names.with_name(name), resource_type)
    }

    /// Options for a nested component or a hand-built declaration
    pub fn child_options(&self) -> DeclareOptions {
        let options = DeclareOptions::new().parent(&self.component);
        match self.provider {
            Some(provider) => options.provider(provider),
            None => options,
        }
    }

    pub fn graph(&mut self) -> &mut ResourceGraph {
        self.graph
    }

    pub fn resource(
        &mut self,
        resource_type: &str,
        name: impl Into<String>,
        properties: Properties,
    ) -> Result<ResourceHandle> {
        self.resource_with(resource_type, name, properties, DeclareOptions::new())
    }

    /// Declare a child resource with extra options
    ///
    /// Parent and provider default to this component's when `options` leaves
    /// them unset.
    pub fn resource_with(
        &mut self,
        resource_type: &str,
        name: impl Into<String>,
        properties: Properties,
        options: DeclareOptions,
    ) -> Result<ResourceHandle> {
        self.child(DeclarationKind::Resource, resource_type, name, properties, options)
    }

    /// Read an existing resource (AMI, secret version, hosted zone)
    pub fn lookup(
        &mut self,
        resource_type: &str,
        name: impl Into<String>,
        properties: Properties,
    ) -> Result<ResourceHandle> {
        self.child(
            DeclarationKind::Lookup,
            resource_type,
            name,
            properties,
            DeclareOptions::new(),
        )
    }

    /// Declare a provider instance; it does not become the scope's provider
    pub fn provider(
        &mut self,
        resource_type: &str,
        name: impl Into<String>,
        properties: Properties,
    ) -> Result<ResourceHandle> {
        let options = DeclareOptions::new().parent(&self.component);
        self.graph
            .declare(DeclarationKind::Provider, resource_type, name, properties, options)
    }

    /// Make `dependent` wait for `dependency`
    pub fn add_dependency(
        &mut self,
        dependent: impl Into<DeclarationId>,
        dependency: impl Into<DeclarationId>,
    ) -> Result<()> {
        self.graph.add_dependency(dependent, dependency)
    }

    /// Close the scope, returning the component handle
    pub fn finish(self) -> ResourceHandle {
        self.component
    }

    /// Output of the component declaration
    pub fn output(&self, attribute: &str) -> OutputRef {
        self.component.output(attribute)
    }

    fn child(
        &mut self,
        kind: DeclarationKind,
        resource_type: &str,
        name: impl Into<String>,
        properties: Properties,
        mut options: DeclareOptions,
    ) -> Result<ResourceHandle> {
        if options.parent.is_none() {
            options.parent = Some(self.component.id());
        }
        if options.provider.is_none() {
            options.provider = self.provider;
        }
        self.graph.declare(kind, resource_type, name, properties, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bucket {
        handle: ResourceHandle,
        bucket: ResourceHandle,
    }

    impl Component for Bucket {
        fn handle(&self) -> &ResourceHandle {
            &self.handle
        }
    }

    fn bucket(graph: &mut ResourceGraph, ctx: &ProviderContext, name: &str) -> Bucket {
        let mut scope =
            Scope::open(graph, ctx, "test:bucket", "bucket", name, DeclareOptions::new()).unwrap();
        let bucket_name = scope.name("s3-bucket");
        let bucket = scope
            .resource(
                "aws:s3/bucket:Bucket",
                bucket_name,
                Properties::new().with("region", ctx.region.as_str()),
            )
            .unwrap();
        Bucket {
            handle: scope.finish(),
            bucket,
        }
    }

    #[test]
    fn test_scope_names_and_parents_children() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let assets = bucket(&mut graph, &ctx, "assets");

        assert_eq!(assets.handle.name(), "staging-eu-west-2-bucket-assets");
        assert_eq!(assets.component_type(), "test:bucket");
        assert_eq!(assets.bucket.name(), "staging-eu-west-2-s3-bucket-assets");

        let child = graph.get(assets.bucket.id()).unwrap();
        assert_eq!(child.options.parent, Some(assets.id()));
        assert_eq!(graph.children_of(assets.id()), vec![assets.bucket.id()]);
    }

    #[test]
    fn test_scope_provider_defaults_for_children() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let mut scope =
            Scope::open(&mut graph, &ctx, "test:db", "db", "core", DeclareOptions::new()).unwrap();

        let provider = scope
            .provider("pulumi:providers:postgresql", "pg", Properties::new())
            .unwrap();
        scope.use_provider(&provider);
        let role = scope
            .resource("postgresql:index:Role", "app", Properties::new())
            .unwrap();
        let name = scope.name_for("role", "reader");
        let options = scope.child_options();
        scope.finish();

        assert_eq!(name, "staging-eu-west-2-role-reader");
        assert_eq!(options.provider, Some(provider.id()));
        assert_eq!(graph.get(role.id()).unwrap().options.provider, Some(provider.id()));
        assert!(graph.dependencies_of(role.id()).contains(&provider.id()));
    }
}
