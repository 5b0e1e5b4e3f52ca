//! Resource graph
//!
//! Every component, resource, lookup and provider declared during an evaluation
//! pass becomes a node. Edges point from a dependency to its dependent and are
//! added for data flow (a property reads another declaration's output),
//! explicit `depends_on` annotations, parent components and providers.
//! The graph must be acyclic before it can be planned.

use crate::error::{CloudError, Result};
use crate::input::{OutputRef, Properties};
use crate::plan::Plan;
use petgraph::Direction;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::debug;

/// Position of a declaration in its graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeclarationId(usize);

impl DeclarationId {
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0
    }

    fn node(self) -> NodeIndex {
        NodeIndex::new(self.0)
    }
}

impl fmt::Display for DeclarationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a declaration asks the engine to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeclarationKind {
    /// Logical grouping of child declarations
    Component,
    /// Managed resource, created and owned by the stack
    Resource,
    /// Read of an existing resource (AMI, secret version, zone)
    Lookup,
    /// Provider instance configured with explicit credentials
    Provider,
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeclarationKind::Component => write!(f, "component"),
            DeclarationKind::Resource => write!(f, "resource"),
            DeclarationKind::Lookup => write!(f, "lookup"),
            DeclarationKind::Provider => write!(f, "provider"),
        }
    }
}

/// Why one declaration waits for another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Data,
    Explicit,
    Parent,
    Provider,
}

/// Resource options attached to a declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclareOptions {
    pub parent: Option<DeclarationId>,

    pub provider: Option<DeclarationId>,

    /// Ordering with no data flow (migration before role grants)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<DeclarationId>,

    #[serde(default)]
    pub delete_before_replace: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace_on_changes: Vec<String>,
}

impl DeclareOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent(mut self, parent: impl Into<DeclarationId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<DeclarationId>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn depends_on(mut self, dependency: impl Into<DeclarationId>) -> Self {
        self.depends_on.push(dependency.into());
        self
    }

    pub fn depends_on_all<I, T>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<DeclarationId>,
    {
        self.depends_on.extend(dependencies.into_iter().map(Into::into));
        self
    }

    pub fn delete_before_replace(mut self) -> Self {
        self.delete_before_replace = true;
        self
    }

    pub fn replace_on_changes<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.replace_on_changes.extend(fields.into_iter().map(Into::into));
        self
    }
}

/// A single node of the graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub id: DeclarationId,
    pub kind: DeclarationKind,

    /// Type token (`aws:ec2/vpc:Vpc`)
    pub resource_type: String,

    /// Deterministic resource name
    pub name: String,

    pub properties: Properties,

    pub options: DeclareOptions,
}

impl Declaration {
    /// `{type}:{name}`, the identifier an engine keys resources by
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.name)
    }
}

/// Handle returned for every declaration, used to wire outputs onward
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceHandle {
    id: DeclarationId,
    resource_type: String,
    name: String,
}

impl ResourceHandle {
    pub fn id(&self) -> DeclarationId {
        self.id
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reference to an output attribute, only known after apply
    pub fn output(&self, attribute: impl Into<String>) -> OutputRef {
        OutputRef::new(self.id, attribute)
    }
}

impl From<&ResourceHandle> for DeclarationId {
    fn from(handle: &ResourceHandle) -> Self {
        handle.id
    }
}

impl From<ResourceHandle> for DeclarationId {
    fn from(handle: ResourceHandle) -> Self {
        handle.id
    }
}

/// Dependency graph of every declaration of one evaluation pass
#[derive(Debug, Default)]
pub struct ResourceGraph {
    graph: DiGraph<DeclarationId, EdgeKind>,
    declarations: Vec<Declaration>,
}

impl ResourceGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declaration and its incoming edges
    ///
    /// Every declaration referenced by `properties` or `options` must already
    /// exist. Duplicate `(type, name)` pairs are accepted here; the engine
    /// rejects them when the plan is applied.
    pub fn declare(
        &mut self,
        kind: DeclarationKind,
        resource_type: impl Into<String>,
        name: impl Into<String>,
        properties: Properties,
        options: DeclareOptions,
    ) -> Result<ResourceHandle> {
        let resource_type = resource_type.into();
        let name = name.into();

        if resource_type.is_empty() {
            return Err(CloudError::InvalidConfig(format!(
                "declaration '{}' has an empty resource type",
                name
            )));
        }
        if name.is_empty() {
            return Err(CloudError::InvalidConfig(format!(
                "declaration of type '{}' has an empty name",
                resource_type
            )));
        }

        let data_refs = properties.references();
        for id in data_refs
            .iter()
            .chain(options.parent.iter())
            .chain(options.provider.iter())
            .chain(options.depends_on.iter())
        {
            self.ensure_exists(*id)?;
        }

        let id = DeclarationId(self.declarations.len());
        let node = self.graph.add_node(id);
        debug_assert_eq!(node, id.node());

        for dep in &data_refs {
            self.link(*dep, id, EdgeKind::Data);
        }
        if let Some(parent) = options.parent {
            self.link(parent, id, EdgeKind::Parent);
        }
        if let Some(provider) = options.provider {
            self.link(provider, id, EdgeKind::Provider);
        }

        debug!(
            id = %id,
            kind = %kind,
            resource_type = %resource_type,
            name = %name,
            "Declared"
        );

        let handle = ResourceHandle {
            id,
            resource_type: resource_type.clone(),
            name: name.clone(),
        };
        let explicit = options.depends_on.clone();
        self.declarations.push(Declaration {
            id,
            kind,
            resource_type,
            name,
            properties,
            options,
        });

        for dep in explicit {
            self.link_explicit(dep, id);
        }

        Ok(handle)
    }

    /// Make `dependent` wait for `dependency` with no data flow between them
    ///
    /// Cycles introduced here are reported by [`ResourceGraph::validate`].
    pub fn add_dependency(
        &mut self,
        dependent: impl Into<DeclarationId>,
        dependency: impl Into<DeclarationId>,
    ) -> Result<()> {
        let dependent = dependent.into();
        let dependency = dependency.into();
        self.ensure_exists(dependent)?;
        self.ensure_exists(dependency)?;

        if let Some(decl) = self.declarations.get_mut(dependent.0)
            && !decl.options.depends_on.contains(&dependency)
        {
            decl.options.depends_on.push(dependency);
        }
        self.link_explicit(dependency, dependent);
        Ok(())
    }

    /// Verify the graph is acyclic
    pub fn validate(&self) -> Result<()> {
        toposort(&self.graph, None).map_err(|cycle| {
            let id = self.graph[cycle.node_id()];
            let at = self
                .get(id)
                .map(Declaration::key)
                .unwrap_or_else(|| id.to_string());
            CloudError::CycleDetected(at)
        })?;
        Ok(())
    }

    /// Declarations in apply order, dependencies first
    ///
    /// Ties are broken by declaration order so the result is stable.
    pub fn topological_order(&self) -> Result<Vec<DeclarationId>> {
        Ok(self.waves()?.into_iter().flatten().collect())
    }

    /// Declarations grouped into waves
    ///
    /// Every declaration of a wave only depends on declarations of earlier
    /// waves, so the members of a wave are independent of each other.
    pub fn waves(&self) -> Result<Vec<Vec<DeclarationId>>> {
        self.validate()?;

        let count = self.declarations.len();
        let mut in_degree: Vec<usize> = (0..count)
            .map(|i| {
                self.graph
                    .neighbors_directed(NodeIndex::new(i), Direction::Incoming)
                    .count()
            })
            .collect();
        let mut remaining: BTreeSet<usize> = (0..count).collect();
        let mut waves = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<usize> = remaining
                .iter()
                .copied()
                .filter(|&i| in_degree[i] == 0)
                .collect();

            if ready.is_empty() {
                let at = remaining
                    .first()
                    .and_then(|&i| self.declarations.get(i))
                    .map(Declaration::key)
                    .unwrap_or_default();
                return Err(CloudError::CycleDetected(at));
            }

            for &i in &ready {
                remaining.remove(&i);
                for next in self
                    .graph
                    .neighbors_directed(NodeIndex::new(i), Direction::Outgoing)
                {
                    let deg = &mut in_degree[next.index()];
                    *deg = deg.saturating_sub(1);
                }
            }

            waves.push(ready.into_iter().map(DeclarationId).collect());
        }

        Ok(waves)
    }

    /// Direct dependencies of a declaration, in declaration order
    pub fn dependencies_of(&self, id: DeclarationId) -> Vec<DeclarationId> {
        self.adjacent(id, Direction::Incoming)
    }

    /// Declarations that directly wait for `id`
    pub fn dependents_of(&self, id: DeclarationId) -> Vec<DeclarationId> {
        self.adjacent(id, Direction::Outgoing)
    }

    /// Edge kind between two declarations, if they are linked
    pub fn edge(&self, dependency: DeclarationId, dependent: DeclarationId) -> Option<EdgeKind> {
        if dependency.0 >= self.declarations.len() || dependent.0 >= self.declarations.len() {
            return None;
        }
        self.graph
            .find_edge(dependency.node(), dependent.node())
            .map(|e| self.graph[e])
    }

    /// Direct children of a component
    pub fn children_of(&self, id: DeclarationId) -> Vec<DeclarationId> {
        self.declarations
            .iter()
            .filter(|d| d.options.parent == Some(id))
            .map(|d| d.id)
            .collect()
    }

    /// Every declaration under `id` in the parent hierarchy
    pub fn descendants_of(&self, id: DeclarationId) -> Vec<DeclarationId> {
        let mut found = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            for child in self.children_of(current) {
                found.push(child);
                stack.push(child);
            }
        }
        found.sort();
        found
    }

    /// Every declaration with this type and name
    ///
    /// More than one match means two components produced the same identifier.
    pub fn find(&self, resource_type: &str, name: &str) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.resource_type == resource_type && d.name == name)
            .collect()
    }

    /// Every declaration of a type
    pub fn by_type(&self, resource_type: &str) -> Vec<&Declaration> {
        self.declarations
            .iter()
            .filter(|d| d.resource_type == resource_type)
            .collect()
    }

    pub fn get(&self, id: DeclarationId) -> Option<&Declaration> {
        self.declarations.get(id.0)
    }

    pub fn declaration(&self, id: DeclarationId) -> Result<&Declaration> {
        self.get(id).ok_or(CloudError::UnknownDeclaration(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Validate and lay out the graph for an engine
    pub fn plan(&self) -> Result<Plan> {
        Plan::from_graph(self)
    }

    fn ensure_exists(&self, id: DeclarationId) -> Result<()> {
        if id.0 < self.declarations.len() {
            Ok(())
        } else {
            Err(CloudError::UnknownDeclaration(id))
        }
    }

    fn link(&mut self, from: DeclarationId, to: DeclarationId, kind: EdgeKind) {
        if self.graph.find_edge(from.node(), to.node()).is_none() {
            self.graph.add_edge(from.node(), to.node(), kind);
        }
    }

    /// Waiting for a component means waiting for everything under it
    fn link_explicit(&mut self, dependency: DeclarationId, dependent: DeclarationId) {
        self.link(dependency, dependent, EdgeKind::Explicit);

        let is_component = self
            .get(dependency)
            .is_some_and(|d| d.kind == DeclarationKind::Component);
        if is_component {
            for child in self.descendants_of(dependency) {
                if child != dependent {
                    self.link(child, dependent, EdgeKind::Explicit);
                }
            }
        }
    }

    fn adjacent(&self, id: DeclarationId, direction: Direction) -> Vec<DeclarationId> {
        if id.0 >= self.declarations.len() {
            return Vec::new();
        }
        let mut ids: Vec<DeclarationId> = self
            .graph
            .neighbors_directed(id.node(), direction)
            .map(|n| self.graph[n])
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
