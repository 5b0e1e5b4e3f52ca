//! Plan types handed to an engine

use crate::error::Result;
use crate::graph::{DeclarationId, DeclarationKind, ResourceGraph};
use serde::{Deserialize, Serialize};

/// One declaration, laid out for apply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedStep {
    pub id: DeclarationId,

    pub kind: DeclarationKind,

    /// Type token (e.g., "aws:ec2/vpc:Vpc", "postgresql:index:Role")
    pub resource_type: String,

    /// Deterministic resource name
    pub name: String,

    /// Wave the step belongs to; steps of one wave are independent
    pub wave: usize,

    /// Direct dependencies, all in earlier waves
    pub depends_on: Vec<DeclarationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<DeclarationId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<DeclarationId>,

    #[serde(default)]
    pub delete_before_replace: bool,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub replace_on_changes: Vec<String>,

    /// Resource description, with unknowns left as references
    pub properties: serde_json::Value,
}

impl PlannedStep {
    /// Get the full resource key (type:name)
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource_type, self.name)
    }
}

/// Plan containing every declaration in apply order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Plan {
    /// Steps in topological order
    pub steps: Vec<PlannedStep>,

    /// Step ids grouped by wave
    pub waves: Vec<Vec<DeclarationId>>,
}

impl Plan {
    /// Lay out a validated graph
    pub fn from_graph(graph: &ResourceGraph) -> Result<Self> {
        let waves = graph.waves()?;
        let mut steps = Vec::with_capacity(graph.len());

        for (wave, ids) in waves.iter().enumerate() {
            for &id in ids {
                let decl = graph.declaration(id)?;
                steps.push(PlannedStep {
                    id,
                    kind: decl.kind,
                    resource_type: decl.resource_type.clone(),
                    name: decl.name.clone(),
                    wave,
                    depends_on: graph.dependencies_of(id),
                    parent: decl.options.parent,
                    provider: decl.options.provider,
                    delete_before_replace: decl.options.delete_before_replace,
                    replace_on_changes: decl.options.replace_on_changes.clone(),
                    properties: serde_json::to_value(&decl.properties)?,
                });
            }
        }

        Ok(Self { steps, waves })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, id: DeclarationId) -> Option<&PlannedStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Get steps by kind
    pub fn steps_by_kind(&self, kind: DeclarationKind) -> Vec<&PlannedStep> {
        self.steps.iter().filter(|s| s.kind == kind).collect()
    }

    /// Summary of the plan
    pub fn summary(&self) -> PlanSummary {
        PlanSummary {
            components: self.steps_by_kind(DeclarationKind::Component).len(),
            resources: self.steps_by_kind(DeclarationKind::Resource).len(),
            lookups: self.steps_by_kind(DeclarationKind::Lookup).len(),
            providers: self.steps_by_kind(DeclarationKind::Provider).len(),
            waves: self.waves.len(),
        }
    }

    /// Resource description emitted to the engine
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Summary of planned steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub components: usize,
    pub resources: usize,
    pub lookups: usize,
    pub providers: usize,
    pub waves: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} resources, {} components, {} lookups, {} providers in {} waves",
            self.resources, self.components, self.lookups, self.providers, self.waves
        )
    }
}
