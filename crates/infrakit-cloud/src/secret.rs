//! Secret references
//!
//! A `SecretRef` points at credential material held by an external store or
//! minted by the engine. Components only pass these handles around; nothing in
//! this workspace resolves one to a plain value.

use crate::graph::DeclarationId;
use crate::input::{Input, OutputRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the secret material lives
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecretSource {
    /// Entry in the secret store looked up by name (`api-staging/doppler`)
    Named { name: String },
    /// Secret managed by the provider on behalf of a resource (RDS master password)
    Managed { secret_id: Box<Input> },
    /// Random value minted by the engine at apply time
    Generated { label: String, length: u32 },
    /// Resource output the provider marks as sensitive (IAM access key secret)
    Output { output: OutputRef },
}

/// Opaque handle to credential material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecretRef {
    pub source: SecretSource,

    /// JSON field of the secret value (`password`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl SecretRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            source: SecretSource::Named { name: name.into() },
            field: None,
        }
    }

    pub fn managed(secret_id: impl Into<Input>) -> Self {
        Self {
            source: SecretSource::Managed {
                secret_id: Box::new(secret_id.into()),
            },
            field: None,
        }
    }

    pub fn generated(label: impl Into<String>, length: u32) -> Self {
        Self {
            source: SecretSource::Generated {
                label: label.into(),
                length,
            },
            field: None,
        }
    }

    pub fn output(output: OutputRef) -> Self {
        Self {
            source: SecretSource::Output { output },
            field: None,
        }
    }

    /// Select a field of a JSON-structured secret
    pub fn field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn references(&self) -> Vec<DeclarationId> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs
    }

    pub(crate) fn collect_references(&self, refs: &mut Vec<DeclarationId>) {
        match &self.source {
            SecretSource::Named { .. } | SecretSource::Generated { .. } => {}
            SecretSource::Managed { secret_id } => secret_id.collect_references(refs),
            SecretSource::Output { output } => refs.push(output.resource),
        }
    }
}

/// Never prints the material, only where it comes from
impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            SecretSource::Named { name } => write!(f, "secret:{}", name)?,
            SecretSource::Managed { .. } => write!(f, "secret:managed")?,
            SecretSource::Generated { label, .. } => write!(f, "secret:generated:{}", label)?,
            SecretSource::Output { output } => {
                write!(f, "secret:{}#{}", output.resource, output.attribute)?
            }
        }
        if let Some(field) = &self.field {
            write!(f, ".{}", field)?;
        }
        Ok(())
    }
}
