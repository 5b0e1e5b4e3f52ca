//! Property values of a resource declaration
//!
//! A property is either a literal or a value only known once another
//! declaration has been applied (an output, a secret, or something built
//! from them). Reading another declaration's output is what creates an
//! implicit dependency edge in the graph.

use crate::graph::DeclarationId;
use crate::layered::Layered;
use crate::secret::SecretRef;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Reference to an output attribute of another declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub resource: DeclarationId,
    pub attribute: String,
}

impl OutputRef {
    pub fn new(resource: DeclarationId, attribute: impl Into<String>) -> Self {
        Self {
            resource,
            attribute: attribute.into(),
        }
    }

    /// Element `index` of a list-valued output (`privateSubnetIds[0]`)
    pub fn index(&self, index: usize) -> Self {
        Self::new(self.resource, format!("{}[{}]", self.attribute, index))
    }

    /// Nested field of an object-valued output (`domainNameConfiguration.hostedZoneId`)
    pub fn field(&self, field: &str) -> Self {
        Self::new(self.resource, format!("{}.{}", self.attribute, field))
    }
}

/// A declaration property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Input {
    Literal(serde_json::Value),
    Output(OutputRef),
    Secret(SecretRef),
    /// String concatenation of the parts once all of them are known
    Concat(Vec<Input>),
    List(Vec<Input>),
    Object(BTreeMap<String, Input>),
    /// The inner value serialized to a JSON string
    Json(Box<Input>),
}

impl Input {
    pub fn null() -> Self {
        Input::Literal(serde_json::Value::Null)
    }

    pub fn concat<I, T>(parts: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        Input::Concat(parts.into_iter().map(Into::into).collect())
    }

    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Input>,
    {
        Input::List(items.into_iter().map(Into::into).collect())
    }

    pub fn json(value: impl Into<Input>) -> Self {
        Input::Json(Box::new(value.into()))
    }

    /// Literal value, when the input carries no unknowns
    pub fn as_literal(&self) -> Option<&serde_json::Value> {
        match self {
            Input::Literal(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(|v| v.as_str())
    }

    /// Every declaration whose outputs this value reads
    pub fn references(&self) -> Vec<DeclarationId> {
        let mut refs = Vec::new();
        self.collect_references(&mut refs);
        refs.sort();
        refs.dedup();
        refs
    }

    pub(crate) fn collect_references(&self, refs: &mut Vec<DeclarationId>) {
        match self {
            Input::Literal(_) => {}
            Input::Output(output) => refs.push(output.resource),
            Input::Secret(secret) => secret.collect_references(refs),
            Input::Concat(parts) | Input::List(parts) => {
                for part in parts {
                    part.collect_references(refs);
                }
            }
            Input::Object(fields) => {
                for value in fields.values() {
                    value.collect_references(refs);
                }
            }
            Input::Json(inner) => inner.collect_references(refs),
        }
    }

    /// Whether any part of this value is a secret reference
    pub fn is_secret(&self) -> bool {
        match self {
            Input::Secret(_) => true,
            Input::Literal(_) | Input::Output(_) => false,
            Input::Concat(parts) | Input::List(parts) => parts.iter().any(Input::is_secret),
            Input::Object(fields) => fields.values().any(Input::is_secret),
            Input::Json(inner) => inner.is_secret(),
        }
    }
}

impl From<serde_json::Value> for Input {
    fn from(value: serde_json::Value) -> Self {
        Input::Literal(value)
    }
}

impl From<&str> for Input {
    fn from(value: &str) -> Self {
        Input::Literal(value.into())
    }
}

impl From<String> for Input {
    fn from(value: String) -> Self {
        Input::Literal(value.into())
    }
}

impl From<&String> for Input {
    fn from(value: &String) -> Self {
        Input::Literal(value.as_str().into())
    }
}

impl From<bool> for Input {
    fn from(value: bool) -> Self {
        Input::Literal(value.into())
    }
}

impl From<i64> for Input {
    fn from(value: i64) -> Self {
        Input::Literal(value.into())
    }
}

impl From<u16> for Input {
    fn from(value: u16) -> Self {
        Input::Literal(value.into())
    }
}

impl From<u32> for Input {
    fn from(value: u32) -> Self {
        Input::Literal(value.into())
    }
}

impl From<OutputRef> for Input {
    fn from(value: OutputRef) -> Self {
        Input::Output(value)
    }
}

impl From<SecretRef> for Input {
    fn from(value: SecretRef) -> Self {
        Input::Secret(value)
    }
}

impl From<Properties> for Input {
    fn from(value: Properties) -> Self {
        Input::Object(value.0)
    }
}

impl<T: Into<Input>> From<Vec<T>> for Input {
    fn from(value: Vec<T>) -> Self {
        Input::list(value)
    }
}

/// Ordered property map of a declaration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(BTreeMap<String, Input>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Input>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Set `key` only when a value is present
    pub fn with_opt<T: Into<Input>>(self, key: impl Into<String>, value: Option<T>) -> Self {
        match value {
            Some(value) => self.with(key, value),
            None => self,
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Input>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Input> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Input)> {
        self.0.iter()
    }

    pub fn references(&self) -> Vec<DeclarationId> {
        let mut refs = Vec::new();
        for value in self.0.values() {
            value.collect_references(&mut refs);
        }
        refs.sort();
        refs.dedup();
        refs
    }
}

impl Layered for Properties {
    type Overrides = Properties;

    /// Keys present in `overrides` replace ours, the rest are kept
    fn overlay(mut self, overrides: &Properties) -> Self {
        for (key, value) in overrides.iter() {
            self.0.insert(key.clone(), value.clone());
        }
        self
    }
}

impl<K: Into<String>, V: Into<Input>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
