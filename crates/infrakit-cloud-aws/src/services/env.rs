//! Environment variables and secrets handed to containers and functions

use infrakit_cloud::{Input, Properties};

/// Plain environment variable
#[derive(Debug, Clone)]
pub struct EnvVariable {
    pub name: String,
    pub value: Input,
}

impl EnvVariable {
    pub fn new(name: impl Into<String>, value: impl Into<Input>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Variable the container runtime fills from a secret store ARN
#[derive(Debug, Clone)]
pub struct SecretInput {
    pub name: String,
    /// ARN, optionally with a `:field::` JSON key suffix
    pub value_from: Input,
}

impl SecretInput {
    pub fn new(name: impl Into<String>, value_from: impl Into<Input>) -> Self {
        Self {
            name: name.into(),
            value_from: value_from.into(),
        }
    }
}

/// `[{name, value}]` as a container definition expects it
pub(crate) fn container_environment(variables: &[EnvVariable]) -> Input {
    Input::list(variables.iter().map(|v| {
        Properties::new()
            .with("name", v.name.as_str())
            .with("value", v.value.clone())
    }))
}

pub(crate) fn container_secrets(secrets: &[SecretInput]) -> Input {
    Input::list(secrets.iter().map(|s| {
        Properties::new()
            .with("name", s.name.as_str())
            .with("valueFrom", s.value_from.clone())
    }))
}

/// Secret holding the runtime configuration of a service, `{name}-{environment}/doppler`
pub fn service_secret_name(service: &str, environment: &str) -> String {
    format!("{}-{}/doppler", service, environment)
}
