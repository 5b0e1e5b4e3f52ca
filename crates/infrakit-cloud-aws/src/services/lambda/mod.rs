//! Node.js Lambda functions and their triggers
//!
//! [`LambdaFunction`] declares the execution role, the secrets policy and the
//! function. The trigger components wrap it as a nested component and add an
//! HTTP API, EventBridge schedules or an SQS queue.

pub mod api;
pub mod queued;
pub mod scheduled;

use crate::arn::managed_policy;
use crate::error::Result;
use crate::policy::{PolicyDocument, PolicyStatement};
use crate::region::AwsRegion;
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use crate::services::env::{EnvVariable, service_secret_name};
use infrakit_cloud::{
    Component, DeclareOptions, Input, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope,
};
use tracing::debug;

pub use api::{ApiGatewayLambda, ApiGatewayLambdaArgs};
pub use queued::{QUEUE_BATCH_SIZE, QUEUE_VISIBILITY_TIMEOUT_SECONDS, QueuedLambda};
pub use scheduled::{
    RateUnit, RetryPolicy, RetryPolicyOverrides, Schedule, ScheduleSpec, ScheduledLambda,
    ScheduledLambdaArgs,
};

pub const RUNTIME: &str = "nodejs20.x";
pub const TIMEOUT_SECONDS: u32 = 20;
pub const MEMORY_SIZE_MB: u32 = 256;
pub const NODE_OPTIONS: &str = "--enable-source-maps";

/// Datadog tracing settings passed to the function as environment variables
#[derive(Debug, Clone)]
pub struct DatadogSettings {
    pub version: String,
}

#[derive(Debug, Clone)]
pub struct LambdaFunctionArgs {
    pub name: String,
    pub subnets: Input,
    pub security_groups: Input,
    /// Path of the bundled code archive
    pub zip_file_path: String,
    pub handler: Option<String>,
    /// Added after the defaults; a variable named like a default replaces it
    pub environment_variables: Vec<EnvVariable>,
    pub datadog: Option<DatadogSettings>,
}

impl LambdaFunctionArgs {
    pub fn new(
        name: impl Into<String>,
        zip_file_path: impl Into<String>,
        subnets: impl Into<Input>,
        security_groups: impl Into<Input>,
    ) -> Self {
        Self {
            name: name.into(),
            subnets: subnets.into(),
            security_groups: security_groups.into(),
            zip_file_path: zip_file_path.into(),
            handler: None,
            environment_variables: Vec::new(),
            datadog: None,
        }
    }
}

fn function_environment(ctx: &ProviderContext, args: &LambdaFunctionArgs) -> Properties {
    let mut variables = Properties::new()
        .with("NODE_ENV", ctx.environment.as_str())
        .with("NODE_OPTIONS", NODE_OPTIONS);
    if let Some(datadog) = &args.datadog {
        variables.set("DD_TRACE_ENABLED", "true");
        variables.set("DD_SERVICE", args.name.as_str());
        variables.set("DD_VERSION", datadog.version.as_str());
        if let Some(handler) = &args.handler {
            variables.set("DD_LAMBDA_HANDLER", handler.as_str());
        }
    }
    for variable in &args.environment_variables {
        variables.set(variable.name.as_str(), variable.value.clone());
    }
    variables
}

#[derive(Debug, Clone)]
pub struct LambdaFunction {
    handle: ResourceHandle,
    pub role: ResourceHandle,
    pub execution_attachment: ResourceHandle,
    pub vpc_access_attachment: ResourceHandle,
    pub service_secret: ResourceHandle,
    pub read_secrets_policy: ResourceHandle,
    pub read_secrets_attachment: ResourceHandle,
    pub function: ResourceHandle,
}

impl LambdaFunction {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: LambdaFunctionArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let region: AwsRegion = ctx.region.parse()?;
        let layer = region.secrets_extension_layer_arn()?;

        let kind = AwsResourceType::Lambda;
        let mut scope = Scope::open(
            graph,
            ctx,
            &aws_resource_type(kind),
            kind.as_str(),
            &args.name,
            options,
        )?;

        let role = scope.resource(
            tokens::IAM_ROLE,
            scope.name(AwsResourceType::Role.as_str()),
            Properties::new().with(
                "assumeRolePolicy",
                PolicyDocument::assume_role_by_service("lambda.amazonaws.com"),
            ),
        )?;

        let attachment = AwsResourceType::PolicyAttachment.as_str();
        let execution_attachment = scope.resource(
            tokens::IAM_ROLE_POLICY_ATTACHMENT,
            scope.name_for(attachment, &format!("{}-execution", args.name)),
            Properties::new()
                .with("role", role.output("name"))
                .with("policyArn", managed_policy("service-role/AWSLambdaBasicExecutionRole")),
        )?;
        let vpc_access_attachment = scope.resource(
            tokens::IAM_ROLE_POLICY_ATTACHMENT,
            scope.name_for(attachment, &format!("{}-vpc-access", args.name)),
            Properties::new()
                .with("role", role.output("name"))
                .with(
                    "policyArn",
                    managed_policy("service-role/AWSLambdaVPCAccessExecutionRole"),
                ),
        )?;

        let secret_name = service_secret_name(&args.name, ctx.environment.as_str());
        debug!(function = %args.name, secret = %secret_name, "Granting secret access");
        let service_secret = scope.lookup(
            tokens::GET_SECRET,
            secret_name.as_str(),
            Properties::new().with("name", secret_name.as_str()),
        )?;
        let read_secrets_name = format!("{}-read-secrets", args.name);
        let read_secrets_policy = scope.resource(
            tokens::IAM_POLICY,
            scope.name_for(AwsResourceType::RolePolicy.as_str(), &read_secrets_name),
            Properties::new()
                .with("description", "Policy to allow Lambda to read secrets from Secrets Manager")
                .with(
                    "policy",
                    PolicyDocument::new().statement(
                        PolicyStatement::allow([
                            "secretsmanager:GetSecretValue",
                            "secretsmanager:DescribeSecret",
                        ])
                        .on(service_secret.output("arn")),
                    ),
                ),
        )?;
        let read_secrets_attachment = scope.resource(
            tokens::IAM_ROLE_POLICY_ATTACHMENT,
            scope.name_for(attachment, &read_secrets_name),
            Properties::new()
                .with("role", role.output("name"))
                .with("policyArn", read_secrets_policy.output("arn")),
        )?;

        let function = scope.resource(
            tokens::LAMBDA_FUNCTION,
            scope.component().name().to_string(),
            Properties::new()
                .with("code", Properties::new().with("fileArchive", args.zip_file_path.as_str()))
                .with("role", role.output("arn"))
                .with("timeout", TIMEOUT_SECONDS)
                .with("memorySize", MEMORY_SIZE_MB)
                .with_opt("handler", args.handler.as_deref())
                .with("runtime", RUNTIME)
                .with(
                    "environment",
                    Properties::new().with("variables", function_environment(ctx, &args)),
                )
                .with(
                    "vpcConfig",
                    Properties::new()
                        .with("subnetIds", args.subnets)
                        .with("securityGroupIds", args.security_groups),
                )
                .with("layers", vec![layer]),
        )?;

        Ok(Self {
            handle: scope.finish(),
            role,
            execution_attachment,
            vpc_access_attachment,
            service_secret,
            read_secrets_policy,
            read_secrets_attachment,
            function,
        })
    }

    pub fn arn(&self) -> OutputRef {
        self.function.output("arn")
    }

    pub fn function_name(&self) -> OutputRef {
        self.function.output("name")
    }
}

impl Component for LambdaFunction {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::AwsError;

    pub(crate) fn function_args(name: &str) -> LambdaFunctionArgs {
        LambdaFunctionArgs::new(name, "dist/handler.zip", vec!["subnet-a"], vec!["sg-1"])
    }

    fn variables(graph: &ResourceGraph, function: &ResourceHandle) -> Input {
        graph
            .get(function.id())
            .and_then(|d| d.properties.get("environment"))
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_function_defaults() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let lambda =
            LambdaFunction::new(&mut graph, &ctx, function_args("mailer"), DeclareOptions::new())
                .unwrap();

        assert_eq!(lambda.function.name(), "staging-eu-west-2-lambda-mailer");
        assert_eq!(lambda.role.name(), "staging-eu-west-2-role-mailer");
        assert_eq!(
            lambda.execution_attachment.name(),
            "staging-eu-west-2-policy-attachment-mailer-execution"
        );
        assert_eq!(
            lambda.read_secrets_policy.name(),
            "staging-eu-west-2-role-policy-mailer-read-secrets"
        );
        assert_eq!(lambda.service_secret.name(), "mailer-staging/doppler");

        let function = graph.get(lambda.function.id()).unwrap();
        assert_eq!(function.properties.get("runtime").and_then(Input::as_str), Some("nodejs20.x"));
        assert_eq!(
            function.properties.get("layers"),
            Some(&Input::list([
                "arn:aws:lambda:eu-west-2:133256977650:layer:AWS-Parameters-and-Secrets-Lambda-Extension:11"
            ]))
        );

        let expected = Properties::new().with(
            "variables",
            Properties::new()
                .with("NODE_ENV", "staging")
                .with("NODE_OPTIONS", "--enable-source-maps"),
        );
        assert_eq!(variables(&graph, &lambda.function), Input::from(expected));
    }

    #[test]
    fn test_datadog_and_caller_variables() {
        let ctx = ProviderContext::new("eu-west-2", "production");
        let mut graph = ResourceGraph::new();
        let mut args = function_args("mailer");
        args.handler = Some("index.handler".into());
        args.datadog = Some(DatadogSettings { version: "1.4.0".into() });
        args.environment_variables = vec![EnvVariable::new("NODE_OPTIONS", "--max-old-space-size=200")];
        let lambda = LambdaFunction::new(&mut graph, &ctx, args, DeclareOptions::new()).unwrap();

        let expected = Properties::new().with(
            "variables",
            Properties::new()
                .with("NODE_ENV", "production")
                .with("NODE_OPTIONS", "--max-old-space-size=200")
                .with("DD_TRACE_ENABLED", "true")
                .with("DD_SERVICE", "mailer")
                .with("DD_VERSION", "1.4.0")
                .with("DD_LAMBDA_HANDLER", "index.handler"),
        );
        assert_eq!(variables(&graph, &lambda.function), Input::from(expected));
    }

    #[test]
    fn test_region_without_layer_rejected() {
        let ctx = ProviderContext::new("us-east-1", "staging");
        let mut graph = ResourceGraph::new();
        let err = LambdaFunction::new(&mut graph, &ctx, function_args("mailer"), DeclareOptions::new());
        assert!(matches!(err, Err(AwsError::UnsupportedRegion(_))));
        assert!(graph.is_empty());
    }
}
