//! Lambda consuming an SQS queue

use super::{LambdaFunction, LambdaFunctionArgs};
use crate::error::Result;
use crate::policy::{PolicyDocument, PolicyStatement};
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, OutputRef, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope,
};

pub const QUEUE_VISIBILITY_TIMEOUT_SECONDS: u32 = 300;
pub const QUEUE_BATCH_SIZE: u32 = 10;

#[derive(Debug, Clone)]
pub struct QueuedLambda {
    handle: ResourceHandle,
    pub lambda: LambdaFunction,
    pub queue: ResourceHandle,
    pub queue_policy: ResourceHandle,
    pub event_source_mapping: ResourceHandle,
}

impl QueuedLambda {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: LambdaFunctionArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let kind = AwsResourceType::QueuedLambda;
        let name = args.name.clone();
        let mut scope = Scope::open(graph, ctx, &aws_resource_type(kind), kind.as_str(), &name, options)?;

        let child_options = scope.child_options();
        let lambda = LambdaFunction::new(scope.graph(), ctx, args, child_options)?;

        let queue = scope.resource(
            tokens::SQS_QUEUE,
            scope.name(AwsResourceType::Sqs.as_str()),
            Properties::new().with("visibilityTimeoutSeconds", QUEUE_VISIBILITY_TIMEOUT_SECONDS),
        )?;

        let policy = PolicyDocument::new().statement(
            PolicyStatement::allow([
                "sqs:ReceiveMessage",
                "sqs:DeleteMessage",
                "sqs:GetQueueAttributes",
            ])
            .on(queue.output("arn")),
        );
        let queue_policy = scope.resource(
            tokens::IAM_ROLE_POLICY,
            scope.name_for(
                AwsResourceType::RolePolicy.as_str(),
                &format!("{}-queue-policy", name),
            ),
            Properties::new()
                .with("role", lambda.role.output("id"))
                .with("policy", Input::json(policy)),
        )?;

        let event_source_mapping = scope.resource(
            tokens::LAMBDA_EVENT_SOURCE_MAPPING,
            scope.name(AwsResourceType::EventSourceMapping.as_str()),
            Properties::new()
                .with("eventSourceArn", queue.output("arn"))
                .with("functionName", lambda.function_name())
                .with("batchSize", QUEUE_BATCH_SIZE)
                .with("enabled", true),
        )?;

        Ok(Self {
            handle: scope.finish(),
            lambda,
            queue,
            queue_policy,
            event_source_mapping,
        })
    }

    pub fn queue_url(&self) -> OutputRef {
        self.queue.output("url")
    }
}

impl Component for QueuedLambda {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::lambda::tests::function_args;

    #[test]
    fn test_queue_feeds_function() {
        let ctx = ProviderContext::new("eu-west-2", "staging");
        let mut graph = ResourceGraph::new();
        let queued =
            QueuedLambda::new(&mut graph, &ctx, function_args("importer"), DeclareOptions::new())
                .unwrap();

        assert_eq!(queued.queue.name(), "staging-eu-west-2-sqs-importer");
        assert_eq!(
            queued.queue_policy.name(),
            "staging-eu-west-2-role-policy-importer-queue-policy"
        );

        let policy_deps = graph.dependencies_of(queued.queue_policy.id());
        assert!(policy_deps.contains(&queued.queue.id()));
        assert!(policy_deps.contains(&queued.lambda.role.id()));

        let mapping = graph.get(queued.event_source_mapping.id()).unwrap();
        assert_eq!(
            mapping.properties.get("batchSize").and_then(Input::as_literal),
            Some(&serde_json::json!(10))
        );
        let deps = graph.dependencies_of(mapping.id);
        assert!(deps.contains(&queued.queue.id()));
        assert!(deps.contains(&queued.lambda.function.id()));
    }
}
