//! Lambda invoked on EventBridge schedules

use super::{LambdaFunction, LambdaFunctionArgs};
use crate::error::{AwsError, Result};
use crate::resource_types::{AwsResourceType, aws_resource_type, tokens};
use infrakit_cloud::{
    Component, DeclareOptions, Input, Layered, Properties, ProviderContext, ResourceGraph,
    ResourceHandle, Scope, resolve,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RateUnit {
    Minute,
    Minutes,
    Hour,
    Hours,
    Day,
    Days,
}

impl RateUnit {
    pub fn as_str(self) -> &'static str {
        match self {
            RateUnit::Minute => "minute",
            RateUnit::Minutes => "minutes",
            RateUnit::Hour => "hour",
            RateUnit::Hours => "hours",
            RateUnit::Day => "day",
            RateUnit::Days => "days",
        }
    }

    fn is_singular(self) -> bool {
        matches!(self, RateUnit::Minute | RateUnit::Hour | RateUnit::Day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Schedule {
    Rate { value: u32, unit: RateUnit },
    Cron { expression: String },
}

impl Schedule {
    /// EventBridge schedule expression
    ///
    /// EventBridge takes the singular unit for a value of 1 and the plural
    /// otherwise.
    pub fn expression(&self) -> Result<String> {
        match self {
            Schedule::Rate { value, unit } => {
                if *value == 0 {
                    return Err(AwsError::InvalidSchedule("rate must be positive".into()));
                }
                if unit.is_singular() != (*value == 1) {
                    return Err(AwsError::InvalidSchedule(format!(
                        "rate({} {}) mixes value and unit plurality",
                        value,
                        unit.as_str()
                    )));
                }
                Ok(format!("rate({} {})", value, unit.as_str()))
            }
            Schedule::Cron { expression } => {
                let expression = expression.trim();
                if expression.is_empty() {
                    return Err(AwsError::InvalidSchedule("empty cron expression".into()));
                }
                Ok(format!("cron({})", expression))
            }
        }
    }
}

/// Delivery retries of an event target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub maximum_event_age_seconds: u32,
    pub maximum_retry_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            maximum_event_age_seconds: 3600,
            maximum_retry_attempts: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicyOverrides {
    pub maximum_event_age_seconds: Option<u32>,
    pub maximum_retry_attempts: Option<u32>,
}

impl Layered for RetryPolicy {
    type Overrides = RetryPolicyOverrides;

    fn overlay(self, overrides: &RetryPolicyOverrides) -> Self {
        Self {
            maximum_event_age_seconds: overrides
                .maximum_event_age_seconds
                .unwrap_or(self.maximum_event_age_seconds),
            maximum_retry_attempts: overrides
                .maximum_retry_attempts
                .unwrap_or(self.maximum_retry_attempts),
        }
    }
}

/// One schedule and the event it delivers
#[derive(Debug, Clone)]
pub struct ScheduleSpec {
    pub schedule: Schedule,
    /// Event payload, sent as JSON
    pub detail: Option<serde_json::Value>,
    pub retry: RetryPolicyOverrides,
}

impl From<Schedule> for ScheduleSpec {
    fn from(schedule: Schedule) -> Self {
        Self {
            schedule,
            detail: None,
            retry: RetryPolicyOverrides::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledLambdaArgs {
    pub function: LambdaFunctionArgs,
    pub schedules: Vec<ScheduleSpec>,
}

/// Rule, invoke permission and target of one schedule
#[derive(Debug, Clone)]
pub struct ScheduleResources {
    pub rule: ResourceHandle,
    pub permission: ResourceHandle,
    pub target: ResourceHandle,
}

#[derive(Debug, Clone)]
pub struct ScheduledLambda {
    handle: ResourceHandle,
    pub lambda: LambdaFunction,
    pub schedules: Vec<ScheduleResources>,
}

impl ScheduledLambda {
    pub fn new(
        graph: &mut ResourceGraph,
        ctx: &ProviderContext,
        args: ScheduledLambdaArgs,
        options: DeclareOptions,
    ) -> Result<Self> {
        let expressions = args
            .schedules
            .iter()
            .map(|spec| spec.schedule.expression())
            .collect::<Result<Vec<_>>>()?;

        let kind = AwsResourceType::ScheduledLambda;
        let name = args.function.name.clone();
        let mut scope = Scope::open(graph, ctx, &aws_resource_type(kind), kind.as_str(), &name, options)?;

        let child_options = scope.child_options();
        let lambda = LambdaFunction::new(scope.graph(), ctx, args.function, child_options)?;

        let mut schedules = Vec::with_capacity(expressions.len());
        for (index, (spec, expression)) in args.schedules.into_iter().zip(expressions).enumerate() {
            debug!(function = %name, schedule = %expression, "Declaring schedule");
            let indexed = format!("{}-{}", name, index);

            let rule_name = scope.name_for(AwsResourceType::EventRule.as_str(), &indexed);
            let rule = scope.resource(
                tokens::EVENT_RULE,
                rule_name.as_str(),
                Properties::new()
                    .with("name", rule_name.as_str())
                    .with("description", format!("Schedule {} for {}", index, name))
                    .with("scheduleExpression", expression),
            )?;

            let permission = scope.resource(
                tokens::LAMBDA_PERMISSION,
                scope.name_for(
                    AwsResourceType::LambdaPermission.as_str(),
                    &format!("{}-eventbridge-{}", name, index),
                ),
                Properties::new()
                    .with("action", "lambda:InvokeFunction")
                    .with("function", lambda.function_name())
                    .with("principal", "events.amazonaws.com")
                    .with("sourceArn", rule.output("arn")),
            )?;

            let retry = resolve(RetryPolicy::default(), &spec.retry);
            let target = scope.resource(
                tokens::EVENT_TARGET,
                scope.name_for(AwsResourceType::EventTarget.as_str(), &name),
                Properties::new()
                    .with("rule", rule.output("name"))
                    .with("arn", lambda.arn())
                    .with_opt("input", spec.detail.map(Input::json))
                    .with(
                        "retryPolicy",
                        Properties::new()
                            .with("maximumEventAgeInSeconds", retry.maximum_event_age_seconds)
                            .with("maximumRetryAttempts", retry.maximum_retry_attempts),
                    ),
            )?;

            schedules.push(ScheduleResources {
                rule,
                permission,
                target,
            });
        }

        Ok(Self {
            handle: scope.finish(),
            lambda,
            schedules,
        })
    }
}

impl Component for ScheduledLambda {
    fn handle(&self) -> &ResourceHandle {
        &self.handle
    }
}
