//! Containers, functions and self-hosted services

pub mod ecr;
pub mod ecs;
pub mod env;
pub mod fargate;
pub mod fusion_auth_db_server;
pub mod fusion_auth_server;
pub mod lambda;

pub use ecr::{EcrRepoImage, EcrRepoImageArgs};
pub use ecs::{EcsCluster, EcsClusterArgs};
pub use env::{EnvVariable, SecretInput, service_secret_name};
pub use fargate::{
    FargateSizing, FargateSizingOverrides, PublicFargateService, PublicFargateServiceArgs,
};
pub use fusion_auth_db_server::{
    FusionAuthDatabaseArgs, FusionAuthDbServer, FusionAuthDbServerArgs,
};
pub use fusion_auth_server::{
    Ec2Sizing, Ec2SizingOverrides, FusionAuthServer, FusionAuthServerArgs,
};
pub use lambda::{
    ApiGatewayLambda, ApiGatewayLambdaArgs, DatadogSettings, LambdaFunction, LambdaFunctionArgs,
    QueuedLambda, RateUnit, RetryPolicy, RetryPolicyOverrides, Schedule, ScheduleSpec,
    ScheduledLambda, ScheduledLambdaArgs,
};
