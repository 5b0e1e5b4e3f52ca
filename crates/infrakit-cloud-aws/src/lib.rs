//! AWS component catalog for infrakit
//!
//! Every component takes the explicit [`ProviderContext`], its own argument
//! struct and the [`DeclareOptions`] of its declaration, and declares its
//! resources into a [`ResourceGraph`]:
//!
//! ```ignore
//! use infrakit_cloud::{DeclareOptions, ProviderContext, ResourceGraph};
//! use infrakit_cloud_aws::network::{Vpc, VpcArgs};
//!
//! let ctx = ProviderContext::new("eu-west-2", "staging");
//! let mut graph = ResourceGraph::new();
//! let vpc = Vpc::new(&mut graph, &ctx, VpcArgs::new("core"), DeclareOptions::new())?;
//! ```
//!
//! - [`network`]: VPC and client VPN
//! - [`access`]: security groups, IAM, users and secrets
//! - [`routing`]: hosted zones, certificates, load balancer
//! - [`database`]: RDS PostgreSQL with roles and migrations
//! - [`services`]: ECR, ECS/Fargate, Lambda, FusionAuth on EC2 (with or without its own database)
//!
//! [`ProviderContext`]: infrakit_cloud::ProviderContext
//! [`DeclareOptions`]: infrakit_cloud::DeclareOptions
//! [`ResourceGraph`]: infrakit_cloud::ResourceGraph

pub mod access;
pub mod arn;
pub mod database;
pub mod error;
pub mod network;
pub mod policy;
pub mod region;
pub mod resource_types;
pub mod routing;
pub mod services;

pub use arn::account_id_from_arn;
pub use error::{AwsError, Result};
pub use policy::{PolicyDocument, PolicyStatement};
pub use region::AwsRegion;
pub use resource_types::{AwsResourceType, aws_resource_type};
