//! Infrakit core
//!
//! This crate provides the composition layer shared by every component catalog:
//! deterministic naming, the explicit provider context, layered configuration,
//! and the resource graph components declare into.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                  stack definition                │
//! │      (Vpc → Vpn → RdsPrismaPostgresDb → ...)      │
//! └─────────────────┬───────────────────────────────┘
//!                   │ ProviderContext
//! ┌─────────────────▼───────────────────────────────┐
//! │                 infrakit-cloud                   │
//! │  ┌──────────────┐  ┌──────────────────────────┐ │
//! │  │    Naming    │  │  Scope / Component       │ │
//! │  └──────────────┘  └──────────────────────────┘ │
//! │  ┌──────────────────────────────────────────┐   │
//! │  │   ResourceGraph (DAG) → Plan (waves)      │   │
//! │  └──────────────────────────────────────────┘   │
//! └───────┬─────────────────────────┬───────────────┘
//!         │                         │
//! ┌───────▼───────┐         ┌───────▼───────┐
//! │  catalogs     │         │ trait Engine  │
//! │ aws / do / pg │         │  (dry-run)    │
//! └───────────────┘         └───────────────┘
//! ```

pub mod component;
pub mod context;
pub mod engine;
pub mod error;
pub mod graph;
pub mod input;
pub mod layered;
pub mod naming;
pub mod plan;
pub mod secret;

// Re-exports
pub use component::{Component, Scope};
pub use context::{Environment, ProviderContext};
pub use engine::{ApplyResult, DryRunEngine, Engine, StepResult};
pub use error::{CloudError, Result};
pub use graph::{
    Declaration, DeclarationId, DeclarationKind, DeclareOptions, EdgeKind, ResourceGraph,
    ResourceHandle,
};
pub use input::{Input, OutputRef, Properties};
pub use layered::{EnvironmentDefaults, Layered, resolve, resolve_for_environment};
pub use naming::{NameOptions, NameScope, ResourceIdentity};
pub use plan::{Plan, PlanSummary, PlannedStep};
pub use secret::{SecretRef, SecretSource};
