//! Layered configuration: defaults overlaid by explicit caller overrides
//!
//! A component that picks sizing from the environment does so in two layers.
//! The environment-derived defaults come first; every field the caller sets
//! explicitly replaces the default, regardless of environment.

use crate::context::Environment;

/// A fully-resolved configuration value that can absorb a set of overrides
pub trait Layered: Sized {
    /// Optional counterpart of every field; `None` keeps the default
    type Overrides: Default;

    /// Apply `overrides` on top of `self`
    fn overlay(self, overrides: &Self::Overrides) -> Self;
}

/// Defaults that depend on the deployment tier
pub trait EnvironmentDefaults {
    fn for_environment(environment: &Environment) -> Self;
}

/// Explicit overrides always win over `defaults`
pub fn resolve<T: Layered>(defaults: T, overrides: &T::Overrides) -> T {
    defaults.overlay(overrides)
}

/// Environment defaults for `T`, then the caller's overrides
pub fn resolve_for_environment<T>(environment: &Environment, overrides: &T::Overrides) -> T
where
    T: Layered + EnvironmentDefaults,
{
    resolve(T::for_environment(environment), overrides)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Replicas {
        count: u32,
        label: String,
    }

    #[derive(Default)]
    struct ReplicasOverrides {
        count: Option<u32>,
        label: Option<String>,
    }

    impl Layered for Replicas {
        type Overrides = ReplicasOverrides;

        fn overlay(self, overrides: &ReplicasOverrides) -> Self {
            Self {
                count: overrides.count.unwrap_or(self.count),
                label: overrides.label.clone().unwrap_or(self.label),
            }
        }
    }

    impl EnvironmentDefaults for Replicas {
        fn for_environment(environment: &Environment) -> Self {
            if environment.is_production() {
                Self { count: 3, label: "prod".into() }
            } else {
                Self { count: 1, label: "dev".into() }
            }
        }
    }

    #[test]
    fn test_no_overrides_keeps_defaults() {
        let resolved: Replicas =
            resolve_for_environment(&Environment::production(), &Default::default());
        assert_eq!(resolved, Replicas { count: 3, label: "prod".into() });
    }

    #[test]
    fn test_override_wins_field_by_field() {
        let overrides = ReplicasOverrides {
            count: Some(5),
            label: None,
        };
        let resolved: Replicas = resolve_for_environment(&Environment::new("staging"), &overrides);
        assert_eq!(resolved, Replicas { count: 5, label: "dev".into() });
    }
}
